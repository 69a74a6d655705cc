//! In-memory implementation of SlotStore

use super::buffer::SlotBuffer;
use super::types::{SlotKey, SlotStore};
use crate::error::KeyringError;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of SlotStore
///
/// Hash map based directory. Lookups take the directory read lock, so data
/// path calls on different keys never wait on each other here.
pub struct MemSlots {
    slots: RwLock<HashMap<SlotKey, SlotBuffer>>,
}

impl MemSlots {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new empty store sized for `1 << hash_bits` slots
    #[must_use]
    pub fn with_hash_bits(hash_bits: u8) -> Self {
        let capacity = 1usize.checked_shl(u32::from(hash_bits)).unwrap_or(0);
        Self {
            slots: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }
}

impl Default for MemSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotStore for MemSlots {
    fn insert(&self, key: SlotKey, buffer: SlotBuffer) -> Result<(), KeyringError> {
        let mut slots = self.slots.write();
        if slots.contains_key(&key) {
            return Err(KeyringError::AlreadyExists(key));
        }
        slots.insert(key, buffer);
        log::debug!("slot store: inserted key {key}, {} live", slots.len());
        Ok(())
    }

    fn find(&self, key: SlotKey) -> Option<SlotBuffer> {
        self.slots.read().get(&key).cloned()
    }

    fn remove(&self, key: SlotKey) -> Result<SlotBuffer, KeyringError> {
        let mut slots = self.slots.write();
        let buffer = slots.remove(&key).ok_or(KeyringError::NotFound(key))?;
        log::debug!("slot store: removed key {key}, {} live", slots.len());
        Ok(buffer)
    }

    fn drain(&self) -> Vec<(SlotKey, SlotBuffer)> {
        let mut slots = self.slots.write();
        let mut drained: Vec<_> = slots.drain().collect();
        drained.sort_by_key(|(key, _)| *key);
        drained
    }

    fn keys(&self) -> Vec<SlotKey> {
        let mut keys: Vec<SlotKey> = self.slots.read().keys().copied().collect();
        keys.sort();
        keys
    }

    fn len(&self) -> usize {
        self.slots.read().len()
    }
}

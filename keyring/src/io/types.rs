//! Slot store types and traits

use super::buffer::SlotBuffer;
use crate::error::KeyringError;

/// Key of a slot: a positive integer, also the numeric suffix of its device
///
/// Zero is reserved and never a valid key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(u32);

impl SlotKey {
    /// # Errors
    /// `InvalidArgument` for zero.
    pub fn new(key: u32) -> Result<Self, KeyringError> {
        if key == 0 {
            return Err(KeyringError::invalid("0 is not allowed as a key"));
        }
        Ok(Self(key))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for SlotKey {
    type Error = KeyringError;

    fn try_from(key: u32) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}

/// Trait for slot storage backends
///
/// The store owns the directory from key to buffer and serializes its own
/// mutations. It does not guard buffer contents: that is the job of the
/// buffer's lock.
pub trait SlotStore: Send + Sync {
    /// Insert a buffer under `key`.
    ///
    /// # Errors
    /// `AlreadyExists` if the key is live.
    fn insert(&self, key: SlotKey, buffer: SlotBuffer) -> Result<(), KeyringError>;

    /// Look up the buffer for `key`.
    fn find(&self, key: SlotKey) -> Option<SlotBuffer>;

    /// Remove every entry for `key` and return the removed buffer.
    ///
    /// # Errors
    /// `NotFound` if nothing is stored under the key.
    fn remove(&self, key: SlotKey) -> Result<SlotBuffer, KeyringError>;

    /// Remove and return all entries. The store is empty afterwards.
    fn drain(&self) -> Vec<(SlotKey, SlotBuffer)>;

    /// Live keys, sorted ascending.
    fn keys(&self) -> Vec<SlotKey>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle to a store
impl<T: SlotStore + ?Sized> SlotStore for std::sync::Arc<T> {
    fn insert(&self, key: SlotKey, buffer: SlotBuffer) -> Result<(), KeyringError> {
        (**self).insert(key, buffer)
    }

    fn find(&self, key: SlotKey) -> Option<SlotBuffer> {
        (**self).find(key)
    }

    fn remove(&self, key: SlotKey) -> Result<SlotBuffer, KeyringError> {
        (**self).remove(key)
    }

    fn drain(&self) -> Vec<(SlotKey, SlotBuffer)> {
        (**self).drain()
    }

    fn keys(&self) -> Vec<SlotKey> {
        (**self).keys()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_key_rejected() {
        assert!(matches!(
            SlotKey::new(0),
            Err(KeyringError::InvalidArgument(_))
        ));
        assert!(SlotKey::try_from(0).is_err());
    }

    #[test]
    fn test_key_roundtrip() {
        let key = SlotKey::new(42).unwrap();
        assert_eq!(key.get(), 42);
        assert_eq!(key.to_string(), "42");
    }
}

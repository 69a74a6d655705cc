//! Data channel: read and write on slot devices
//!
//! Every call resolves its slot again, from the minor it arrived through to
//! the key and from the key to the buffer. Nothing is cached between calls,
//! so a file that outlives its slot fails with `NotFound` instead of reaching
//! a buffer that is no longer in the store.

use embedded_io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::device::DeviceLifecycle;
use crate::error::KeyringError;
use crate::file_ops::{seek_position, FileOperations, FileState};
use crate::io::{SlotBuffer, SlotKey, SlotStore};

pub struct DataChannel<S: SlotStore, D: DeviceLifecycle> {
    store: Arc<S>,
    devices: Arc<D>,
    buf_size: usize,
    unloaded: AtomicBool,
}

impl<S: SlotStore, D: DeviceLifecycle> DataChannel<S, D> {
    #[must_use]
    pub fn new(store: Arc<S>, devices: Arc<D>, buf_size: usize) -> Self {
        Self {
            store,
            devices,
            buf_size,
            unloaded: AtomicBool::new(false),
        }
    }

    /// Refuse every later open, read, write and seek.
    pub fn shutdown(&self) {
        self.unloaded.store(true, Ordering::SeqCst);
    }

    fn check_loaded(&self) -> Result<(), KeyringError> {
        if self.unloaded.load(Ordering::SeqCst) {
            return Err(KeyringError::invalid("keyring module is unloaded"));
        }
        Ok(())
    }

    /// Resolve the buffer behind an open file.
    ///
    /// # Errors
    /// - `InvalidArgument` if the file has no slot identity or the module is unloaded
    /// - `NotFound` if the node or the slot is gone
    pub fn slot(&self, file: &FileState) -> Result<(SlotKey, SlotBuffer), KeyringError> {
        self.check_loaded()?;
        let key = file.key.ok_or_else(|| {
            KeyringError::invalid(format!("minor {} is not bound to a slot", file.minor))
        })?;
        if self.devices.resolve(file.minor) != Some(key) {
            return Err(KeyringError::NotFound(key));
        }
        let buffer = self.store.find(key).ok_or(KeyringError::NotFound(key))?;
        Ok((key, buffer))
    }
}

impl<S: SlotStore, D: DeviceLifecycle> FileOperations for DataChannel<S, D> {
    fn open(&self, file: &mut FileState) -> Result<(), KeyringError> {
        self.check_loaded()?;
        let key = self.devices.resolve(file.minor).ok_or_else(|| {
            KeyringError::invalid(format!("no keyring device with minor {}", file.minor))
        })?;
        file.key = Some(key);
        debug!(minor = file.minor.get(), key = key.get(), "open");
        Ok(())
    }

    fn release(&self, file: &mut FileState) {
        debug!(minor = file.minor.get(), key = ?file.key, "release");
        file.key = None;
    }

    fn read(
        &self,
        file: &FileState,
        buf: &mut [u8],
        pos: &mut u64,
    ) -> Result<usize, KeyringError> {
        let (key, buffer) = self.slot(file)?;
        let n = buffer.read_at(*pos, buf);
        trace!(key = key.get(), pos = *pos, len = buf.len(), n, "read");
        *pos += n as u64;
        Ok(n)
    }

    fn write(&self, file: &FileState, buf: &[u8], pos: &mut u64) -> Result<usize, KeyringError> {
        let (key, buffer) = self.slot(file)?;
        let n = buffer.write_at(*pos, buf);
        trace!(key = key.get(), pos = *pos, len = buf.len(), n, "write");
        *pos += n as u64;
        Ok(n)
    }

    fn llseek(&self, file: &FileState, to: SeekFrom) -> Result<u64, KeyringError> {
        self.slot(file)?;
        seek_position(file.pos, self.buf_size, to)
    }
}

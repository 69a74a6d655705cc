//! Fixed-size slot buffer with internal reader/writer locking
//!
//! Provides the byte region behind one keyring device.

use parking_lot::{RwLock, RwLockReadGuard};
use std::ops::Deref;
use std::sync::Arc;

use crate::error::KeyringError;

/// Read-only guard to buffer contents
///
/// Holds the read lock and provides read-only access to the whole region.
/// The lock is released when the guard is dropped.
pub struct SlotReadGuard<'a>(RwLockReadGuard<'a, Box<[u8]>>);

impl Deref for SlotReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for SlotReadGuard<'_> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Clamp a request of `len` bytes at `offset` to a region of `size` bytes.
///
/// Returns the byte range to copy, empty when `offset` is at or past the end.
#[must_use]
pub fn clamp(size: usize, offset: u64, len: usize) -> std::ops::Range<usize> {
    let Ok(start) = usize::try_from(offset) else {
        return 0..0;
    };
    if start >= size {
        return start.min(size)..start.min(size);
    }
    start..start + len.min(size - start)
}

/// Shared fixed-size buffer
///
/// A thread-safe buffer backed by `Arc<RwLock<Box<[u8]>>>`. Multiple clones
/// share the same underlying region, so a handle obtained from the store
/// stays valid after the slot is removed.
///
/// # Thread Safety
///
/// - `read_at()` copies out under the read lock, readers run concurrently
/// - `write_at()` copies in under the write lock, excluding everyone else
/// - `lock()` returns a guard that holds the read lock until dropped
///
/// # Example
///
/// ```
/// use keyring::io::SlotBuffer;
///
/// let buffer = SlotBuffer::zeroed(32).unwrap();
/// assert_eq!(buffer.write_at(0, b"hello"), 5);
///
/// let mut out = [0u8; 5];
/// assert_eq!(buffer.read_at(0, &mut out), 5);
/// assert_eq!(&out, b"hello");
/// ```
#[derive(Clone)]
pub struct SlotBuffer(Arc<RwLock<Box<[u8]>>>);

impl SlotBuffer {
    /// Allocate a zero-initialized buffer of `size` bytes
    ///
    /// # Errors
    /// `ResourceExhausted` if the allocation cannot be satisfied.
    pub fn zeroed(size: usize) -> Result<Self, KeyringError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|e| KeyringError::ResourceExhausted(format!("slot buffer: {e}")))?;
        data.resize(size, 0);
        Ok(Self(Arc::new(RwLock::new(data.into_boxed_slice()))))
    }

    /// Capacity of the region, fixed for the buffer's lifetime
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy bytes starting at `offset` into `out`
    ///
    /// Returns the number of bytes copied; 0 when `offset` is at or past the end.
    pub fn read_at(&self, offset: u64, out: &mut [u8]) -> usize {
        let data = self.0.read();
        let range = clamp(data.len(), offset, out.len());
        let n = range.len();
        out[..n].copy_from_slice(&data[range]);
        n
    }

    /// Copy bytes from `src` into the region starting at `offset`
    ///
    /// Returns the number of bytes written; the tail that does not fit is dropped.
    pub fn write_at(&self, offset: u64, src: &[u8]) -> usize {
        let mut data = self.0.write();
        let range = clamp(data.len(), offset, src.len());
        let n = range.len();
        data[range].copy_from_slice(&src[..n]);
        n
    }

    /// Lock the buffer for reading
    #[must_use]
    pub fn lock(&self) -> SlotReadGuard<'_> {
        SlotReadGuard(self.0.read())
    }

    /// Copy of the whole region
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        self.0.read().to_vec()
    }

    /// Wait until no reader or writer is inside the region.
    ///
    /// Called when the slot leaves the store, before the handle is dropped.
    pub fn retire(&self) {
        drop(self.0.write());
    }

    /// True if both handles refer to the same region
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SlotBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotBuffer")
            .field("len", &self.len())
            .field("handles", &Arc::strong_count(&self.0))
            .finish()
    }
}

//! File operations table
//!
//! Every device node is served by one [`FileOperations`] implementation:
//! the controller by [`crate::ControlChannel`], slot nodes by
//! [`crate::DataChannel`]. An operation a node does not support fails with
//! `InvalidArgument`, the way a missing entry in a C operations table would.

use embedded_io::SeekFrom;

use crate::error::KeyringError;
use crate::idgen::Minor;
use crate::io::SlotKey;

/// Per-open state of a device file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    /// Minor of the node the file was opened through
    pub minor: Minor,
    /// Slot resolved at open, cleared on release
    pub key: Option<SlotKey>,
    /// File position used by the stream interface
    pub pos: u64,
}

impl FileState {
    #[must_use]
    pub fn new(minor: Minor) -> Self {
        Self {
            minor,
            key: None,
            pos: 0,
        }
    }
}

/// Capability interface shared by the control and data channels
pub trait FileOperations: Send + Sync {
    /// # Errors
    /// Implementation specific.
    fn open(&self, _file: &mut FileState) -> Result<(), KeyringError> {
        Ok(())
    }

    fn release(&self, _file: &mut FileState) {}

    /// Read at `*pos`, advancing it by the bytes copied.
    ///
    /// # Errors
    /// `InvalidArgument` unless the node supports reading.
    fn read(
        &self,
        file: &FileState,
        _buf: &mut [u8],
        _pos: &mut u64,
    ) -> Result<usize, KeyringError> {
        Err(unsupported("read", file))
    }

    /// Write at `*pos`, advancing it by the bytes copied.
    ///
    /// # Errors
    /// `InvalidArgument` unless the node supports writing.
    fn write(&self, file: &FileState, _buf: &[u8], _pos: &mut u64) -> Result<usize, KeyringError> {
        Err(unsupported("write", file))
    }

    /// Compute the new file position.
    ///
    /// # Errors
    /// `InvalidArgument` unless the node supports seeking.
    fn llseek(&self, file: &FileState, _to: SeekFrom) -> Result<u64, KeyringError> {
        Err(unsupported("llseek", file))
    }

    /// Control call. `arg` is the caller memory the argument points at.
    ///
    /// # Errors
    /// `InvalidArgument` unless the node accepts control calls.
    fn ioctl(&self, file: &FileState, _cmd: u32, _arg: Option<&[u8]>) -> Result<i64, KeyringError> {
        Err(unsupported("ioctl", file))
    }
}

fn unsupported(op: &str, file: &FileState) -> KeyringError {
    KeyringError::invalid(format!("{op} is not supported on minor {}", file.minor))
}

/// Apply a seek request to `pos` for a region of `size` bytes.
///
/// # Errors
/// `InvalidArgument` if the result would be negative or overflow.
pub fn seek_position(pos: u64, size: usize, to: SeekFrom) -> Result<u64, KeyringError> {
    let (base, delta) = match to {
        SeekFrom::Start(offset) => return Ok(offset),
        SeekFrom::Current(delta) => (pos, delta),
        SeekFrom::End(delta) => (size as u64, delta),
    };
    base.checked_add_signed(delta)
        .ok_or_else(|| KeyringError::invalid(format!("seek to {base}{delta:+} is out of range")))
}

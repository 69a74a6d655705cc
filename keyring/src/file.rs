//! Open device files
//!
//! An [`OpenFile`] is what a caller holds between open and release. It
//! forwards every call to the operations table of its node and implements
//! the `embedded_io` stream traits on top of its own file position.
//!
//! # Example
//!
//! ```
//! use embedded_io::{Read, Seek, SeekFrom, Write};
//! use keyring::{KeyringConfig, MemKeyring};
//!
//! let module = MemKeyring::in_memory(KeyringConfig::default()).unwrap();
//! module.control().add(7).unwrap();
//!
//! let mut file = module.open_slot(7).unwrap();
//! file.write_all(b"hello").unwrap();
//! file.seek(SeekFrom::Start(0)).unwrap();
//!
//! let mut out = [0u8; 5];
//! file.read_exact(&mut out).unwrap();
//! assert_eq!(&out, b"hello");
//! ```

use embedded_io::SeekFrom;
use std::sync::Arc;

use crate::error::{to_retval, KeyringError};
use crate::file_ops::{FileOperations, FileState};
use crate::idgen::Minor;
use crate::io::SlotKey;

pub struct OpenFile {
    state: FileState,
    ops: Arc<dyn FileOperations>,
    released: bool,
}

impl OpenFile {
    /// Open a file on `minor`, served by `ops`.
    ///
    /// # Errors
    /// Whatever the node's `open` reports.
    pub fn open(minor: Minor, ops: Arc<dyn FileOperations>) -> Result<Self, KeyringError> {
        let mut state = FileState::new(minor);
        ops.open(&mut state)?;
        Ok(Self {
            state,
            ops,
            released: false,
        })
    }

    #[must_use]
    pub fn minor(&self) -> Minor {
        self.state.minor
    }

    /// Slot the file was bound to at open
    #[must_use]
    pub fn key(&self) -> Option<SlotKey> {
        self.state.key
    }

    /// Current position of the stream interface
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.state.pos
    }

    /// Read at a caller-maintained offset, advancing it.
    ///
    /// # Errors
    /// See [`FileOperations::read`].
    pub fn read_at(&self, buf: &mut [u8], offset: &mut u64) -> Result<usize, KeyringError> {
        self.ops.read(&self.state, buf, offset)
    }

    /// Write at a caller-maintained offset, advancing it.
    ///
    /// # Errors
    /// See [`FileOperations::write`].
    pub fn write_at(&self, buf: &[u8], offset: &mut u64) -> Result<usize, KeyringError> {
        self.ops.write(&self.state, buf, offset)
    }

    /// `read(2)`-style call: byte count or negative errno
    pub fn read_raw(&self, buf: &mut [u8], offset: &mut u64) -> i64 {
        to_retval(self.read_at(buf, offset))
    }

    /// `write(2)`-style call: byte count or negative errno
    pub fn write_raw(&self, buf: &[u8], offset: &mut u64) -> i64 {
        to_retval(self.write_at(buf, offset))
    }

    /// Control call; `arg` is the memory the argument pointer refers to.
    ///
    /// # Errors
    /// See [`FileOperations::ioctl`].
    pub fn ioctl(&self, cmd: u32, arg: Option<&[u8]>) -> Result<i64, KeyringError> {
        self.ops.ioctl(&self.state, cmd, arg)
    }

    /// `ioctl(2)`-style call: 0 or negative errno
    pub fn ioctl_raw(&self, cmd: u32, arg: Option<&[u8]>) -> i64 {
        match self.ioctl(cmd, arg) {
            Ok(ret) => ret,
            Err(e) => i64::from(e.errno()),
        }
    }

    /// Release the file. Dropping it has the same effect.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.ops.release(&mut self.state);
        }
    }
}

impl Drop for OpenFile {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for OpenFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFile")
            .field("state", &self.state)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl embedded_io::ErrorType for OpenFile {
    type Error = KeyringError;
}

impl embedded_io::Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut pos = self.state.pos;
        let n = self.ops.read(&self.state, buf, &mut pos)?;
        self.state.pos = pos;
        Ok(n)
    }
}

impl embedded_io::Write for OpenFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let mut pos = self.state.pos;
        let n = self.ops.write(&self.state, buf, &mut pos)?;
        self.state.pos = pos;
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Seek for OpenFile {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let pos = self.ops.llseek(&self.state, pos)?;
        self.state.pos = pos;
        Ok(pos)
    }
}

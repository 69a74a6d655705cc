//! Errors of the keyring registry and their errno mapping.
//!
//! Every failure of the control and data paths is a [`KeyringError`]. The raw
//! call surface reports it as a negative errno (see [`KeyringError::errno`]),
//! the stream traits on open files report it as an `embedded_io::ErrorKind`.

use crate::io::SlotKey;

pub const ENOENT: i32 = 2;
pub const ENOMEM: i32 = 12;
pub const EEXIST: i32 = 17;
pub const EINVAL: i32 = 22;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyringError {
    /// Zero key, malformed command, unreadable argument or bad configuration
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No slot (or device node) for the key
    #[error("keyring{0} not found")]
    NotFound(SlotKey),

    /// A slot for the key is already live
    #[error("keyring{0} already exists")]
    AlreadyExists(SlotKey),

    /// Device node creation or buffer allocation failed
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl KeyringError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Negative errno, as returned from the raw control and data calls
    #[must_use]
    pub fn errno(&self) -> i32 {
        -match self {
            Self::InvalidArgument(_) => EINVAL,
            Self::NotFound(_) => ENOENT,
            Self::AlreadyExists(_) => EEXIST,
            Self::ResourceExhausted(_) => ENOMEM,
        }
    }
}

impl embedded_io::Error for KeyringError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::InvalidArgument(_) => embedded_io::ErrorKind::InvalidInput,
            Self::NotFound(_) => embedded_io::ErrorKind::NotFound,
            Self::AlreadyExists(_) => embedded_io::ErrorKind::AlreadyExists,
            Self::ResourceExhausted(_) => embedded_io::ErrorKind::OutOfMemory,
        }
    }
}

/// Collapse a call result into the kernel convention: value or negative errno
#[must_use]
pub fn to_retval(result: Result<usize, KeyringError>) -> i64 {
    match result {
        #[allow(clippy::cast_possible_wrap)]
        Ok(n) => n as i64,
        Err(e) => i64::from(e.errno()),
    }
}

//! Control command encoding
//!
//! Commands use the Linux `_IOC` layout:
//!
//! ```text
//!  31   30 29          16 15       8 7        0
//! ┌───────┬──────────────┬──────────┬──────────┐
//! │  dir  │     size     │   type   │    nr    │
//! └───────┴──────────────┴──────────┴──────────┘
//! ```
//!
//! with the magic type `'K'`. ADD and DELETE carry a pointer to a 4-byte
//! key, SHOW carries nothing.

use crate::error::KeyringError;

pub const KEYRING_MAGIC: u8 = b'K';

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;

pub const IOC_NONE: u32 = 0;
pub const IOC_WRITE: u32 = 1;

#[must_use]
pub const fn ioc(dir: u32, ty: u8, nr: u8, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | (size << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

#[must_use]
pub const fn io(ty: u8, nr: u8) -> u32 {
    ioc(IOC_NONE, ty, nr, 0)
}

#[must_use]
pub const fn iow(ty: u8, nr: u8, size: u32) -> u32 {
    ioc(IOC_WRITE, ty, nr, size)
}

/// Type byte of an encoded command
#[must_use]
pub const fn ioc_type(cmd: u32) -> u8 {
    ((cmd >> IOC_TYPESHIFT) & 0xff) as u8
}

#[allow(clippy::cast_possible_truncation)]
const KEY_SIZE: u32 = std::mem::size_of::<u32>() as u32;

pub const KEYRING_IOCTL_ADD: u32 = iow(KEYRING_MAGIC, 0, KEY_SIZE);
pub const KEYRING_IOCTL_DEL: u32 = iow(KEYRING_MAGIC, 1, KEY_SIZE);
pub const KEYRING_IOCTL_SHOW: u32 = io(KEYRING_MAGIC, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Delete,
    Show,
}

impl Command {
    /// Decode a full `_IOC` command word.
    ///
    /// # Errors
    /// `InvalidArgument` for a foreign magic type or an unknown command.
    pub fn decode(cmd: u32) -> Result<Self, KeyringError> {
        if ioc_type(cmd) != KEYRING_MAGIC {
            return Err(KeyringError::invalid(format!(
                "ioctl {cmd:#x}: not a keyring command"
            )));
        }
        match cmd {
            KEYRING_IOCTL_ADD => Ok(Self::Add),
            KEYRING_IOCTL_DEL => Ok(Self::Delete),
            KEYRING_IOCTL_SHOW => Ok(Self::Show),
            _ => Err(KeyringError::invalid(format!(
                "ioctl {cmd:#x}: unknown command"
            ))),
        }
    }

    #[must_use]
    pub fn encode(self) -> u32 {
        match self {
            Self::Add => KEYRING_IOCTL_ADD,
            Self::Delete => KEYRING_IOCTL_DEL,
            Self::Show => KEYRING_IOCTL_SHOW,
        }
    }

    /// Whether the command reads a key through its argument pointer
    #[must_use]
    pub fn takes_key(self) -> bool {
        !matches!(self, Self::Show)
    }
}

/// Bare command numbers: ADD = 0, DELETE = 1, SHOW = 2
impl TryFrom<u32> for Command {
    type Error = KeyringError;

    fn try_from(nr: u32) -> Result<Self, Self::Error> {
        match nr {
            0 => Ok(Self::Add),
            1 => Ok(Self::Delete),
            2 => Ok(Self::Show),
            _ => Err(KeyringError::invalid(format!("unknown command {nr}"))),
        }
    }
}

/// Copy the 4-byte key an ioctl argument points at.
///
/// `arg` is the caller memory behind the pointer, `None` for a null pointer.
///
/// # Errors
/// `InvalidArgument` for a null pointer or fewer than 4 readable bytes.
pub fn copy_key_from_user(arg: Option<&[u8]>) -> Result<u32, KeyringError> {
    let bytes = arg.ok_or_else(|| KeyringError::invalid("null argument pointer"))?;
    let raw: [u8; 4] = bytes
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| KeyringError::invalid("argument shorter than a key"))?;
    Ok(u32::from_ne_bytes(raw))
}

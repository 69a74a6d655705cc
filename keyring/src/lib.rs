pub mod config;
pub mod control;
pub mod data;
pub mod device;
pub mod error;
pub mod file;
pub mod file_ops;
pub mod idgen;
pub mod io;
pub mod ioctl;
pub mod module;

// Re-export storage types for convenience
pub use io::{MemSlots, SlotBuffer, SlotKey, SlotReadGuard, SlotStore};

// Re-export device types for convenience
pub use device::{DeviceClass, DeviceLifecycle, DeviceNode};
pub use idgen::{Minor, MinorGen};

// Re-export channel types
pub use control::{ControlChannel, SlotSummary};
pub use data::DataChannel;
pub use file::OpenFile;
pub use file_ops::{FileOperations, FileState};
pub use ioctl::{Command, KEYRING_IOCTL_ADD, KEYRING_IOCTL_DEL, KEYRING_IOCTL_SHOW};

// Re-export module lifecycle
pub use config::KeyringConfig;
pub use error::KeyringError;
pub use module::{KeyringModule, MemKeyring, TeardownReport};

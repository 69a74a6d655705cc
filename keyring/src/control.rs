//! Control channel: ADD, DELETE and SHOW on the controller device
//!
//! ADD and DELETE change the slot store and the device table together.
//! They are serialized against each other, so from a caller's point of view
//! a slot and its node appear and disappear as one step.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::device::{DeviceLifecycle, DeviceNode};
use crate::error::KeyringError;
use crate::file_ops::{FileOperations, FileState};
use crate::ioctl::{copy_key_from_user, Command};
use crate::io::{SlotBuffer, SlotKey, SlotStore};

/// One line of the SHOW report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub key: SlotKey,
    /// Node backing the slot, `None` only if the device table lost it
    pub node: Option<DeviceNode>,
    /// Copy of the slot buffer at the time of the report
    pub contents: Vec<u8>,
}

impl SlotSummary {
    /// Buffer contents up to the first NUL, lossily decoded
    #[must_use]
    pub fn text(&self) -> String {
        let end = self
            .contents
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(self.contents.len());
        String::from_utf8_lossy(&self.contents[..end]).into_owned()
    }
}

pub struct ControlChannel<S: SlotStore, D: DeviceLifecycle> {
    store: Arc<S>,
    devices: Arc<D>,
    buf_size: usize,
    /// Serializes ADD and DELETE
    directory: Mutex<()>,
    /// Set by `drain`; no slot is created afterwards
    unloaded: AtomicBool,
}

impl<S: SlotStore, D: DeviceLifecycle> ControlChannel<S, D> {
    #[must_use]
    pub fn new(store: Arc<S>, devices: Arc<D>, buf_size: usize) -> Self {
        Self {
            store,
            devices,
            buf_size,
            directory: Mutex::new(()),
            unloaded: AtomicBool::new(false),
        }
    }

    /// Create slot `key` and its device node.
    ///
    /// If anything fails after the node was created, the node is destroyed
    /// again before the error is returned.
    ///
    /// # Errors
    /// - `InvalidArgument` for key 0 or once the keyring is drained
    /// - `AlreadyExists` if the slot is live
    /// - `ResourceExhausted` if the node or the buffer cannot be created
    pub fn add(&self, key: u32) -> Result<DeviceNode, KeyringError> {
        let key = SlotKey::new(key)?;
        let _directory = self.directory.lock();
        self.check_loaded()?;

        if self.store.find(key).is_some() {
            return Err(KeyringError::AlreadyExists(key));
        }

        let node = self.devices.create(key)?;

        let inserted =
            SlotBuffer::zeroed(self.buf_size).and_then(|buffer| self.store.insert(key, buffer));
        if let Err(e) = inserted {
            warn!(key = key.get(), node = %node.name, error = %e, "add failed, destroying node");
            if let Err(rollback) = self.devices.destroy(key) {
                warn!(key = key.get(), error = %rollback, "rollback could not destroy node");
            }
            return Err(e);
        }

        info!(key = key.get(), node = %node.name, minor = node.minor.get(), "added slot");
        Ok(node)
    }

    /// Remove slot `key` and destroy its device node.
    ///
    /// Waits for reads and writes already inside the buffer to finish.
    ///
    /// # Errors
    /// - `InvalidArgument` for key 0 or once the keyring is drained
    /// - `NotFound` if there is no such slot
    pub fn delete(&self, key: u32) -> Result<(), KeyringError> {
        let key = SlotKey::new(key)?;
        let _directory = self.directory.lock();
        self.check_loaded()?;

        let buffer = self.store.remove(key)?;
        buffer.retire();
        drop(buffer);

        match self.devices.destroy(key) {
            Ok(node) => info!(key = key.get(), node = %node.name, "deleted slot"),
            Err(e) => warn!(key = key.get(), error = %e, "deleted slot had no device node"),
        }
        Ok(())
    }

    /// Remove every slot and destroy every slot node. Used at module exit.
    ///
    /// Later ADD and DELETE calls fail, also through files that are still
    /// open. Returns the keys that were live.
    pub fn drain(&self) -> Vec<SlotKey> {
        let _directory = self.directory.lock();
        self.unloaded.store(true, Ordering::SeqCst);

        let drained = self.store.drain();
        let mut keys = Vec::with_capacity(drained.len());
        for (key, buffer) in drained {
            buffer.retire();
            if let Err(e) = self.devices.destroy(key) {
                warn!(key = key.get(), error = %e, "drained slot had no device node");
            }
            keys.push(key);
        }

        // Nodes whose slot is already gone must not outlive the module either
        for node in self.devices.nodes() {
            if let Some(key) = node.key {
                warn!(node = %node.name, "destroying orphan node");
                if let Err(e) = self.devices.destroy(key) {
                    warn!(node = %node.name, error = %e, "orphan node could not be destroyed");
                }
            }
        }
        debug!(slots = keys.len(), "drained keyring");
        keys
    }

    fn check_loaded(&self) -> Result<(), KeyringError> {
        if self.unloaded.load(Ordering::SeqCst) {
            return Err(KeyringError::invalid("keyring module is unloaded"));
        }
        Ok(())
    }

    /// Report every live slot through the log and return the same report.
    pub fn show(&self) -> Vec<SlotSummary> {
        let report: Vec<SlotSummary> = self
            .store
            .keys()
            .into_iter()
            .filter_map(|key| {
                let buffer = self.store.find(key)?;
                Some(SlotSummary {
                    key,
                    node: self.devices.node(key),
                    contents: buffer.snapshot(),
                })
            })
            .collect();

        info!(slots = report.len(), "SHOW");
        for slot in &report {
            info!(
                key = slot.key.get(),
                node = slot.node.as_ref().map_or("-", |n| n.name.as_str()),
                minor = ?slot.node.as_ref().map(|n| n.minor.get()),
                data = %slot.text(),
                "slot"
            );
        }
        report
    }

    /// Execute a decoded command; `arg` is the memory behind the argument pointer.
    ///
    /// # Errors
    /// Errors of the command, or `InvalidArgument` for an unreadable argument.
    pub fn dispatch(&self, cmd: Command, arg: Option<&[u8]>) -> Result<(), KeyringError> {
        debug!(?cmd, "control call");
        match cmd {
            Command::Add => self.add(copy_key_from_user(arg)?).map(|_| ()),
            Command::Delete => self.delete(copy_key_from_user(arg)?),
            Command::Show => {
                self.show();
                Ok(())
            }
        }
    }
}

impl<S: SlotStore, D: DeviceLifecycle> FileOperations for ControlChannel<S, D> {
    fn open(&self, file: &mut FileState) -> Result<(), KeyringError> {
        debug!(minor = file.minor.get(), "open controller");
        Ok(())
    }

    fn release(&self, file: &mut FileState) {
        debug!(minor = file.minor.get(), "release controller");
    }

    fn ioctl(&self, file: &FileState, cmd: u32, arg: Option<&[u8]>) -> Result<i64, KeyringError> {
        if !file.minor.is_control() {
            return Err(KeyringError::invalid("control call on a slot device"));
        }
        self.dispatch(Command::decode(cmd)?, arg)?;
        Ok(0)
    }
}

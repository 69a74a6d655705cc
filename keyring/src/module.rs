//! Keyring module: lifetime of the whole registry
//!
//! `init` registers the controller node and wires the store and device
//! table into both channels. `exit` shuts both channels, drains every slot,
//! destroys every node and finally the controller. Files still open after
//! that fail every call. A module dropped without `exit` is torn down the
//! same way.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::KeyringConfig;
use crate::control::ControlChannel;
use crate::data::DataChannel;
use crate::device::{DeviceClass, DeviceLifecycle, DeviceNode};
use crate::error::KeyringError;
use crate::file::OpenFile;
use crate::file_ops::FileOperations;
use crate::idgen::Minor;
use crate::io::{MemSlots, SlotKey, SlotStore};

/// Keyring backed by the in-memory store and device class
pub type MemKeyring = KeyringModule<MemSlots, DeviceClass>;

/// What `exit` tore down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Slots that were live, ascending
    pub slots: Vec<SlotKey>,
    /// The controller node, destroyed last
    pub control: DeviceNode,
}

pub struct KeyringModule<S: SlotStore + 'static, D: DeviceLifecycle + 'static> {
    config: KeyringConfig,
    store: Arc<S>,
    devices: Arc<D>,
    control: Arc<ControlChannel<S, D>>,
    data: Arc<DataChannel<S, D>>,
    ctl_node: DeviceNode,
    unloaded: bool,
}

impl<S: SlotStore + 'static, D: DeviceLifecycle + 'static> KeyringModule<S, D> {
    /// Load the module over the given store and device table.
    ///
    /// # Errors
    /// - `InvalidArgument` if the configuration does not validate
    /// - whatever the device table reports when registering the controller
    pub fn init(config: KeyringConfig, store: S, devices: D) -> Result<Self, KeyringError> {
        config.validate()?;

        let store = Arc::new(store);
        let devices = Arc::new(devices);
        let control = Arc::new(ControlChannel::new(
            Arc::clone(&store),
            Arc::clone(&devices),
            config.buf_size,
        ));
        let data = Arc::new(DataChannel::new(
            Arc::clone(&store),
            Arc::clone(&devices),
            config.buf_size,
        ));
        let ctl_node = devices.create_control(&config.ctl_device_name)?;

        info!(
            ctl = %ctl_node.name,
            class = %config.class_name,
            buf_size = config.buf_size,
            "keyring module loaded"
        );
        Ok(Self {
            config,
            store,
            devices,
            control,
            data,
            ctl_node,
            unloaded: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &KeyringConfig {
        &self.config
    }

    #[must_use]
    pub fn control(&self) -> &ControlChannel<S, D> {
        &self.control
    }

    #[must_use]
    pub fn data(&self) -> &DataChannel<S, D> {
        &self.data
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn devices(&self) -> &D {
        &self.devices
    }

    /// The controller node
    #[must_use]
    pub fn control_node(&self) -> &DeviceNode {
        &self.ctl_node
    }

    /// Open the node with the given minor.
    ///
    /// Minor 0 is the controller, every other minor is a slot device.
    ///
    /// # Errors
    /// Whatever the node's `open` reports.
    pub fn open(&self, minor: Minor) -> Result<OpenFile, KeyringError> {
        let ops: Arc<dyn FileOperations> = if minor.is_control() {
            Arc::clone(&self.control) as Arc<dyn FileOperations>
        } else {
            Arc::clone(&self.data) as Arc<dyn FileOperations>
        };
        OpenFile::open(minor, ops)
    }

    /// Open the controller node
    ///
    /// # Errors
    /// See [`KeyringModule::open`].
    pub fn open_control(&self) -> Result<OpenFile, KeyringError> {
        self.open(Minor::CONTROL)
    }

    /// Open the device node of slot `key`, like opening `/dev/keyring<key>`.
    ///
    /// # Errors
    /// - `InvalidArgument` for key 0
    /// - `NotFound` if the slot has no node
    pub fn open_slot(&self, key: u32) -> Result<OpenFile, KeyringError> {
        let key = SlotKey::new(key)?;
        let node = self.devices.node(key).ok_or(KeyringError::NotFound(key))?;
        self.open(node.minor)
    }

    /// Unload the module.
    pub fn exit(mut self) -> TeardownReport {
        let slots = self.teardown();
        TeardownReport {
            slots,
            control: self.ctl_node.clone(),
        }
    }

    fn teardown(&mut self) -> Vec<SlotKey> {
        if self.unloaded {
            return Vec::new();
        }
        self.unloaded = true;
        self.data.shutdown();
        let slots = self.control.drain();
        debug!(ctl = %self.ctl_node.name, "destroying controller node");
        if let Err(e) = self.devices.destroy_control() {
            warn!(ctl = %self.ctl_node.name, error = %e, "controller node was not registered");
        }
        info!(slots = slots.len(), "keyring module unloaded");
        slots
    }
}

impl MemKeyring {
    /// Load a keyring over a fresh in-memory store and device class.
    ///
    /// # Errors
    /// See [`KeyringModule::init`].
    pub fn in_memory(config: KeyringConfig) -> Result<Self, KeyringError> {
        let store = MemSlots::with_hash_bits(config.hash_bits);
        let devices = DeviceClass::new(&config.class_name, &config.device_name, config.max_devices);
        Self::init(config, store, devices)
    }
}

impl<S: SlotStore + 'static, D: DeviceLifecycle + 'static> Drop for KeyringModule<S, D> {
    fn drop(&mut self) {
        self.teardown();
    }
}

//! Device lifecycle: the nodes that make slots addressable
//!
//! A slot is reachable only through its device node. The lifecycle
//! collaborator creates and destroys nodes and owns the mapping from the
//! minor number a call arrives through to the slot key behind it. The core
//! asks it to resolve minors and never assumes minor and key coincide.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::KeyringError;
use crate::idgen::{Minor, MinorGen};
use crate::io::SlotKey;

/// An addressable device node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNode {
    /// Node name, e.g. `keyring7` or `keyringctl`
    pub name: String,
    pub minor: Minor,
    /// Slot behind the node, `None` for the controller
    pub key: Option<SlotKey>,
}

impl DeviceNode {
    #[must_use]
    pub fn control(name: &str) -> Self {
        Self {
            name: name.to_string(),
            minor: Minor::CONTROL,
            key: None,
        }
    }
}

/// Trait for device node management backends
pub trait DeviceLifecycle: Send + Sync {
    /// Create the node for `key` and assign it a minor.
    ///
    /// # Errors
    /// - `AlreadyExists` if a node for the key exists
    /// - `ResourceExhausted` if no node can be created
    fn create(&self, key: SlotKey) -> Result<DeviceNode, KeyringError>;

    /// Destroy the node for `key`.
    ///
    /// # Errors
    /// `NotFound` if there is no node for the key.
    fn destroy(&self, key: SlotKey) -> Result<DeviceNode, KeyringError>;

    /// Map the minor of an incoming call to its slot key.
    fn resolve(&self, minor: Minor) -> Option<SlotKey>;

    /// Node currently backing `key`.
    fn node(&self, key: SlotKey) -> Option<DeviceNode>;

    /// All live slot nodes, ordered by key. The controller is not listed.
    fn nodes(&self) -> Vec<DeviceNode>;

    /// Register the controller node under minor 0.
    ///
    /// # Errors
    /// `InvalidArgument` if a controller is already registered.
    fn create_control(&self, name: &str) -> Result<DeviceNode, KeyringError>;

    /// Unregister the controller node.
    ///
    /// # Errors
    /// `InvalidArgument` if no controller is registered.
    fn destroy_control(&self) -> Result<DeviceNode, KeyringError>;

    /// The registered controller node, if any.
    fn control_node(&self) -> Option<DeviceNode>;
}

impl<T: DeviceLifecycle + ?Sized> DeviceLifecycle for std::sync::Arc<T> {
    fn create(&self, key: SlotKey) -> Result<DeviceNode, KeyringError> {
        (**self).create(key)
    }

    fn destroy(&self, key: SlotKey) -> Result<DeviceNode, KeyringError> {
        (**self).destroy(key)
    }

    fn resolve(&self, minor: Minor) -> Option<SlotKey> {
        (**self).resolve(minor)
    }

    fn node(&self, key: SlotKey) -> Option<DeviceNode> {
        (**self).node(key)
    }

    fn nodes(&self) -> Vec<DeviceNode> {
        (**self).nodes()
    }

    fn create_control(&self, name: &str) -> Result<DeviceNode, KeyringError> {
        (**self).create_control(name)
    }

    fn destroy_control(&self) -> Result<DeviceNode, KeyringError> {
        (**self).destroy_control()
    }

    fn control_node(&self) -> Option<DeviceNode> {
        (**self).control_node()
    }
}

#[derive(Default)]
struct Nodes {
    by_key: HashMap<SlotKey, DeviceNode>,
    by_minor: HashMap<Minor, SlotKey>,
    control: Option<DeviceNode>,
}

/// In-memory device class
///
/// Keeps the node table of one device class, names nodes
/// `<device_name><key>` and allocates minors from a [`MinorGen`].
pub struct DeviceClass {
    class_name: String,
    device_name: String,
    max_devices: usize,
    minors: MinorGen,
    nodes: Mutex<Nodes>,
}

impl DeviceClass {
    #[must_use]
    pub fn new(class_name: &str, device_name: &str, max_devices: usize) -> Self {
        Self {
            class_name: class_name.to_string(),
            device_name: device_name.to_string(),
            max_devices,
            minors: MinorGen::new(),
            nodes: Mutex::new(Nodes::default()),
        }
    }

    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.lock().by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeviceLifecycle for DeviceClass {
    fn create(&self, key: SlotKey) -> Result<DeviceNode, KeyringError> {
        let mut nodes = self.nodes.lock();
        if nodes.by_key.contains_key(&key) {
            return Err(KeyringError::AlreadyExists(key));
        }
        if nodes.by_key.len() >= self.max_devices {
            return Err(KeyringError::ResourceExhausted(format!(
                "class {}: limit of {} devices reached",
                self.class_name, self.max_devices
            )));
        }
        let minor = self.minors.get_next().ok_or_else(|| {
            KeyringError::ResourceExhausted(format!("class {}: out of minors", self.class_name))
        })?;

        let node = DeviceNode {
            name: format!("{}{key}", self.device_name),
            minor,
            key: Some(key),
        };
        nodes.by_minor.insert(minor, key);
        nodes.by_key.insert(key, node.clone());
        log::debug!("[{}] device_create {} minor {minor}", self.class_name, node.name);
        Ok(node)
    }

    fn destroy(&self, key: SlotKey) -> Result<DeviceNode, KeyringError> {
        let mut nodes = self.nodes.lock();
        let node = nodes.by_key.remove(&key).ok_or(KeyringError::NotFound(key))?;
        nodes.by_minor.remove(&node.minor);
        log::debug!("[{}] device_destroy {}", self.class_name, node.name);
        Ok(node)
    }

    fn resolve(&self, minor: Minor) -> Option<SlotKey> {
        self.nodes.lock().by_minor.get(&minor).copied()
    }

    fn node(&self, key: SlotKey) -> Option<DeviceNode> {
        self.nodes.lock().by_key.get(&key).cloned()
    }

    fn nodes(&self) -> Vec<DeviceNode> {
        let nodes = self.nodes.lock();
        let mut list: Vec<DeviceNode> = nodes.by_key.values().cloned().collect();
        list.sort_by_key(|node| node.key);
        list
    }

    fn create_control(&self, name: &str) -> Result<DeviceNode, KeyringError> {
        let mut nodes = self.nodes.lock();
        if let Some(existing) = &nodes.control {
            return Err(KeyringError::invalid(format!(
                "class {}: controller {} already registered",
                self.class_name, existing.name
            )));
        }
        let node = DeviceNode::control(name);
        nodes.control = Some(node.clone());
        log::debug!("[{}] device_create {} minor {}", self.class_name, node.name, node.minor);
        Ok(node)
    }

    fn destroy_control(&self) -> Result<DeviceNode, KeyringError> {
        let node = self.nodes.lock().control.take().ok_or_else(|| {
            KeyringError::invalid(format!("class {}: no controller registered", self.class_name))
        })?;
        log::debug!("[{}] device_destroy {}", self.class_name, node.name);
        Ok(node)
    }

    fn control_node(&self) -> Option<DeviceNode> {
        self.nodes.lock().control.clone()
    }
}

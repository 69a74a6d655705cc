use serde::Deserialize;

use crate::error::KeyringError;

/// Module parameters of the keyring
///
/// Every field has a default, so a JSON document only needs the fields it
/// overrides: `{"buf_size": 64}` is a complete configuration.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct KeyringConfig {
    /// Size in bytes of every slot buffer
    pub buf_size: usize,
    /// Name of the controller device node
    pub ctl_device_name: String,
    /// Prefix of slot device nodes, followed by the key
    pub device_name: String,
    /// Name of the device class the nodes belong to
    pub class_name: String,
    /// Upper bound on live slot device nodes
    pub max_devices: usize,
    /// Directory is sized for `1 << hash_bits` slots up front
    pub hash_bits: u8,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            buf_size: 32,
            ctl_device_name: "keyringctl".to_string(),
            device_name: "keyring".to_string(),
            class_name: "keyring".to_string(),
            max_devices: 256,
            hash_bits: 10,
        }
    }
}

impl KeyringConfig {
    /// Read a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The JSON input is invalid or malformed, or has unknown fields
    /// - There are I/O errors reading from the provided reader
    /// - The values fail [`KeyringConfig::validate`]
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, KeyringError> {
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| KeyringError::invalid(format!("failed to parse keyring config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Same as [`KeyringConfig::from_reader`].
    pub fn from_json(json: &str) -> Result<Self, KeyringError> {
        Self::from_reader(json.as_bytes())
    }

    /// # Errors
    /// `InvalidArgument` for a zero buffer size, zero device limit or empty names.
    pub fn validate(&self) -> Result<(), KeyringError> {
        if self.buf_size == 0 {
            return Err(KeyringError::invalid("buf_size must be positive"));
        }
        if self.max_devices == 0 {
            return Err(KeyringError::invalid("max_devices must be positive"));
        }
        if self.ctl_device_name.is_empty() || self.device_name.is_empty() {
            return Err(KeyringError::invalid("device names must not be empty"));
        }
        if self.ctl_device_name == self.device_name {
            return Err(KeyringError::invalid(
                "controller and slot devices need distinct names",
            ));
        }
        Ok(())
    }
}

//! Paired device model

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Bluetooth hardware address, used as the device key
///
/// Kept exactly as the Bluetooth manager publishes it (the PPS object name).
/// No format validation or case normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(mac: impl Into<String>) -> Self {
        Self(mac.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MacAddress {
    fn from(s: &str) -> Self {
        MacAddress::new(s)
    }
}

impl From<String> for MacAddress {
    fn from(s: String) -> Self {
        MacAddress(s)
    }
}

impl Borrow<str> for MacAddress {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A device currently paired with the head unit
///
/// Serializes with the Bluetooth manager's attribute names (`cod`, `rssi`)
/// so snapshots can be handed to the application layer unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedDevice {
    pub mac: MacAddress,
    /// Class of device, as published (e.g. `0x5a020c`)
    #[serde(rename = "cod")]
    pub class_of_device: String,
    pub name: String,
    pub paired: bool,
    /// Signal strength, as published
    #[serde(rename = "rssi")]
    pub signal_strength: String,
}

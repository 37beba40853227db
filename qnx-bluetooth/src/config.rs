//! Object paths used by the bridge

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAIRED_DEVICES_PATH: &str = "/pps/services/bluetooth/paired_devices/.all";
pub const DEFAULT_CONTROL_PATH: &str = "/pps/services/bluetooth/control";
pub const DEFAULT_STATUS_PATH: &str = "/pps/services/bluetooth/status";

const PPS_MOUNT: &str = "/pps";

/// Where the Bluetooth manager publishes its objects
///
/// The defaults are the paths the QNX Bluetooth manager uses; other values
/// only make sense for a relocated PPS mount or for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Directory-wide delta feed of paired devices
    pub paired_devices_path: String,
    /// Command object written by the bridge
    pub control_path: String,
    /// Lifecycle notifications
    pub status_path: String,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            paired_devices_path: DEFAULT_PAIRED_DEVICES_PATH.to_string(),
            control_path: DEFAULT_CONTROL_PATH.to_string(),
            status_path: DEFAULT_STATUS_PATH.to_string(),
        }
    }
}

impl BluetoothConfig {
    /// Move every path that lives under `/pps` to `mount` instead
    pub fn with_pps_mount(mut self, mount: &str) -> Self {
        let mount = mount.trim_end_matches('/');
        for path in [
            &mut self.paired_devices_path,
            &mut self.control_path,
            &mut self.status_path,
        ] {
            if let Some(rest) = path.strip_prefix(PPS_MOUNT) {
                if rest.is_empty() || rest.starts_with('/') {
                    let relocated = format!("{}{}", mount, rest);
                    *path = relocated;
                }
            }
        }
        self
    }
}

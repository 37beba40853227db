//! # QNX Bluetooth bridge
//!
//! Exposes the QNX Bluetooth manager to an application through its PPS
//! objects:
//!
//! - keeps a cache of paired devices from the `paired_devices/.all` feed,
//!   removing entries when the `status` object reports a deletion
//! - forwards connect requests to the `control` object
//!
//! ```rust,no_run
//! use qnx_bluetooth::BluetoothSystem;
//!
//! fn main() -> Result<(), qnx_bluetooth::BluetoothError> {
//!     let system = BluetoothSystem::open()?;
//!
//!     for device in system.get_paired().values() {
//!         println!("{} ({}) rssi={}", device.name, device.mac, device.signal_strength);
//!     }
//!
//!     // Connect every profile, or a single one such as "OBEX"
//!     system.connect_service("ALL", "00:11:22:33:44:55")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! qnx-bluetooth (BluetoothSystem, ControlCommand)
//!     ↓
//! bluetooth-event-manager (feed readers, dispatcher, control sink)
//!     ↓                         ↓
//! bluetooth-state           pps-client (codec, transports)
//! (normalizer, cache)
//! ```
//!
//! Feed handlers run on a single dispatcher thread, so cache updates are
//! applied one at a time in the order each feed published them.

pub mod command;
pub mod config;
mod error;
pub mod logging;
mod system;

pub use command::{ControlCommand, ServiceId, SERVICE_ALL};
pub use config::BluetoothConfig;
pub use error::{BluetoothError, ValidationError};
pub use system::BluetoothSystem;

pub use bluetooth_state::{CacheEvent, CacheEventKind, ChangeIterator, MacAddress, PairedDevice};
pub use pps_client::{FsTransport, PpsTransport};

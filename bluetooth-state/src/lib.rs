//! Paired-device state for the QNX Bluetooth bridge
//!
//! Keeps an in-memory view of the devices currently paired with the head
//! unit, fed by the Bluetooth manager's PPS notifications.
//!
//! # Architecture
//!
//! ```text
//! PpsMessage ──▶ EventNormalizer ──▶ DeviceCache ──▶ snapshot()
//!  (paired_devices / status)            │
//!                                       └──▶ ChangeIterator (CacheEvent)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use bluetooth_state::{DeviceCache, EventNormalizer, Normalized};
//! use pps_client::PpsMessage;
//!
//! let normalizer = EventNormalizer::new(DeviceCache::new());
//!
//! let pairing = PpsMessage::new("00:11:22:33:44:55")
//!     .with("cod", "0x5a020c\n")
//!     .with("name", "Phone")
//!     .with("paired", true)
//!     .with("rssi", "-60");
//!
//! assert!(normalizer.on_paired_device(&pairing).is_applied());
//! assert_eq!(
//!     normalizer.cache().get("00:11:22:33:44:55").unwrap().class_of_device,
//!     "0x5a020c"
//! );
//! ```

pub mod cache;
pub mod event;
pub mod iter;
pub mod model;
pub mod normalizer;

pub use cache::DeviceCache;
pub use event::{CacheEvent, CacheEventKind};
pub use iter::{ChangeIterator, TimeoutIter, TryIter};
pub use model::{MacAddress, PairedDevice};
pub use normalizer::{strip_line_breaks, DropReason, EventNormalizer, Normalized, StatusEvent};

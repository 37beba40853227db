//! # Bluetooth Event Manager
//!
//! Opens the Bluetooth manager's PPS objects and delivers their contents to
//! registered handlers.
//!
//! ## Overview
//!
//! Each read feed gets a reader thread that blocks on the PPS object and
//! forwards decoded messages to a single dispatcher thread. The dispatcher
//! calls handlers one event at a time, so handlers see a single-threaded,
//! non-reentrant stream in per-feed publication order. No ordering is
//! guaranteed between different feeds.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bluetooth_event_manager::{EventManager, Feed, FeedEvent};
//! use pps_client::{FsTransport, PpsMode};
//!
//! let manager = EventManager::builder(Arc::new(FsTransport::new()))
//!     .feed(Feed::Status, "/pps/services/bluetooth/status", PpsMode::Delta)
//!     .on_new_data(Feed::Status, |event: &FeedEvent| {
//!         println!("status: {:?}", event.message.attributes);
//!     })
//!     .start()?;
//! ```

pub mod error;
pub mod feed;
pub mod manager;
mod worker;

pub use error::{EventManagerError, Result};
pub use feed::{Delivery, Feed, FeedEvent, FeedHandler};
pub use manager::{ControlSink, EventManager, EventManagerBuilder};

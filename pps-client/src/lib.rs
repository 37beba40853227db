//! Minimal PPS client for the QNX Bluetooth bridge
//!
//! PPS (Persistent Publish/Subscribe) exposes services as text objects
//! under `/pps`. This crate provides the object text codec, a transport
//! trait for opening objects, and a filesystem implementation of it.
//! Enable the `test-support` feature for an in-memory transport.

mod codec;
mod error;
mod fs;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod transport;

pub use codec::{decode, encode, Attributes, ObjectChange, PpsMessage, PpsValue};
pub use error::PpsError;
pub use fs::FsTransport;
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryTransport;
pub use transport::{FileMode, PpsHandle, PpsMode, PpsTransport, POLL_INTERVAL};

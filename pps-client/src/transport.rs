//! Transport abstraction over PPS objects
//!
//! The bridge never touches PPS files directly. It opens objects through a
//! [`PpsTransport`] and reads or writes through the returned [`PpsHandle`],
//! so the QNX filesystem can be swapped for a mirror directory or an
//! in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use crate::codec::{Attributes, PpsMessage};
use crate::error::PpsError;

/// Longest a [`PpsHandle::read`] waits before reporting "no change"
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Delivery mode of a PPS object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PpsMode {
    /// Every read returns the complete object
    Full,
    /// After the first read, reads return only what changed
    Delta,
}

/// Access mode requested when opening an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl FileMode {
    pub fn can_read(self) -> bool {
        matches!(self, FileMode::ReadOnly | FileMode::ReadWrite)
    }

    pub fn can_write(self) -> bool {
        matches!(self, FileMode::WriteOnly | FileMode::ReadWrite)
    }
}

/// An open PPS object
pub trait PpsHandle: Send {
    /// Path the handle was opened with
    fn path(&self) -> &str;

    /// Wait up to [`POLL_INTERVAL`] for data and decode it
    ///
    /// The first call returns the object's current state; later calls
    /// return changes, or an empty batch when nothing changed in time.
    /// `Ok(None)` means the publisher closed the object and no further
    /// data will arrive.
    fn read(&mut self) -> Result<Option<Vec<PpsMessage>>, PpsError>;

    /// Publish an attribute set to the object
    fn write(&mut self, attributes: &Attributes) -> Result<(), PpsError>;
}

/// Opens PPS objects
pub trait PpsTransport: Send + Sync {
    fn open(
        &self,
        path: &str,
        mode: PpsMode,
        access: FileMode,
    ) -> Result<Box<dyn PpsHandle>, PpsError>;
}

impl<T: PpsTransport + ?Sized> PpsTransport for Arc<T> {
    fn open(
        &self,
        path: &str,
        mode: PpsMode,
        access: FileMode,
    ) -> Result<Box<dyn PpsHandle>, PpsError> {
        (**self).open(path, mode, access)
    }
}

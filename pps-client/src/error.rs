//! Error types for the PPS client

use std::io;
use thiserror::Error;

/// Errors that can occur while talking to PPS objects
#[derive(Debug, Error)]
pub enum PpsError {
    /// The object could not be opened
    #[error("Failed to open PPS object {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Read or write on an open object failed
    #[error("I/O error on PPS object {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The handle was opened with an access mode that forbids the operation
    #[error("PPS object {path} is not open for {operation}")]
    AccessDenied {
        path: String,
        operation: &'static str,
    },

    /// The object was closed by the publisher
    #[error("PPS object {0} has been closed")]
    Closed(String),
}

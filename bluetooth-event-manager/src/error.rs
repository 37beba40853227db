use pps_client::PpsError;
use thiserror::Error;

/// Errors that can occur in the event manager
#[derive(Error, Debug)]
pub enum EventManagerError {
    /// Opening a PPS object failed; the transport error is passed through
    #[error(transparent)]
    Transport(#[from] PpsError),

    /// A reader or dispatcher thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    WorkerSpawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The same feed was configured twice
    #[error("Feed {0:?} configured more than once")]
    DuplicateFeed(crate::feed::Feed),

    /// A control sink was required but no control object was configured
    #[error("No control object configured")]
    ControlNotConfigured,
}

/// Result type for event manager operations
pub type Result<T> = std::result::Result<T, EventManagerError>;

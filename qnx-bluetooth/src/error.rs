use bluetooth_event_manager::EventManagerError;
use pps_client::PpsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BluetoothError {
    #[error("Invalid command: {0}")]
    Validation(#[from] ValidationError),

    #[error("PPS transport error: {0}")]
    Transport(#[from] PpsError),

    #[error("Event manager error: {0}")]
    EventManager(#[from] EventManagerError),
}

/// Arguments rejected before anything is written to the control object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("service identifier is empty")]
    EmptyService,

    #[error("device address is empty")]
    EmptyMac,
}

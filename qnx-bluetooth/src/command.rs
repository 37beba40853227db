//! Commands written to the Bluetooth manager's control object

use std::fmt;

use bluetooth_state::MacAddress;
use pps_client::{Attributes, PpsValue};

use crate::error::ValidationError;

/// Service identifier meaning "every profile the device supports"
pub const SERVICE_ALL: &str = "ALL";

const ATTR_COMMAND: &str = "command";
const ATTR_DATA: &str = "data";
const ATTR_DATA2: &str = "data2";

/// Which service to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceId {
    /// The `"ALL"` sentinel
    All,
    /// An opaque profile identifier, passed through unchanged
    Profile(String),
}

impl ServiceId {
    pub fn parse(service: &str) -> Result<Self, ValidationError> {
        match service {
            "" => Err(ValidationError::EmptyService),
            SERVICE_ALL => Ok(ServiceId::All),
            profile => Ok(ServiceId::Profile(profile.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceId::All => SERVICE_ALL,
            ServiceId::Profile(profile) => profile,
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command object for the control sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// `{command: "connect_all", data: mac}`
    ConnectAll { mac: MacAddress },
    /// `{command: "connect_service", data: mac, data2: service}`
    ConnectService { mac: MacAddress, service: String },
}

impl ControlCommand {
    /// Build the connect command for `service` on `mac`
    ///
    /// Both arguments must be non-empty. `"ALL"` selects every service.
    pub fn connect(service: &str, mac: &str) -> Result<Self, ValidationError> {
        let service = ServiceId::parse(service)?;
        if mac.is_empty() {
            return Err(ValidationError::EmptyMac);
        }
        let mac = MacAddress::new(mac);

        Ok(match service {
            ServiceId::All => ControlCommand::ConnectAll { mac },
            ServiceId::Profile(service) => ControlCommand::ConnectService { mac, service },
        })
    }

    /// Value of the `command` attribute
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::ConnectAll { .. } => "connect_all",
            ControlCommand::ConnectService { .. } => "connect_service",
        }
    }

    pub fn mac(&self) -> &MacAddress {
        match self {
            ControlCommand::ConnectAll { mac } | ControlCommand::ConnectService { mac, .. } => mac,
        }
    }

    /// Attribute set written to the control object
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(ATTR_COMMAND.to_string(), PpsValue::from(self.name()));
        attributes.insert(ATTR_DATA.to_string(), PpsValue::from(self.mac().as_str()));
        if let ControlCommand::ConnectService { service, .. } = self {
            attributes.insert(ATTR_DATA2.to_string(), PpsValue::from(service.as_str()));
        }
        attributes
    }
}

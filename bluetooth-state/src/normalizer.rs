//! Event normalizer - turns Bluetooth manager PPS messages into cache updates
//!
//! Two feeds are consumed:
//!
//! - the paired-devices feed, one PPS object per device named by its MAC
//!   address, carrying `cod`, `name`, `paired` and `rssi`;
//! - the status feed, carrying an `event` tag and a `data` argument.
//!
//! Every call returns a [`Normalized`] outcome so callers can tell an
//! applied update from a message that was dropped and why.

use pps_client::{ObjectChange, PpsMessage, PpsValue};

use crate::cache::DeviceCache;
use crate::model::{MacAddress, PairedDevice};

pub const ATTR_CLASS_OF_DEVICE: &str = "cod";
pub const ATTR_NAME: &str = "name";
pub const ATTR_PAIRED: &str = "paired";
pub const ATTR_SIGNAL_STRENGTH: &str = "rssi";
pub const ATTR_EVENT: &str = "event";
pub const ATTR_EVENT_DATA: &str = "data";

/// Status tag published when a paired device is deleted
pub const DEVICE_DELETED: &str = "BTMGR_EVENT_DEVICE_DELETED";

/// Status event tag published by the Bluetooth manager
///
/// Only device deletion affects the cache. Every other tag is carried as
/// `Other` and ignored; new variants go here when the bridge learns to
/// handle more lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    DeviceDeleted,
    Other(String),
}

impl StatusEvent {
    pub fn parse(tag: &str) -> Self {
        match tag {
            DEVICE_DELETED => StatusEvent::DeviceDeleted,
            other => StatusEvent::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StatusEvent::DeviceDeleted => DEVICE_DELETED,
            StatusEvent::Other(tag) => tag,
        }
    }
}

/// Why a message did not change the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A required pairing attribute was absent or empty
    MissingField(&'static str),
    /// A required pairing attribute was present but its value is unusable
    InvalidField(&'static str),
    /// The paired-devices feed reported the object itself as deleted
    ObjectDeleted,
    /// Status message without an `event` tag
    MissingEventTag,
    /// Deletion status without a target address
    MissingTarget,
    /// Status tag the bridge does not act on
    UnhandledStatus(StatusEvent),
}

/// Result of normalizing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Device inserted or overwritten
    Upserted(MacAddress),
    /// Device removed
    Removed(MacAddress),
    /// Deletion for a device that was not cached
    NotPresent(MacAddress),
    Dropped(DropReason),
}

impl Normalized {
    /// Whether the cache was modified
    pub fn is_applied(&self) -> bool {
        matches!(self, Normalized::Upserted(_) | Normalized::Removed(_))
    }
}

/// Remove every carriage return and line feed
///
/// The Bluetooth manager has been seen to append line breaks to `cod` and
/// `rssi` values.
pub fn strip_line_breaks(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Applies PPS messages to a [`DeviceCache`]
#[derive(Debug, Clone)]
pub struct EventNormalizer {
    cache: DeviceCache,
}

impl EventNormalizer {
    pub fn new(cache: DeviceCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// Handle a message from the paired-devices feed
    ///
    /// All of `cod`, `name`, `paired` and `rssi` must be present; `paired`
    /// may be `false`. The entry for the object's MAC is overwritten.
    pub fn on_paired_device(&self, message: &PpsMessage) -> Normalized {
        let outcome = self.apply_paired_device(message);
        log_outcome("paired_devices", &message.object, &outcome);
        outcome
    }

    /// Handle a message from the status feed
    pub fn on_status_change(&self, message: &PpsMessage) -> Normalized {
        let outcome = self.apply_status_change(message);
        log_outcome("status", &message.object, &outcome);
        outcome
    }

    fn apply_paired_device(&self, message: &PpsMessage) -> Normalized {
        if message.change == ObjectChange::Deleted {
            return Normalized::Dropped(DropReason::ObjectDeleted);
        }

        match paired_device(message) {
            Ok(device) => {
                let mac = device.mac.clone();
                self.cache.upsert(device);
                Normalized::Upserted(mac)
            }
            Err(reason) => Normalized::Dropped(reason),
        }
    }

    fn apply_status_change(&self, message: &PpsMessage) -> Normalized {
        let tag = match required_text(message, ATTR_EVENT) {
            Some(tag) => tag,
            None => return Normalized::Dropped(DropReason::MissingEventTag),
        };

        match StatusEvent::parse(&tag) {
            StatusEvent::DeviceDeleted => {
                let mac = match required_text(message, ATTR_EVENT_DATA) {
                    Some(mac) => MacAddress::new(mac),
                    None => return Normalized::Dropped(DropReason::MissingTarget),
                };
                match self.cache.remove(mac.as_str()) {
                    Some(_) => Normalized::Removed(mac),
                    None => Normalized::NotPresent(mac),
                }
            }
            other => Normalized::Dropped(DropReason::UnhandledStatus(other)),
        }
    }
}

/// Build the cache entry for a pairing object with sanitized fields
fn paired_device(message: &PpsMessage) -> Result<PairedDevice, DropReason> {
    let class_of_device = text_field(message, ATTR_CLASS_OF_DEVICE)?;
    let name = text_field(message, ATTR_NAME)?;
    let paired = lookup(message, ATTR_PAIRED)?
        .as_bool()
        .ok_or(DropReason::InvalidField(ATTR_PAIRED))?;
    let signal_strength = text_field(message, ATTR_SIGNAL_STRENGTH)?;

    Ok(PairedDevice {
        mac: MacAddress::new(message.object.as_str()),
        class_of_device: strip_line_breaks(&class_of_device),
        name,
        paired,
        signal_strength: strip_line_breaks(&signal_strength),
    })
}

/// A pairing attribute, telling an absent one from one that failed to decode
fn lookup<'a>(message: &'a PpsMessage, name: &'static str) -> Result<&'a PpsValue, DropReason> {
    match message.get(name) {
        Some(value) => Ok(value),
        None if message.invalid.iter().any(|n| n == name) => Err(DropReason::InvalidField(name)),
        None => Err(DropReason::MissingField(name)),
    }
}

/// Textual pairing attribute; empty text counts as missing
fn text_field(message: &PpsMessage, name: &'static str) -> Result<String, DropReason> {
    match lookup(message, name)?.to_text() {
        Some(text) if text.is_empty() => Err(DropReason::MissingField(name)),
        Some(text) => Ok(text),
        None => Err(DropReason::InvalidField(name)),
    }
}

/// Textual attribute that is present and non-empty
fn required_text(message: &PpsMessage, name: &str) -> Option<String> {
    message
        .get(name)
        .and_then(PpsValue::to_text)
        .filter(|v| !v.is_empty())
}

fn log_outcome(feed: &str, object: &str, outcome: &Normalized) {
    match outcome {
        Normalized::Upserted(mac) => tracing::debug!("{}: cached device {}", feed, mac),
        Normalized::Removed(mac) => tracing::debug!("{}: removed device {}", feed, mac),
        Normalized::NotPresent(mac) => {
            tracing::debug!("{}: deletion for uncached device {}", feed, mac)
        }
        Normalized::Dropped(reason) => {
            tracing::debug!("{}: dropped message for {:?}: {:?}", feed, object, reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: &str = "00:11:22:33:44:55";

    fn pairing(mac: &str) -> PpsMessage {
        PpsMessage::new(mac)
            .with("cod", "0x5a020c\r\n")
            .with("name", "Phone")
            .with("paired", true)
            .with("rssi", "-60\n")
    }

    fn status(tag: &str, mac: &str) -> PpsMessage {
        PpsMessage::new("status").with("event", tag).with("data", mac)
    }

    fn normalizer() -> EventNormalizer {
        EventNormalizer::new(DeviceCache::new())
    }

    #[test]
    fn test_pairing_sanitizes_fields() {
        let normalizer = normalizer();

        let outcome = normalizer.on_paired_device(&pairing(MAC));
        assert_eq!(outcome, Normalized::Upserted(MAC.into()));
        assert!(outcome.is_applied());

        let device = normalizer.cache().get(MAC).unwrap();
        assert_eq!(device.class_of_device, "0x5a020c");
        assert_eq!(device.signal_strength, "-60");
        assert_eq!(device.name, "Phone");
        assert!(device.paired);
    }

    #[test]
    fn test_pairing_accepts_paired_false() {
        let normalizer = normalizer();
        let message = pairing(MAC).with("paired", false);

        assert!(normalizer.on_paired_device(&message).is_applied());
        assert!(!normalizer.cache().get(MAC).unwrap().paired);
    }

    #[test]
    fn test_pairing_accepts_numeric_rssi() {
        let normalizer = normalizer();
        let message = pairing(MAC).with("rssi", -71.0);

        assert!(normalizer.on_paired_device(&message).is_applied());
        assert_eq!(normalizer.cache().get(MAC).unwrap().signal_strength, "-71");
    }

    #[test]
    fn test_pairing_missing_fields_dropped() {
        for field in ["cod", "name", "paired", "rssi"] {
            let normalizer = normalizer();
            let mut message = pairing(MAC);
            message.attributes.remove(field);

            let outcome = normalizer.on_paired_device(&message);
            assert!(
                matches!(outcome, Normalized::Dropped(DropReason::MissingField(f)) if f == field),
                "{} -> {:?}",
                field,
                outcome
            );
            assert!(normalizer.cache().is_empty());
        }
    }

    #[test]
    fn test_pairing_empty_name_dropped() {
        let normalizer = normalizer();
        let outcome = normalizer.on_paired_device(&pairing(MAC).with("name", ""));
        assert_eq!(outcome, Normalized::Dropped(DropReason::MissingField("name")));
    }

    #[test]
    fn test_pairing_accepts_numeric_paired() {
        let normalizer = normalizer();

        assert!(normalizer.on_paired_device(&pairing(MAC).with("paired", 1.0)).is_applied());
        assert!(normalizer.cache().get(MAC).unwrap().paired);

        assert!(normalizer.on_paired_device(&pairing(MAC).with("paired", 0.0)).is_applied());
        assert!(!normalizer.cache().get(MAC).unwrap().paired);
    }

    #[test]
    fn test_pairing_unusable_paired_value_is_invalid() {
        let normalizer = normalizer();
        let outcome = normalizer.on_paired_device(&pairing(MAC).with("paired", "maybe"));
        assert_eq!(outcome, Normalized::Dropped(DropReason::InvalidField("paired")));
        assert!(normalizer.cache().is_empty());
    }

    #[test]
    fn test_pairing_undecodable_field_is_invalid() {
        let normalizer = normalizer();
        let mut message = pairing(MAC);
        message.attributes.remove("rssi");
        message.invalid.push("rssi".to_string());

        let outcome = normalizer.on_paired_device(&message);
        assert_eq!(outcome, Normalized::Dropped(DropReason::InvalidField("rssi")));
    }

    #[test]
    fn test_pairing_object_deleted_dropped() {
        let normalizer = normalizer();
        normalizer.on_paired_device(&pairing(MAC));

        let mut message = PpsMessage::new(MAC);
        message.change = ObjectChange::Deleted;

        assert_eq!(
            normalizer.on_paired_device(&message),
            Normalized::Dropped(DropReason::ObjectDeleted)
        );
        assert!(normalizer.cache().contains(MAC));
    }

    #[test]
    fn test_device_deleted_removes_entry() {
        let normalizer = normalizer();
        normalizer.on_paired_device(&pairing(MAC));
        normalizer.on_paired_device(&pairing("66:77:88:99:AA:BB"));

        let outcome = normalizer.on_status_change(&status(DEVICE_DELETED, MAC));
        assert_eq!(outcome, Normalized::Removed(MAC.into()));
        assert!(!normalizer.cache().contains(MAC));
        assert_eq!(normalizer.cache().len(), 1);
    }

    #[test]
    fn test_device_deleted_for_unknown_mac() {
        let normalizer = normalizer();
        let outcome = normalizer.on_status_change(&status(DEVICE_DELETED, MAC));
        assert_eq!(outcome, Normalized::NotPresent(MAC.into()));
        assert!(!outcome.is_applied());
    }

    #[test]
    fn test_device_deleted_without_target() {
        let normalizer = normalizer();
        let message = PpsMessage::new("status").with("event", DEVICE_DELETED);
        assert_eq!(
            normalizer.on_status_change(&message),
            Normalized::Dropped(DropReason::MissingTarget)
        );
    }

    #[test]
    fn test_status_without_tag_dropped() {
        let normalizer = normalizer();
        normalizer.on_paired_device(&pairing(MAC));

        let message = PpsMessage::new("status").with("data", MAC);
        assert_eq!(
            normalizer.on_status_change(&message),
            Normalized::Dropped(DropReason::MissingEventTag)
        );
        assert!(normalizer.cache().contains(MAC));
    }

    #[test]
    fn test_unhandled_status_never_mutates() {
        let normalizer = normalizer();
        normalizer.on_paired_device(&pairing(MAC));

        let outcome = normalizer.on_status_change(&status("BTMGR_EVENT_CONNECT_ALL_SUCCESS", MAC));
        assert_eq!(
            outcome,
            Normalized::Dropped(DropReason::UnhandledStatus(StatusEvent::Other(
                "BTMGR_EVENT_CONNECT_ALL_SUCCESS".to_string()
            )))
        );
        assert_eq!(normalizer.cache().len(), 1);
    }

    #[test]
    fn test_status_event_round_trip() {
        assert_eq!(StatusEvent::parse(DEVICE_DELETED), StatusEvent::DeviceDeleted);
        assert_eq!(StatusEvent::DeviceDeleted.as_str(), DEVICE_DELETED);
        assert_eq!(StatusEvent::parse("X").as_str(), "X");
    }

    #[test]
    fn test_strip_line_breaks() {
        assert_eq!(strip_line_breaks("a\r\nb\nc\rd"), "abcd");
        assert_eq!(strip_line_breaks("clean"), "clean");
    }
}

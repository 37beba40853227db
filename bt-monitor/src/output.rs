//! JSON rendering for command output
//!
//! Everything written to stdout is JSON so the monitor can be piped into
//! other tools; diagnostics go to stderr through tracing.

use std::collections::HashMap;

use anyhow::Result;
use qnx_bluetooth::{CacheEvent, CacheEventKind, MacAddress, PairedDevice};
use serde::Serialize;

/// One line of `watch` output
#[derive(Debug, Serialize, PartialEq)]
pub struct WatchLine {
    pub event: &'static str,
    pub mac: MacAddress,
    /// Current entry for upserts; absent for removals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<PairedDevice>,
}

impl WatchLine {
    pub fn new(event: &CacheEvent, device: Option<PairedDevice>) -> Self {
        let (name, device) = match event.kind {
            CacheEventKind::Upserted => ("upserted", device),
            CacheEventKind::Removed => ("removed", None),
        };
        Self {
            event: name,
            mac: event.mac.clone(),
            device,
        }
    }
}

/// Paired devices as a JSON array ordered by MAC address
pub fn render_snapshot(snapshot: HashMap<MacAddress, PairedDevice>) -> Result<String> {
    let mut devices: Vec<_> = snapshot.into_values().collect();
    devices.sort_by(|a, b| a.mac.cmp(&b.mac));
    Ok(serde_json::to_string_pretty(&devices)?)
}

pub fn render_watch_line(line: &WatchLine) -> Result<String> {
    Ok(serde_json::to_string(line)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(mac: &str, name: &str) -> PairedDevice {
        PairedDevice {
            mac: mac.into(),
            class_of_device: "0x5a020c".to_string(),
            name: name.to_string(),
            paired: true,
            signal_strength: "-60".to_string(),
        }
    }

    #[test]
    fn test_snapshot_is_sorted_with_wire_names() {
        let mut snapshot = HashMap::new();
        snapshot.insert("BB".into(), device("BB", "Watch"));
        snapshot.insert("AA".into(), device("AA", "Phone"));

        let value: serde_json::Value =
            serde_json::from_str(&render_snapshot(snapshot).unwrap()).unwrap();

        assert_eq!(value[0]["mac"], "AA");
        assert_eq!(value[1]["name"], "Watch");
        assert_eq!(value[0]["cod"], "0x5a020c");
        assert_eq!(value[0]["rssi"], "-60");
    }

    #[test]
    fn test_empty_snapshot() {
        assert_eq!(render_snapshot(HashMap::new()).unwrap(), "[]");
    }

    #[test]
    fn test_removed_line_omits_device() {
        let event = CacheEvent::new("AA".into(), CacheEventKind::Removed);
        let line = WatchLine::new(&event, Some(device("AA", "Phone")));

        assert_eq!(
            render_watch_line(&line).unwrap(),
            r#"{"event":"removed","mac":"AA"}"#
        );
    }

    #[test]
    fn test_upserted_line_carries_device() {
        let event = CacheEvent::new("AA".into(), CacheEventKind::Upserted);
        let line = WatchLine::new(&event, Some(device("AA", "Phone")));

        let value: serde_json::Value =
            serde_json::from_str(&render_watch_line(&line).unwrap()).unwrap();
        assert_eq!(value["event"], "upserted");
        assert_eq!(value["device"]["name"], "Phone");
    }
}

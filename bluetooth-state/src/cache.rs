//! Paired-device cache
//!
//! `DeviceCache` maps a device's MAC address to its last published
//! attributes. It is a cheap, cloneable handle: clones share the same map
//! and the same set of change subscribers.

use std::collections::HashMap;
use std::sync::{mpsc, Arc};

use parking_lot::{Mutex, RwLock};

use crate::event::{CacheEvent, CacheEventKind};
use crate::iter::ChangeIterator;
use crate::model::{MacAddress, PairedDevice};

/// Cache of currently paired devices keyed by MAC address
///
/// Every [`DeviceCache::iter`] call gets its own event queue. Queues whose
/// iterator has been dropped are pruned on the next change, so a cache
/// nobody observes does not accumulate a backlog.
///
/// # Example
///
/// ```rust
/// use bluetooth_state::{DeviceCache, PairedDevice};
///
/// let cache = DeviceCache::new();
/// cache.upsert(PairedDevice {
///     mac: "00:11:22:33:44:55".into(),
///     class_of_device: "0x5a020c".to_string(),
///     name: "Phone".to_string(),
///     paired: true,
///     signal_strength: "-60".to_string(),
/// });
///
/// assert_eq!(cache.len(), 1);
/// assert_eq!(cache.get("00:11:22:33:44:55").map(|d| d.name), Some("Phone".to_string()));
/// ```
#[derive(Clone)]
pub struct DeviceCache {
    devices: Arc<RwLock<HashMap<MacAddress, PairedDevice>>>,
    subscribers: Arc<Mutex<Vec<mpsc::Sender<CacheEvent>>>>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self {
            devices: Arc::new(RwLock::new(HashMap::new())),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Insert or overwrite the entry for `device.mac`
    ///
    /// Returns whether the stored value changed.
    pub fn upsert(&self, device: PairedDevice) -> bool {
        let mac = device.mac.clone();
        let changed = {
            let mut devices = self.devices.write();
            match devices.insert(mac.clone(), device) {
                Some(previous) => devices.get(&mac) != Some(&previous),
                None => true,
            }
        };

        if changed {
            self.emit(mac, CacheEventKind::Upserted);
        }
        changed
    }

    /// Remove the entry for `mac`, returning it if it existed
    pub fn remove(&self, mac: &str) -> Option<PairedDevice> {
        let removed = self.devices.write().remove(mac);
        if let Some(device) = &removed {
            self.emit(device.mac.clone(), CacheEventKind::Removed);
        }
        removed
    }

    pub fn get(&self, mac: &str) -> Option<PairedDevice> {
        self.devices.read().get(mac).cloned()
    }

    pub fn contains(&self, mac: &str) -> bool {
        self.devices.read().contains_key(mac)
    }

    /// Owned copy of the whole cache
    pub fn snapshot(&self) -> HashMap<MacAddress, PairedDevice> {
        self.devices.read().clone()
    }

    /// All cached devices, sorted by MAC address
    pub fn devices(&self) -> Vec<PairedDevice> {
        let mut devices: Vec<_> = self.devices.read().values().cloned().collect();
        devices.sort_by(|a, b| a.mac.cmp(&b.mac));
        devices
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry without emitting events
    pub fn clear(&self) {
        self.devices.write().clear();
    }

    /// Blocking iterator over change events made after this call
    ///
    /// Each call returns an independent queue; earlier changes are never
    /// reported.
    pub fn iter(&self) -> ChangeIterator {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        ChangeIterator::new(Arc::new(Mutex::new(rx)))
    }

    fn emit(&self, mac: MacAddress, kind: CacheEventKind) {
        let event = CacheEvent::new(mac, kind);
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for DeviceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeviceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCache")
            .field("device_count", &self.len())
            .finish()
    }
}

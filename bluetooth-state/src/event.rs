//! Change events for cache updates
//!
//! When the cache actually changes, a `CacheEvent` is emitted naming the
//! device and what happened to it.

use std::time::Instant;

use crate::model::MacAddress;

/// What happened to a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// The device was added or its attributes changed
    Upserted,
    /// The device was removed
    Removed,
}

/// A change event emitted when a cache entry changes
///
/// Events carry only the key. Use `DeviceCache::get()` to read the new
/// value after receiving an `Upserted` event.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    pub mac: MacAddress,
    pub kind: CacheEventKind,
    /// When the change was applied
    pub timestamp: Instant,
}

impl CacheEvent {
    pub fn new(mac: MacAddress, kind: CacheEventKind) -> Self {
        Self {
            mac,
            kind,
            timestamp: Instant::now(),
        }
    }
}

impl PartialEq for CacheEvent {
    fn eq(&self, other: &Self) -> bool {
        // Timestamp not included in equality
        self.mac == other.mac && self.kind == other.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_event_equality_ignores_timestamp() {
        let first = CacheEvent::new("aa".into(), CacheEventKind::Upserted);
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = CacheEvent::new("aa".into(), CacheEventKind::Upserted);
        let removed = CacheEvent::new("aa".into(), CacheEventKind::Removed);
        let other = CacheEvent::new("bb".into(), CacheEventKind::Upserted);

        assert_eq!(first, second);
        assert_ne!(first, removed);
        assert_ne!(first, other);
    }
}

//! BluetoothSystem - Main entry point for the bridge
//!
//! Owns the paired-device cache, the running feed subscriptions and the
//! control sink. Everything is synchronous; feed delivery happens on the
//! event manager's background threads.

use std::collections::HashMap;
use std::sync::Arc;

use bluetooth_event_manager::{ControlSink, EventManager, Feed, FeedEvent};
use bluetooth_state::{ChangeIterator, DeviceCache, EventNormalizer, MacAddress, PairedDevice};
use pps_client::{FsTransport, PpsMode, PpsTransport};

use crate::command::ControlCommand;
use crate::config::BluetoothConfig;
use crate::error::BluetoothError;

/// Connection to the QNX Bluetooth manager
///
/// # Example
///
/// ```rust,ignore
/// use qnx_bluetooth::BluetoothSystem;
///
/// fn main() -> Result<(), qnx_bluetooth::BluetoothError> {
///     let system = BluetoothSystem::open()?;
///
///     for (mac, device) in system.get_paired() {
///         println!("{} {} paired={}", mac, device.name, device.paired);
///     }
///
///     system.connect_service("ALL", "00:11:22:33:44:55")?;
///     Ok(())
/// }
/// ```
pub struct BluetoothSystem {
    cache: DeviceCache,
    control: ControlSink,
    events: EventManager,
    config: BluetoothConfig,
}

impl BluetoothSystem {
    /// Connect to the live PPS server with the default object paths
    pub fn open() -> Result<Self, BluetoothError> {
        Self::init(Arc::new(FsTransport::new()), BluetoothConfig::default())
    }

    /// Open the paired-devices feed, the control object and the status feed
    ///
    /// Objects are opened in that order, all in delta mode. The first
    /// failure is returned and nothing keeps running.
    pub fn init(
        transport: Arc<dyn PpsTransport>,
        config: BluetoothConfig,
    ) -> Result<Self, BluetoothError> {
        let cache = DeviceCache::new();
        let normalizer = EventNormalizer::new(cache.clone());

        let on_pairing = {
            let normalizer = normalizer.clone();
            move |event: &FeedEvent| {
                normalizer.on_paired_device(&event.message);
            }
        };
        let on_pairing_update = {
            let normalizer = normalizer.clone();
            move |event: &FeedEvent| {
                normalizer.on_paired_device(&event.message);
            }
        };
        let on_status = move |event: &FeedEvent| {
            normalizer.on_status_change(&event.message);
        };

        let (events, control) = EventManager::builder(transport)
            .feed(Feed::PairedDevices, &config.paired_devices_path, PpsMode::Delta)
            .control(&config.control_path, PpsMode::Delta)
            .feed(Feed::Status, &config.status_path, PpsMode::Delta)
            .on_first_read(Feed::PairedDevices, on_pairing)
            .on_new_data(Feed::PairedDevices, on_pairing_update)
            .on_new_data(Feed::Status, on_status)
            .start_with_control()?;

        tracing::info!(
            "Bluetooth bridge initialized (paired={}, control={}, status={})",
            config.paired_devices_path,
            config.control_path,
            config.status_path
        );

        Ok(Self {
            cache,
            control,
            events,
            config,
        })
    }

    /// Ask the Bluetooth manager to connect `service` on device `mac`
    ///
    /// `"ALL"` connects every service the device supports. Returns once the
    /// command has been written; the outcome is reported by the Bluetooth
    /// manager on its own objects.
    pub fn connect_service(&self, service: &str, mac: &str) -> Result<(), BluetoothError> {
        let command = ControlCommand::connect(service, mac)?;
        self.send(&command)
    }

    /// Write a prepared command to the control object
    pub fn send(&self, command: &ControlCommand) -> Result<(), BluetoothError> {
        tracing::debug!("Sending {} for {}", command.name(), command.mac());
        self.control.write(&command.to_attributes())?;
        Ok(())
    }

    /// Snapshot of every currently paired device
    pub fn get_paired(&self) -> HashMap<MacAddress, PairedDevice> {
        self.cache.snapshot()
    }

    pub fn paired_device(&self, mac: &str) -> Option<PairedDevice> {
        self.cache.get(mac)
    }

    /// Blocking iterator over cache changes made after this call
    pub fn iter(&self) -> ChangeIterator {
        self.cache.iter()
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// Number of feed events processed so far, including dropped ones
    pub fn delivered_count(&self) -> u64 {
        self.events.delivered_count()
    }

    pub fn config(&self) -> &BluetoothConfig {
        &self.config
    }

    /// Stop processing feed events; the cache keeps its last state
    pub fn shutdown(&mut self) {
        self.events.shutdown();
    }
}

impl std::fmt::Debug for BluetoothSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BluetoothSystem")
            .field("config", &self.config)
            .field("paired", &self.cache.len())
            .finish()
    }
}

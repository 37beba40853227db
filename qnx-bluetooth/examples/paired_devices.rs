//! Print the paired devices, then follow changes for a while
//!
//! Run on a QNX target with the Bluetooth manager running:
//!
//! ```text
//! QNX_BT_LOG_MODE=development cargo run --example paired_devices
//! ```

use std::time::Duration;

use qnx_bluetooth::logging::init_logging_from_env;
use qnx_bluetooth::{BluetoothSystem, CacheEventKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging_from_env()?;

    let system = BluetoothSystem::open()?;
    let changes = system.iter();

    std::thread::sleep(Duration::from_millis(500));
    for device in system.get_paired().values() {
        println!(
            "{} {:<24} cod={} rssi={} paired={}",
            device.mac, device.name, device.class_of_device, device.signal_strength, device.paired
        );
    }

    println!("Waiting for pairing changes (30s idle timeout)...");
    for event in changes.timeout_iter(Duration::from_secs(30)) {
        match event.kind {
            CacheEventKind::Upserted => println!("+ {}", event.mac),
            CacheEventKind::Removed => println!("- {}", event.mac),
        }
    }

    Ok(())
}

//! BluetoothSystem over a directory mirroring the PPS tree

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use qnx_bluetooth::{BluetoothConfig, BluetoothError, BluetoothSystem, FsTransport};
use tempfile::TempDir;

const PAIRED_OBJECTS: &str = "\
@00:11:22:33:44:55
cod::0x5a020c
name::Phone
paired:b:true
rssi:n:-60
@66:77:88:99:AA:BB
cod::0x240404
name::Headset
paired:b:false
rssi::-72
";

fn write_object(root: &Path, path: &str, contents: &str) {
    let file = root.join(path.trim_start_matches('/'));
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, contents).unwrap();
}

fn mirror() -> (TempDir, BluetoothConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = BluetoothConfig::default();
    write_object(dir.path(), &config.paired_devices_path, PAIRED_OBJECTS);
    write_object(dir.path(), &config.status_path, "@status\n");
    (dir, config)
}

fn wait_for_delivered(system: &BluetoothSystem, count: u64) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while system.delivered_count() < count {
        assert!(Instant::now() < deadline, "timed out waiting for delivery");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_reads_paired_devices_from_mirror() {
    let (dir, config) = mirror();
    let system =
        BluetoothSystem::init(Arc::new(FsTransport::mirrored(dir.path())), config).unwrap();

    // two pairing objects plus the status object's initial state
    wait_for_delivered(&system, 3);

    let paired = system.get_paired();
    assert_eq!(paired.len(), 2);
    assert_eq!(paired["00:11:22:33:44:55"].signal_strength, "-60");
    assert!(!paired["66:77:88:99:AA:BB"].paired);
}

#[test]
fn test_bad_device_in_mirror_does_not_hide_good_one() {
    let dir = tempfile::tempdir().unwrap();
    let config = BluetoothConfig::default();
    write_object(
        dir.path(),
        &config.paired_devices_path,
        "@00:11:22:33:44:55\ncod::0x5a020c\nname::Phone\npaired:b:true\nrssi:n:-60\n\
         @66:77:88:99:AA:BB\ncod::0x240404\nname::Headset\npaired:n:1\nrssi:n:\n",
    );
    write_object(dir.path(), &config.status_path, "@status\n");

    let system =
        BluetoothSystem::init(Arc::new(FsTransport::mirrored(dir.path())), config).unwrap();
    wait_for_delivered(&system, 3);

    let paired = system.get_paired();
    assert_eq!(paired.len(), 1);
    assert!(paired.contains_key("00:11:22:33:44:55"));
}

#[test]
fn test_commands_are_appended_to_control_object() {
    let (dir, config) = mirror();
    let control = dir.path().join(config.control_path.trim_start_matches('/'));
    let system =
        BluetoothSystem::init(Arc::new(FsTransport::mirrored(dir.path())), config).unwrap();

    system.connect_service("ALL", "00:11:22:33:44:55").unwrap();
    system.connect_service("OBEX", "00:11:22:33:44:55").unwrap();

    let written = fs::read_to_string(control).unwrap();
    assert_eq!(
        written,
        "command::connect_all\ndata::00:11:22:33:44:55\n\
         command::connect_service\ndata::00:11:22:33:44:55\ndata2::OBEX\n"
    );
}

#[test]
fn test_missing_feed_fails_init() {
    let dir = tempfile::tempdir().unwrap();
    let config = BluetoothConfig::default();

    let err = BluetoothSystem::init(Arc::new(FsTransport::mirrored(dir.path())), config)
        .unwrap_err();

    assert!(matches!(err, BluetoothError::EventManager(_)));
}

//! Filesystem transport tests against a mirrored `/pps` tree.

use std::fs;

use pps_client::{Attributes, FileMode, FsTransport, PpsError, PpsMode, PpsTransport, PpsValue};

const PAIRED: &str = "/pps/services/bluetooth/paired_devices/.all";
const CONTROL: &str = "/pps/services/bluetooth/control";

#[test]
fn test_mirrored_read_returns_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let object = dir.path().join("pps/services/bluetooth/paired_devices/.all");
    fs::create_dir_all(object.parent().unwrap()).unwrap();
    fs::write(
        &object,
        "@00:11:22:33:44:55\ncod::0x5a020c\r\nname::Phone\npaired:b:true\nrssi::-60\n\
         @66:77:88:99:AA:BB\ncod::0x240404\nname::Headset\npaired:b:false\nrssi::-71\n",
    )
    .unwrap();

    let transport = FsTransport::mirrored(dir.path());
    let mut handle = transport
        .open(PAIRED, PpsMode::Delta, FileMode::ReadOnly)
        .unwrap();
    assert_eq!(handle.path(), PAIRED);

    let messages = handle.read().unwrap().expect("first read has data");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].object, "00:11:22:33:44:55");
    assert_eq!(messages[1].get("paired"), Some(&PpsValue::Bool(false)));

    assert!(handle.read().unwrap().is_none());
}

#[test]
fn test_mirrored_writes_append_and_create_parents() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FsTransport::mirrored(dir.path());
    let mut handle = transport
        .open(CONTROL, PpsMode::Delta, FileMode::WriteOnly)
        .unwrap();

    let mut first = Attributes::new();
    first.insert("command".into(), "connect_all".into());
    first.insert("data".into(), "00:11:22:33:44:55".into());
    handle.write(&first).unwrap();

    let mut second = Attributes::new();
    second.insert("command".into(), "connect_service".into());
    second.insert("data".into(), "00:11:22:33:44:55".into());
    second.insert("data2".into(), "OBEX".into());
    handle.write(&second).unwrap();

    let written = fs::read_to_string(dir.path().join("pps/services/bluetooth/control")).unwrap();
    assert_eq!(
        written,
        "command::connect_all\ndata::00:11:22:33:44:55\n\
         command::connect_service\ndata::00:11:22:33:44:55\ndata2::OBEX\n"
    );
}

#[test]
fn test_open_missing_object_fails() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FsTransport::mirrored(dir.path());

    let result = transport.open(PAIRED, PpsMode::Delta, FileMode::ReadOnly);
    match result {
        Err(PpsError::Open { path, .. }) => assert_eq!(path, PAIRED),
        Err(other) => panic!("expected PpsError::Open, got {:?}", other),
        Ok(_) => panic!("expected PpsError::Open, got a handle"),
    }
}

#[test]
fn test_access_mode_is_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let transport = FsTransport::mirrored(dir.path());
    let mut handle = transport
        .open(CONTROL, PpsMode::Delta, FileMode::WriteOnly)
        .unwrap();

    assert!(matches!(
        handle.read(),
        Err(PpsError::AccessDenied { operation: "reading", .. })
    ));
}

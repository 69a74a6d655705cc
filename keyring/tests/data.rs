//! Integration tests for the data channel

use embedded_io::{Read, Seek, SeekFrom, Write};
use keyring::{DeviceLifecycle, KeyringConfig, KeyringError, MemKeyring, Minor, SlotKey};

fn key(k: u32) -> SlotKey {
    SlotKey::new(k).unwrap()
}

fn module_with_slot(k: u32) -> MemKeyring {
    let module = MemKeyring::in_memory(KeyringConfig::default()).unwrap();
    module.control().add(k).unwrap();
    module
}

#[test]
fn test_write_then_read_roundtrip() {
    let module = module_with_slot(7);
    let file = module.open_slot(7).unwrap();

    let mut offset = 0;
    assert_eq!(file.write_at(b"hello", &mut offset).unwrap(), 5);
    assert_eq!(offset, 5);

    let mut out = [0u8; 5];
    let mut offset = 0;
    assert_eq!(file.read_at(&mut out, &mut offset).unwrap(), 5);
    assert_eq!(&out, b"hello");
    assert_eq!(offset, 5);
}

#[test]
fn test_new_slot_reads_zeros() {
    let module = module_with_slot(1);
    let file = module.open_slot(1).unwrap();

    let mut out = [0xaau8; 32];
    assert_eq!(file.read_at(&mut out, &mut 0).unwrap(), 32);
    assert_eq!(out, [0u8; 32]);
}

#[test]
fn test_write_clamped_at_buffer_end() {
    let module = module_with_slot(2);
    let file = module.open_slot(2).unwrap();

    let mut offset = 28;
    assert_eq!(file.write_at(b"abcdefgh", &mut offset).unwrap(), 4);
    assert_eq!(offset, 32);

    // At the end: nothing more fits, and that is not an error
    assert_eq!(file.write_at(b"x", &mut offset).unwrap(), 0);
    assert_eq!(offset, 32);

    let mut out = [0u8; 16];
    let mut offset = 28;
    assert_eq!(file.read_at(&mut out, &mut offset).unwrap(), 4);
    assert_eq!(&out[..4], b"abcd");
}

#[test]
fn test_offset_past_end_transfers_nothing() {
    let module = module_with_slot(3);
    let file = module.open_slot(3).unwrap();

    let mut out = [0u8; 4];
    let mut offset = 100;
    assert_eq!(file.read_at(&mut out, &mut offset).unwrap(), 0);
    assert_eq!(file.write_at(b"data", &mut offset).unwrap(), 0);
    assert_eq!(offset, 100);
}

#[test]
fn test_read_in_chunks_until_end() {
    let module = module_with_slot(4);
    let file = module.open_slot(4).unwrap();
    file.write_at(b"0123456789abcdef0123456789ABCDEF", &mut 0)
        .unwrap();

    let mut offset = 0;
    let mut collected = Vec::new();
    let mut chunk = [0u8; 10];
    loop {
        let n = file.read_at(&mut chunk, &mut offset).unwrap();
        if n == 0 {
            break;
        }
        collected.extend_from_slice(&chunk[..n]);
    }
    assert_eq!(collected, b"0123456789abcdef0123456789ABCDEF");
}

#[test]
fn test_access_after_delete_fails() {
    let module = module_with_slot(7);
    let file = module.open_slot(7).unwrap();
    file.write_at(b"hello", &mut 0).unwrap();

    module.control().delete(7).unwrap();

    let mut out = [0u8; 5];
    assert_eq!(
        file.read_at(&mut out, &mut 0),
        Err(KeyringError::NotFound(key(7)))
    );
    assert_eq!(
        file.write_at(b"x", &mut 0),
        Err(KeyringError::NotFound(key(7)))
    );
    assert_eq!(out, [0u8; 5]);
    assert_eq!(file.read_raw(&mut out, &mut 0), -2);
}

#[test]
fn test_old_file_does_not_reach_recreated_slot() {
    let module = module_with_slot(7);
    let old = module.open_slot(7).unwrap();

    module.control().delete(7).unwrap();
    module.control().add(7).unwrap();

    // The new node has a new minor; the old file stays dead
    assert!(old.write_at(b"stale", &mut 0).is_err());

    let new = module.open_slot(7).unwrap();
    assert_ne!(old.minor(), new.minor());
    let mut out = [0u8; 5];
    new.read_at(&mut out, &mut 0).unwrap();
    assert_eq!(out, [0u8; 5]);
}

#[test]
fn test_open_missing_slot() {
    let module = module_with_slot(1);
    assert_eq!(
        module.open_slot(2).unwrap_err(),
        KeyringError::NotFound(key(2))
    );
    assert!(matches!(
        module.open(Minor::new(999)),
        Err(KeyringError::InvalidArgument(_))
    ));
    assert!(matches!(
        module.open_slot(0),
        Err(KeyringError::InvalidArgument(_))
    ));
}

#[test]
fn test_open_binds_identity() {
    let module = module_with_slot(12);
    let minor = module.devices().node(key(12)).unwrap().minor;
    let file = module.open(minor).unwrap();
    assert_eq!(file.key(), Some(key(12)));
}

#[test]
fn test_controller_has_no_data_path() {
    let module = module_with_slot(1);
    let ctl = module.open_control().unwrap();

    let mut out = [0u8; 4];
    assert!(matches!(
        ctl.read_at(&mut out, &mut 0),
        Err(KeyringError::InvalidArgument(_))
    ));
    assert!(ctl.write_at(b"x", &mut 0).is_err());
}

#[test]
fn test_stream_interface() {
    let module = module_with_slot(9);
    let mut file = module.open_slot(9).unwrap();

    file.write_all(b"stream").unwrap();
    assert_eq!(file.pos(), 6);

    assert_eq!(file.seek(SeekFrom::Current(-6)).unwrap(), 0);
    let mut out = [0u8; 6];
    file.read_exact(&mut out).unwrap();
    assert_eq!(&out, b"stream");

    assert_eq!(file.seek(SeekFrom::End(-2)).unwrap(), 30);
    assert_eq!(file.write(b"xyz").unwrap(), 2);
    assert_eq!(file.read(&mut out).unwrap(), 0);

    assert!(file.seek(SeekFrom::Current(-100)).is_err());
    assert_eq!(file.pos(), 32);
}

#[test]
fn test_larger_buffer_from_config() {
    let config = KeyringConfig::from_json(r#"{"buf_size": 64}"#).unwrap();
    let module = MemKeyring::in_memory(config).unwrap();
    module.control().add(1).unwrap();
    let file = module.open_slot(1).unwrap();

    let data = [7u8; 80];
    assert_eq!(file.write_at(&data, &mut 0).unwrap(), 64);
}

//! Integration tests for the slot store

use keyring::{KeyringError, MemSlots, SlotBuffer, SlotKey, SlotStore};
use std::sync::Arc;

fn key(k: u32) -> SlotKey {
    SlotKey::new(k).unwrap()
}

#[test]
fn test_insert_find_remove() {
    let store = MemSlots::new();

    let buffer = SlotBuffer::zeroed(32).unwrap();
    buffer.write_at(0, b"hello world");
    store.insert(key(7), buffer).unwrap();

    // find returns a handle to the same region
    let found = store.find(key(7)).unwrap();
    assert_eq!(&found.lock()[..11], b"hello world");

    store.remove(key(7)).unwrap();
    assert!(store.find(key(7)).is_none());
}

#[test]
fn test_handle_outlives_removal() {
    let store = MemSlots::new();
    store.insert(key(1), SlotBuffer::zeroed(8).unwrap()).unwrap();

    let handle = store.find(key(1)).unwrap();
    store.remove(key(1)).unwrap();

    // The removed region is still intact for whoever holds a handle
    assert_eq!(handle.write_at(0, b"late"), 4);
    assert_eq!(&handle.lock()[..4], b"late");
    assert!(store.find(key(1)).is_none());
}

#[test]
fn test_remove_missing() {
    let store = MemSlots::new();
    let result = store.remove(key(3));
    match result {
        Err(KeyringError::NotFound(k)) => assert_eq!(k, key(3)),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_uniqueness_after_add_delete_sequence() {
    let store = MemSlots::new();

    for round in 0..3 {
        store.insert(key(5), SlotBuffer::zeroed(4).unwrap()).unwrap();
        assert!(store.insert(key(5), SlotBuffer::zeroed(4).unwrap()).is_err());
        assert_eq!(store.keys(), vec![key(5)], "round {round}");
        store.remove(key(5)).unwrap();
    }
    assert!(store.is_empty());
}

#[test]
fn test_drain_leaves_nothing() {
    let store = MemSlots::new();
    for k in 1..=10 {
        store.insert(key(k), SlotBuffer::zeroed(4).unwrap()).unwrap();
    }

    let drained = store.drain();
    assert_eq!(drained.len(), 10);
    assert!(store.is_empty());
    assert!(store.keys().is_empty());
    assert!(store.drain().is_empty());
}

#[test]
fn test_shared_store_through_arc() {
    let store = Arc::new(MemSlots::new());
    let shared: Arc<MemSlots> = Arc::clone(&store);

    SlotStore::insert(&shared, key(2), SlotBuffer::zeroed(4).unwrap()).unwrap();
    assert_eq!(store.len(), 1);
}

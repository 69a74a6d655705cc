//! Concurrent callers against one keyring

use keyring::{KeyringConfig, KeyringError, MemKeyring, SlotKey, SlotStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn shared_module() -> Arc<MemKeyring> {
    Arc::new(MemKeyring::in_memory(KeyringConfig::default()).unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_key_writers_do_not_mix() {
    init_tracing();
    let module = shared_module();
    const WRITERS: u32 = 16;

    let mut tasks = Vec::new();
    for k in 1..=WRITERS {
        let module = Arc::clone(&module);
        tasks.push(tokio::task::spawn_blocking(move || {
            module.control().add(k).unwrap();
            let file = module.open_slot(k).unwrap();
            let pattern = [u8::try_from(k).unwrap(); 32];
            for _ in 0..100 {
                assert_eq!(file.write_at(&pattern, &mut 0).unwrap(), 32);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for k in 1..=WRITERS {
        let buffer = module.store().find(SlotKey::new(k).unwrap()).unwrap();
        let expected = u8::try_from(k).unwrap();
        assert!(
            buffer.lock().iter().all(|b| *b == expected),
            "slot {k} was written by someone else"
        );
    }
}

#[test]
fn test_readers_see_whole_writes() {
    init_tracing();
    let module = shared_module();
    module.control().add(1).unwrap();
    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let writer = scope.spawn(|| {
            let file = module.open_slot(1).unwrap();
            for round in 0..2000u32 {
                let fill = if round % 2 == 0 { b'a' } else { b'b' };
                file.write_at(&[fill; 32], &mut 0).unwrap();
            }
            stop.store(true, Ordering::SeqCst);
        });

        for _ in 0..3 {
            scope.spawn(|| {
                let file = module.open_slot(1).unwrap();
                let mut out = [0u8; 32];
                while !stop.load(Ordering::SeqCst) {
                    assert_eq!(file.read_at(&mut out, &mut 0).unwrap(), 32);
                    let first = out[0];
                    assert!(
                        out.iter().all(|b| *b == first),
                        "torn read: {out:?}"
                    );
                }
            });
        }

        writer.join().unwrap();
    });
}

#[test]
fn test_delete_races_with_io() {
    init_tracing();
    let module = shared_module();
    let key = SlotKey::new(3).unwrap();

    for _ in 0..50 {
        module.control().add(3).unwrap();

        std::thread::scope(|scope| {
            let io = scope.spawn(|| {
                let Ok(file) = module.open_slot(3) else {
                    return;
                };
                let mut out = [0u8; 32];
                for _ in 0..200 {
                    match file.write_at(b"racing", &mut 0) {
                        Ok(n) => assert_eq!(n, 6),
                        Err(e) => {
                            assert_eq!(e, KeyringError::NotFound(key));
                            // Once gone, the slot stays gone for this file
                            assert!(file.read_at(&mut out, &mut 0).is_err());
                            return;
                        }
                    }
                }
            });
            scope.spawn(|| module.control().delete(3).unwrap());
            io.join().unwrap();
        });

        assert!(module.store().find(key).is_none());
    }
}

#[test]
fn test_concurrent_adds_of_one_key() {
    init_tracing();
    let module = shared_module();

    let successes: usize = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| module.control().add(42).is_ok()))
            .collect();
        handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum()
    });

    assert_eq!(successes, 1);
    assert_eq!(module.store().len(), 1);
}

//! Keyring demo
//!
//! Loads the module, adds a slot per line of input (`<key> <text>`), writes
//! the text into it through the slot device, reads everything back and
//! unloads the module. Set `RUST_LOG=debug` to see the kernel-side log.

use embedded_io::{Read, Write};
use keyring::{KeyringConfig, MemKeyring, KEYRING_IOCTL_ADD, KEYRING_IOCTL_SHOW};
use std::io::{self, BufRead};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let module = MemKeyring::in_memory(KeyringConfig::default())?;
    let ctl = module.open_control()?;

    println!("Enter `<key> <text>` lines (empty line to quit):");
    let stdin = io::stdin();
    let mut keys = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }

        let (key, text) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let Ok(key) = key.parse::<u32>() else {
            eprintln!("Not a key: {key}");
            continue;
        };

        let ret = ctl.ioctl_raw(KEYRING_IOCTL_ADD, Some(&key.to_ne_bytes()));
        if ret < 0 {
            eprintln!("Failed to add keyring{key}: {ret}");
            continue;
        }

        let mut file = module.open_slot(key)?;
        let n = file.write(text.as_bytes())?;
        println!("keyring{key}: wrote {n} of {} bytes", text.len());
        keys.push(key);
    }

    ctl.ioctl_raw(KEYRING_IOCTL_SHOW, None);

    for key in keys {
        let mut file = module.open_slot(key)?;
        let mut buf = vec![0u8; module.config().buf_size];
        let n = file.read(&mut buf)?;
        let end = buf[..n].iter().position(|b| *b == 0).unwrap_or(n);
        println!("keyring{key}: {}", String::from_utf8_lossy(&buf[..end]));
    }

    drop(ctl);
    let report = module.exit();
    println!("Unloaded, {} slots released", report.slots.len());
    Ok(())
}

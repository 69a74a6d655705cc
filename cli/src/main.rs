//! Interactive shell over an in-process keyring and syscall table
//!
//! Every input line is one command line, e.g. `keyadd 7` or
//! `push-into-stack 5`. The keyring configuration is read from the JSON file
//! named by `KEYRING_CONFIG`, defaults otherwise.

use keyring::KeyringConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

fn load_config() -> Result<KeyringConfig, Box<dyn std::error::Error>> {
    match std::env::var_os("KEYRING_CONFIG") {
        Some(path) => {
            let file = std::fs::File::open(&path)?;
            Ok(KeyringConfig::from_reader(std::io::BufReader::new(file))?)
        }
        None => Ok(KeyringConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let kernel = cli::Kernel::load(load_config()?)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let argv: Vec<&str> = line.split_whitespace().collect();
        if argv.is_empty() {
            continue;
        }
        let mut out = Vec::new();
        let status = cli::run(&kernel, &argv, &mut out)?;
        if status != 0 {
            warn!(command = argv[0], status, "command failed");
        }
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    let report = kernel.unload();
    info!(slots = report.slots.len(), "shell finished");
    Ok(())
}

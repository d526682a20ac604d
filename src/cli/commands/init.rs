//! Init command handler

use std::fmt::Write as _;
use std::path::Path;

use rand::Rng;

use crate::config::Config;

/// Writes a default config with a freshly generated token secret.
/// Returns `false` when a file already exists at `path`.
pub fn cmd_init(path: &Path) -> anyhow::Result<bool> {
    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(false);
    }

    let mut config = Config::default();
    config.token.secret_key = generate_secret();
    config.save_to_path(path)?;

    println!("✓ Config file created at {}", path.display());
    println!("  Edit it, then run: ptcao-portal serve");
    Ok(true)
}

fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

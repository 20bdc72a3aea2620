//! Cross-platform data directory resolution.
//!
//! The catalog and uploaded photos live in one data directory, chosen through
//! a fallback chain so the binary works under restricted home directories.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "repertoire";

/// Get the data directory with cross-platform fallback chain.
///
/// Priority order:
/// 1. Explicit override (config `storage.data_dir_override`)
/// 2. Home directory (~/.repertoire)
/// 3. Platform-specific data directory (XDG on Linux, AppData on Windows)
/// 4. Current working directory (last resort)
///
/// Each directory is validated for write access before being selected.
pub fn get_data_dir(override_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        ensure_writable(dir)?;
        return Ok(dir.clone());
    }

    if let Some(home) = home::home_dir() {
        let dir = home.join(format!(".{}", APP_DIR));
        if ensure_writable(&dir).is_ok() {
            return Ok(dir);
        }
        tracing::warn!(
            "Cannot write to {}. Trying fallback locations.",
            dir.display()
        );
    }

    // - Linux: ~/.local/share/repertoire
    // - macOS: ~/Library/Application Support/repertoire
    // - Windows: C:\Users\<User>\AppData\Local\repertoire
    if let Some(data) = dirs::data_local_dir() {
        let dir = data.join(APP_DIR);
        if ensure_writable(&dir).is_ok() {
            return Ok(dir);
        }
    }

    let dir = PathBuf::from(format!(".{}", APP_DIR));
    ensure_writable(&dir).context(
        "Cannot create data directory in any location. \
         Check file permissions or set storage.data_dir_override in config.",
    )?;
    Ok(dir)
}

/// Ensure a directory exists and is writable by the current user.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let test_path = dir.join(".write_test");
    fs::write(&test_path, b"test")
        .with_context(|| format!("Directory {} is not writable", dir.display()))?;

    // Ignore cleanup errors (file might be held by antivirus on Windows)
    let _ = fs::remove_file(&test_path);

    Ok(())
}

/// Config file location: `~/.repertoire/config.toml`
pub fn config_path() -> Result<PathBuf> {
    let home = home::home_dir().context("Could not find home directory")?;
    Ok(home.join(format!(".{}", APP_DIR)).join("config.toml"))
}

/// Directory holding uploaded photos, inside the data directory
pub fn photos_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("media")
}

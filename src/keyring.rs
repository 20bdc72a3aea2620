//! Remote API tokens in the system keyring.
//!
//! Each remote instance gets its own entry, keyed by its base URL, so logging
//! in to a second instance never replaces the token of the first.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE: &str = "repertoire-remote-api";

/// Keyring account for a remote instance: its base URL without trailing `/`
pub fn account_for(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

fn entry(url: &str) -> Result<Entry> {
    Entry::new(SERVICE, account_for(url))
        .with_context(|| format!("Failed to open keyring entry for {}", account_for(url)))
}

pub fn store_remote_token(url: &str, token: &str) -> Result<()> {
    entry(url)?
        .set_password(token)
        .context("Failed to store remote token in keyring")
}

/// `None` when no token was stored for this instance
pub fn get_remote_token(url: &str) -> Result<Option<String>> {
    match entry(url)?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(e).context("Failed to read remote token from keyring"),
    }
}

/// Returns whether a token was stored
pub fn delete_remote_token(url: &str) -> Result<bool> {
    match entry(url)?.delete_credential() {
        Ok(()) => Ok(true),
        Err(keyring::Error::NoEntry) => Ok(false),
        Err(e) => Err(e).context("Failed to delete remote token from keyring"),
    }
}

use crate::config::Config;
use anyhow::{Context, Result};

/// Prints the effective configuration as TOML. Tokens are masked.
pub fn list(config: &Config) -> Result<()> {
    let toml_str = toml::to_string_pretty(&masked(config)).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

/// Prints one value by dotted key, e.g. `server.port`
pub fn get(key: &str, config: &Config) -> Result<()> {
    let value = serde_json::to_value(masked(config)).context("Failed to serialize config")?;

    let mut current = &value;
    for part in key.split('.') {
        current = current
            .get(part)
            .with_context(|| format!("Key not found: {}", key))?;
    }

    match current {
        serde_json::Value::String(s) => println!("{}", s),
        serde_json::Value::Null => println!("(not set)"),
        v => println!("{}", v),
    }

    Ok(())
}

fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    for token in [&mut config.api.token, &mut config.remote.token] {
        if token.is_some() {
            *token = Some("********".to_string());
        }
    }
    config
}

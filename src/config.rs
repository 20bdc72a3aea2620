use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body, photos included
    #[serde(default = "default_upload_limit")]
    pub upload_limit_mb: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_upload_limit() -> usize {
    10
}

pub const MAX_UPLOAD_LIMIT_MB: usize = 1024;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_limit_mb: default_upload_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct StorageConfig {
    /// Optional override for the data directory (for testing)
    pub data_dir_override: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    /// Token expected in `Authorization: Token <key>`. The API rejects every
    /// request while unset.
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_url")]
    pub url: String,
    pub token: Option<String>,
    #[serde(default = "default_use_keyring")]
    pub use_keyring: bool,
}

fn default_remote_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_use_keyring() -> bool {
    true
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_remote_url(),
            token: None,
            use_keyring: default_use_keyring(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("Server host must not be empty");
        }
        if self.upload_limit_mb == 0 {
            anyhow::bail!("Upload limit must be greater than 0");
        }
        if self.upload_limit_mb > MAX_UPLOAD_LIMIT_MB {
            anyhow::bail!(
                "Upload limit must be at most {} MB (got {})",
                MAX_UPLOAD_LIMIT_MB,
                self.upload_limit_mb
            );
        }
        Ok(())
    }

    pub fn upload_limit_bytes(&self) -> usize {
        self.upload_limit_mb.saturating_mul(1024 * 1024)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(token) = &self.token {
            validate_token(token).context("Invalid api.token")?;
        }
        Ok(())
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            anyhow::bail!(
                "Invalid remote url '{}', expected http:// or https://",
                self.url
            );
        }
        if let Some(token) = &self.token {
            validate_token(token).context("Invalid remote.token")?;
        }
        Ok(())
    }
}

fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }
    if token.chars().any(char::is_whitespace) {
        anyhow::bail!("Token must not contain whitespace");
    }
    Ok(())
}

impl Config {
    /// Get the remote API token from keyring or config
    pub fn get_remote_token(&self) -> Result<String> {
        if self.remote.use_keyring {
            match crate::keyring::get_remote_token(&self.remote.url) {
                Ok(Some(token)) => return Ok(token),
                Ok(None) => {}
                Err(e) => tracing::warn!("Keyring unavailable, using config token: {:#}", e),
            }
        }

        if let Some(token) = &self.remote.token {
            return Ok(token.clone());
        }

        anyhow::bail!(
            "Remote API token not found. Run 'repertoire remote login --token <TOKEN>' to configure"
        )
    }

    /// Validate all configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.api.validate()?;
        self.remote.validate()?;
        Ok(())
    }

    /// Move a plain-text remote token into the keyring
    pub fn migrate_credentials(&mut self) -> Result<bool> {
        if !self.remote.use_keyring {
            return Ok(false);
        }

        let mut migrated = false;

        if let Some(token) = &self.remote.token {
            crate::keyring::store_remote_token(&self.remote.url, token)
                .context("Failed to store remote token in keyring")?;

            self.remote.token = None;
            migrated = true;
        }

        Ok(migrated)
    }
}

/// Reads `path` as TOML, then applies `REPERTOIRE_<SECTION>__<KEY>` overrides.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    build(Some(path.as_ref()))
}

fn build(path: Option<&Path>) -> Result<Config> {
    let mut builder = ConfigBuilder::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    let loader = builder
        .add_source(
            Environment::with_prefix("REPERTOIRE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build config loader")?;

    loader
        .try_deserialize()
        .context("Failed to parse config file")
}

/// Loads `~/.repertoire/config.toml`; a missing file means defaults plus
/// environment overrides.
pub fn load() -> Result<Config> {
    let config_path = crate::platform::config_path()?;

    let mut config = if config_path.exists() {
        load_from_path(&config_path)?
    } else {
        tracing::debug!("No config file at {}, using defaults", config_path.display());
        build(None)?
    };

    config.validate()?;

    if config.migrate_credentials()? {
        println!("Migrated remote token to secure storage.");
        save_to_path(&config, &config_path)?;
    }

    Ok(config)
}

pub fn save_to_path<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let toml_string = toml::to_string_pretty(config).context("Failed to serialize config")?;

    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    std::fs::write(path.as_ref(), toml_string).context("Failed to write config file")?;

    Ok(())
}

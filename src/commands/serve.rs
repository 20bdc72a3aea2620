use crate::config::Config;
use anyhow::{Context, Result};

/// Runs the web interface and REST API until interrupted
pub fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = config.clone();
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.server.validate()?;

    tokio::runtime::Runtime::new()
        .context("Failed to start async runtime")?
        .block_on(crate::http::start(&config))
}

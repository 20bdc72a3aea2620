pub mod client;
pub mod commands;
pub mod config;
pub mod http;
pub mod keyring;
pub mod photos;
pub mod platform;
pub mod repertoire;
pub mod store;
pub mod utils;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, ValueEnum, Debug, Default, Serialize)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

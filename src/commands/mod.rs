pub mod config;
pub mod items;
pub mod remote;
pub mod serve;

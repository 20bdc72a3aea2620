pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod pages;
pub mod server;
pub mod state;
pub mod types;

pub use server::{make_router, start};
pub use state::HttpState;

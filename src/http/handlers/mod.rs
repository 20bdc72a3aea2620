pub mod api;
pub mod photos;
pub mod web;

use crate::http::error::HttpError;

pub async fn handle_not_found() -> HttpError {
    HttpError::not_found()
}

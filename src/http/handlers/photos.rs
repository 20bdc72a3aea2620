use crate::http::error::{HttpError, HttpResult};
use crate::http::state::HttpState;
use crate::photos;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

const NO_PHOTO: &str = "Item has no photo.";

/// Serves the photo attached to an item, looked up by file name
pub async fn handle_get_photo(
    State(state): State<HttpState>,
    Path(file): Path<String>,
) -> HttpResult<Response> {
    let name = photos::storage_name(&file);

    let bytes = state
        .blocking(move |state| {
            if state.store.find_by_photo(&name)?.is_none() {
                return Ok(None);
            }
            state.photos.open(&name)
        })
        .await?
        .ok_or_else(|| HttpError::NotFound(NO_PHOTO.to_string()))?;

    let mime = mime_guess::from_path(&file).first_or_octet_stream();

    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}

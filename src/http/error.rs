use crate::repertoire::models::FieldErrors;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("{0}")]
    NotFound(String),

    /// Per-field messages, sent back as the response body
    #[error("{0}")]
    Validation(#[from] FieldErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl HttpError {
    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, Json(ErrorMessage { detail })).into_response()
            }
            HttpError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            HttpError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, Json(ErrorMessage { detail })).into_response()
            }
            HttpError::Internal(e) => {
                tracing::error!("{:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorMessage {
                        detail: "Internal server error.".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    pub detail: String,
}

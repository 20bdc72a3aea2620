use crate::http::error::ErrorMessage;
use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Expected API token; `None` rejects every request
#[derive(Clone, Debug, Default)]
pub struct ApiToken(Option<Arc<str>>);

impl ApiToken {
    pub fn new(token: Option<String>) -> Self {
        Self(token.map(Arc::from))
    }

    fn accepts(&self, candidate: &str) -> bool {
        match &self.0 {
            Some(expected) => candidate.as_bytes().ct_eq(expected.as_bytes()).into(),
            None => false,
        }
    }
}

// `Authorization: Token <key>`
pub async fn verify_token(State(expected): State<ApiToken>, req: Request, next: Next) -> Response {
    let verdict = match req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_token)
    {
        None => Err("Authentication credentials were not provided."),
        Some(token) if expected.accepts(token) => Ok(()),
        Some(_) => Err("Invalid token."),
    };

    match verdict {
        Ok(()) => next.run(req).await,
        Err(detail) => unauthorized(detail),
    }
}

fn parse_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("Token") && !token.is_empty()).then_some(token)
}

fn unauthorized(detail: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Token")],
        Json(ErrorMessage {
            detail: detail.to_string(),
        }),
    )
        .into_response()
}

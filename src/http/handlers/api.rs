use crate::http::error::{HttpError, HttpResult};
use crate::http::state::HttpState;
use crate::http::types::{ApiItem, ItemPayload};
use crate::repertoire::models::ListFilter;
use crate::store::UpdateOutcome;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};

pub async fn handle_list_items(
    State(state): State<HttpState>,
    Query(filter): Query<ListFilter>,
) -> HttpResult<Json<Vec<ApiItem>>> {
    let items = state
        .blocking(move |state| state.store.list(&filter))
        .await?;

    Ok(Json(items.into_iter().map(ApiItem::from).collect()))
}

pub async fn handle_get_item(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
) -> HttpResult<Json<ApiItem>> {
    let item = state
        .blocking(move |state| state.store.get(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    Ok(Json(item.into()))
}

/// `PUT`: name, date, rating and review are required
pub async fn handle_replace_item(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> HttpResult<Json<ApiItem>> {
    update_item(state, id, payload, false).await
}

/// `PATCH`: only the fields present change
pub async fn handle_update_item(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
    payload: Result<Json<ItemPayload>, JsonRejection>,
) -> HttpResult<Json<ApiItem>> {
    update_item(state, id, payload, true).await
}

pub async fn handle_delete_item(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
) -> HttpResult<StatusCode> {
    let removed = state
        .blocking(move |state| state.delete_item(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    tracing::info!("Deleted item {} ({}) via API", removed.id, removed.name);
    Ok(StatusCode::NO_CONTENT)
}

async fn update_item(
    state: HttpState,
    id: u64,
    payload: Result<Json<ItemPayload>, JsonRejection>,
    partial: bool,
) -> HttpResult<Json<ApiItem>> {
    let Json(payload) = payload.map_err(|e| HttpError::BadRequest(e.body_text()))?;

    let patch = payload.into_patch(partial)?;

    let outcome = state
        .blocking(move |state| {
            state.store.update(id, |draft| {
                patch.apply(draft);
                Ok(())
            })
        })
        .await?;

    let item = match outcome {
        UpdateOutcome::Updated { item, .. } => item,
        UpdateOutcome::Invalid(errors) => return Err(errors.into()),
        UpdateOutcome::NotFound => return Err(HttpError::not_found()),
    };

    tracing::info!("Updated item {} ({}) via API", item.id, item.name);
    Ok(Json(item.into()))
}

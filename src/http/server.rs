use crate::config::Config;
use crate::http::auth::{ApiToken, verify_token};
use crate::http::handlers::{api, handle_not_found, photos, web};
use crate::http::state::HttpState;
use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
};
use tower_http::trace::TraceLayer;

/// Web pages, photos and the token-protected REST API on one router
pub fn make_router(state: HttpState, config: &Config) -> Router {
    let api_router = Router::new()
        .route("/api/items", get(api::handle_list_items))
        .route(
            "/api/items/{id}",
            get(api::handle_get_item)
                .put(api::handle_replace_item)
                .patch(api::handle_update_item)
                .delete(api::handle_delete_item),
        )
        .route_layer(middleware::from_fn_with_state(
            ApiToken::new(config.api.token.clone()),
            verify_token,
        ));

    let web_router = Router::new()
        .route("/", get(web::handle_list_page))
        .route("/new", get(web::handle_new_page).post(web::handle_create))
        .route(
            "/edit/{id}",
            get(web::handle_edit_page).post(web::handle_update),
        )
        .route(
            "/delete/{id}",
            get(web::handle_delete_page).post(web::handle_delete),
        )
        .route("/photos/{file}", get(photos::handle_get_photo));

    web_router
        .merge(api_router)
        .fallback(handle_not_found)
        .layer(DefaultBodyLimit::max(config.server.upload_limit_bytes()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C
pub async fn start(config: &Config) -> anyhow::Result<()> {
    if config.api.token.is_none() {
        tracing::warn!("api.token is not set; every REST API request will be rejected");
    }

    let state = HttpState::from_config(config)?;
    let router = make_router(state, config);

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Http server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Http server failed")?;

    tracing::info!("Http server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

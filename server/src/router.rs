//! Router setup: route groups, fallback and transport layers.

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, OriginalUri, State};
use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::routes;
use crate::state::{blocking, AppState};

/// Creates the desk router.
pub fn desk_router(state: AppState) -> Router {
    let body_limit = state.config.body_limit_bytes;
    let cors = build_cors_layer(&state.config.allowed_origins);

    let router = Router::new()
        .route("/", get(root))
        .merge(routes::complaints::routes())
        .merge(routes::shipments::routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http());

    let router = match cors {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// Liveness: answers only once the store does.
async fn root(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let store = state.store.clone();
    blocking(move || store.ping()).await?;
    Ok(Json(json!({
        "message": "recovery desk is up",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

async fn not_found(uri: OriginalUri) -> ApiError {
    ApiError::RouteNotFound(uri.0.path().to_string())
}

/// `None` when no origins are configured: no CORS headers at all.
fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let mut allowed = Vec::new();
    for origin in origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => allowed.push(value),
            Err(_) => log::error!("Invalid CORS origin {origin:?}; skipping"),
        }
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
            .max_age(Duration::from_secs(600)),
    )
}

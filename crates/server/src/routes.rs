//! HTTP routes: cover lookup and health.

use std::path::Path as FsPath;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use bytes::Bytes;
use lectio_client::{CoverRequest, epub};
use lectio_core::{AppConfig, CoverStatsSnapshot};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::paths::resolve_in_library;
use crate::rate_limit;
use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/cover/*path", get(cover))
        .route_layer(middleware::from_fn_with_state(state.rate_limiter.clone(), rate_limit::enforce));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origin. Without one, no cross-origin access is granted.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => {
            tracing::info!(origin = ?origin, "CORS enabled");
            cors.allow_origin(origin).allow_credentials(true)
        }
        Some(Err(e)) => {
            tracing::warn!("ignoring invalid CORS origin: {}", e);
            cors
        }
        None => cors,
    }
}

/// Optional metadata overrides for a cover request.
#[derive(Debug, Default, Deserialize)]
pub struct CoverQuery {
    pub title: Option<String>,
    pub author: Option<String>,
}

async fn cover(
    State(state): State<AppState>, Path(path): Path<String>, Query(query): Query<CoverQuery>,
) -> Result<Response, ApiError> {
    let file_path = resolve_in_library(&state.config.library_dir, &path)?;

    let file_bytes = match tokio::fs::read(&file_path).await {
        Ok(bytes) => Bytes::from(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => return Err(ApiError::Io(e)),
    };

    let (title, author) = describe(&file_path, &file_bytes, query).await;
    let image = state.covers.cover_for(CoverRequest { file_bytes, title, author }).await;

    let headers = [(header::CONTENT_TYPE, image.content_type), (header::CACHE_CONTROL, image.cache_control())];
    Ok((headers, image.bytes).into_response())
}

/// Title and author for the lookup: query parameters first, then the
/// package metadata, then the file stem for the title.
async fn describe(file_path: &FsPath, file_bytes: &Bytes, query: CoverQuery) -> (String, Option<String>) {
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
    let title = non_empty(query.title);
    let author = non_empty(query.author);

    if let Some(title) = title {
        return (title, author);
    }

    let bytes = file_bytes.clone();
    let metadata = tokio::task::spawn_blocking(move || epub::read_metadata(&bytes)).await;
    let (meta_title, meta_author) = match metadata {
        Ok(Ok(meta)) => (non_empty(meta.title), non_empty(meta.author)),
        Ok(Err(e)) => {
            tracing::debug!(path = %file_path.display(), "no package metadata: {}", e);
            (None, None)
        }
        Err(e) => {
            tracing::warn!("metadata task failed: {}", e);
            (None, None)
        }
    };

    let title = meta_title.unwrap_or_else(|| {
        file_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    });

    (title, author.or(meta_author))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub covers: CoverStatsSnapshot,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        covers: state.covers.stats(),
    })
}

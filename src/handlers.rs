use crate::config::Config;
use crate::errors::{AppError, SERVER_ERROR_MESSAGE};
use crate::models::{CanonicalProfile, PlayerQueryParams};
use crate::providers::ProviderClient;
use crate::reconciler::{normalize_region, Reconciler, Reconciliation};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower_http::services::ServeDir;

/// Version reported by the health probe.
pub const SERVICE_VERSION: &str = "2.0.0";

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Upstream provider client.
    pub providers: ProviderClient,
    /// Profile reconciler (carries the display offset for timestamps).
    pub reconciler: Reconciler,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let providers = ProviderClient::new(&config)?;
        let reconciler = config
            .display_utc_offset
            .map(Reconciler::new)
            .unwrap_or_else(Reconciler::with_local_offset);

        Ok(Self {
            config,
            providers,
            reconciler,
        })
    }
}

/// Health check endpoint.
///
/// Static liveness payload; never touches upstream providers.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "version": SERVICE_VERSION
        })),
    )
}

/// GET /api/player-info
///
/// Fetches both providers concurrently and returns the reconciled profile.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `params` - `uid` (required, numeric) and `region` (optional). A query
///   string that does not deserialize is answered like a missing uid.
///
/// # Returns
///
/// * `Result<Json<CanonicalProfile>, AppError>` - The profile, or a 400/404 error body.
pub async fn get_player_info(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PlayerQueryParams>, QueryRejection>,
) -> Result<Json<CanonicalProfile>, AppError> {
    let Query(params) = params.map_err(|rejection| {
        tracing::debug!("Unreadable query string: {}", rejection.body_text());
        invalid_uid()
    })?;
    let uid = validate_uid(params.uid.as_deref())?;
    let region = normalize_region(params.region.as_deref(), &state.config.default_region);

    tracing::info!("GET /api/player-info - uid: {}, region: {}", uid, region);

    let media = state.providers.media_links(uid, &region)?;
    let sources = state.providers.fetch_sources(uid, &region).await;

    match state.reconciler.reconcile(uid, &region, &sources, media) {
        Reconciliation::Found(profile) => {
            tracing::info!("✓ Profile reconciled for {} ({})", uid, region);
            Ok(Json(*profile))
        }
        Reconciliation::NotFound => Err(AppError::PlayerNotFound(
            "No data found for that UID. Please check the UID and region.".to_string(),
        )),
    }
}

/// Accepts a non-empty, all-digit identifier. The identifier is returned
/// exactly as received, so padded values are rejected rather than trimmed.
pub fn validate_uid(uid: Option<&str>) -> Result<&str, AppError> {
    let uid = uid.ok_or_else(invalid_uid)?;
    if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid_uid());
    }
    Ok(uid)
}

fn invalid_uid() -> AppError {
    AppError::InvalidUid("Please provide a valid UID".to_string())
}

/// Routes that query upstream providers. Kept separate so callers can wrap
/// them with rate limiting.
pub fn player_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/player-info", get(get_player_info))
}

/// Assembles the application router.
///
/// The health probe is never rate limited; anything not matched by an API
/// route is served from the static directory (`/` resolves to `index.html`).
pub fn app(state: Arc<AppState>, player_routes: Router<Arc<AppState>>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/api/health", get(health))
        .merge(player_routes)
        .fallback_service(static_files)
        .with_state(state)
}

/// Turns a handler panic into the generic `SERVER_ERROR` response.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!("Handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        json!({
            "error": SERVER_ERROR_MESSAGE,
            "code": "SERVER_ERROR"
        })
        .to_string(),
    )
        .into_response()
}

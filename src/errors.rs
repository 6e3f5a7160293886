use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Message shown to the browser for any unexpected failure.
pub const SERVER_ERROR_MESSAGE: &str = "Failed to fetch player info. Please try again later.";

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Subject identifier missing or not numeric.
    InvalidUid(String),
    /// No provider has a record for the requested player.
    PlayerNotFound(String),
    /// Error interacting with an upstream provider.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Stable machine-readable code sent in the `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidUid(_) => "INVALID_UID",
            AppError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            AppError::ExternalApiError(_) | AppError::InternalError(_) => "SERVER_ERROR",
            AppError::WithContext { source, .. } => source.code(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidUid(_) => StatusCode::BAD_REQUEST,
            AppError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalApiError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::WithContext { source, .. } => source.status(),
        }
    }

    /// Message safe to show to the user. Server-side detail is never exposed.
    pub fn public_message(&self) -> String {
        match self {
            AppError::InvalidUid(msg) | AppError::PlayerNotFound(msg) => msg.clone(),
            AppError::ExternalApiError(_) | AppError::InternalError(_) => {
                SERVER_ERROR_MESSAGE.to_string()
            }
            AppError::WithContext { source, .. } => source.public_message(),
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidUid(msg) => write!(f, "Invalid UID: {}", msg),
            AppError::PlayerNotFound(msg) => write!(f, "Player not found: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// The body is always `{"error": <message>, "code": <code>}`. Server-side
    /// failures are logged with full detail and answered with a generic message.
    fn into_response(self) -> Response {
        match &self {
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
            }
            AppError::WithContext { .. } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {}", self);
            }
            AppError::InvalidUid(msg) => tracing::debug!("Rejected request: {}", msg),
            AppError::PlayerNotFound(msg) => tracing::info!("Not found: {}", msg),
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": self.code(),
        }));

        (self.status(), body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            "Provider request timed out"
        } else if err.is_decode() {
            "Failed to parse provider response"
        } else {
            "Provider request failed"
        };
        AppError::ExternalApiError(format!("{}: {}", kind, err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why the OAuth token request to the gateway did not yield a usable token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("token endpoint returned {0}")]
    Rejected(u16),

    #[error("token response could not be parsed: {0}")]
    Malformed(String),

    #[error("token response carried no access_token")]
    MissingToken,

    #[error("token request timed out")]
    Timeout,

    #[error("token request failed: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Gateway authentication failed: {0}")]
    UpstreamAuth(AuthFailure),

    #[error("Gateway rejected request ({status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Gateway request timed out")]
    UpstreamTimeout,

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamAuth(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamRejected { .. } => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "Validation failed",
            AppError::UpstreamAuth(_) => "Gateway authentication failed",
            AppError::UpstreamRejected { .. } => "Gateway rejected request",
            AppError::UpstreamTimeout => "Gateway timeout",
            AppError::BadGateway(_) => "Bad gateway",
            AppError::ConfigurationError(_) => "Configuration error",
            AppError::Internal(_) => "Internal server error",
        }
    }

    /// Message shown to the caller. Internal details are only logged.
    fn detail(&self) -> String {
        match self {
            AppError::ValidationError(msg) => msg.clone(),
            AppError::UpstreamAuth(failure) => failure.to_string(),
            AppError::UpstreamRejected { message, .. } => message.clone(),
            AppError::UpstreamTimeout => "The payment gateway did not respond in time".to_string(),
            AppError::BadGateway(msg) => msg.clone(),
            AppError::ConfigurationError(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.label(),
            "detail": self.detail(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(format!("JSON parsing error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::UpstreamTimeout
        } else if err.is_connect() {
            AppError::BadGateway(format!("Connection failed: {}", err))
        } else if err.is_request() || err.is_body() || err.is_decode() {
            AppError::BadGateway(format!("HTTP request failed: {}", err))
        } else {
            AppError::Internal(format!("HTTP client error: {}", err))
        }
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn bad_gateway(msg: impl Into<String>) -> Self {
        AppError::BadGateway(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::ConfigurationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

//! Crate-level error type for Gatekeeper.
//!
//! This module provides:
//! - Stable, machine-readable error codes
//! - HTTP status code mapping for the request boundary
//! - User-facing messages kept apart from internal detail
//! - Error logging with tracing integration
//!
//! Engine operations return the narrower [`ConfigError`] and [`DenyError`];
//! both convert into [`GatekeeperError`] with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

use crate::rbac::{ConfigError, DenyError, DenyKind, PolicyLoadError};

// ═══════════════════════════════════════════════════════════════════════════════
// Result Type Alias
// ═══════════════════════════════════════════════════════════════════════════════

/// A specialized Result type for Gatekeeper operations.
pub type Result<T> = std::result::Result<T, GatekeeperError>;

// ═══════════════════════════════════════════════════════════════════════════════
// Error Codes
// ═══════════════════════════════════════════════════════════════════════════════

/// Machine-readable error codes.
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authorization (4000-4099)
    Unauthorized,
    Forbidden,
    InvalidRole,
    InvalidPermission,

    // Configuration (5000-5099)
    InvalidConfiguration,
    PolicyLoadFailed,
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub const fn numeric_code(&self) -> u32 {
        match self {
            Self::Unauthorized => 4000,
            Self::Forbidden => 4001,
            Self::InvalidRole => 4002,
            Self::InvalidPermission => 4003,

            Self::InvalidConfiguration => 5000,
            Self::PolicyLoadFailed => 5001,
        }
    }

    /// Get the HTTP status code for this error.
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::InvalidRole | Self::InvalidPermission => StatusCode::FORBIDDEN,
            Self::InvalidConfiguration | Self::PolicyLoadFailed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error category for grouping.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration | Self::PolicyLoadFailed => "configuration",
            _ => "authorization",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Main Error Type
// ═══════════════════════════════════════════════════════════════════════════════

/// The main error type for Gatekeeper.
#[derive(Error, Debug)]
pub struct GatekeeperError {
    /// Machine-readable error code
    code: ErrorCode,

    /// User-friendly error message (safe to expose to clients)
    user_message: Cow<'static, str>,

    /// Detailed internal message (for logging only)
    internal_message: Option<String>,

    /// The source error that caused this error
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl fmt::Display for GatekeeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.user_message)?;
        if let Some(ref internal) = self.internal_message {
            write!(f, " (internal: {})", internal)?;
        }
        Ok(())
    }
}

impl GatekeeperError {
    /// Create a new error with code and user message.
    pub fn new(code: ErrorCode, user_message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            user_message: user_message.into(),
            internal_message: None,
            source: None,
        }
    }

    /// Create an error with both user and internal messages.
    pub fn with_internal(
        code: ErrorCode,
        user_message: impl Into<Cow<'static, str>>,
        internal_message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(code, user_message);
        error.internal_message = Some(internal_message.into());
        error
    }

    /// Add a source error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Log this error; authorization failures are expected and logged at `warn`.
    pub fn log(&self) {
        let code = self.code.to_string();
        let status = self.http_status().as_u16();

        if self.code.category() == "authorization" {
            warn!(
                error_code = %code,
                http_status = status,
                internal_message = ?self.internal_message,
                "Request denied"
            );
        } else {
            error!(
                error_code = %code,
                category = self.code.category(),
                http_status = status,
                user_message = %self.user_message,
                internal_message = ?self.internal_message,
                source = ?self.source,
                "Gatekeeper error"
            );
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Conversions
// ═══════════════════════════════════════════════════════════════════════════════

impl From<DenyError> for GatekeeperError {
    fn from(error: DenyError) -> Self {
        let code = match error.kind() {
            DenyKind::NilSubject => ErrorCode::Unauthorized,
            DenyKind::InvalidRole => ErrorCode::InvalidRole,
            DenyKind::InvalidPermission => ErrorCode::InvalidPermission,
            DenyKind::Denied => ErrorCode::Forbidden,
        };
        Self::with_internal(code, error.public_message(), error.to_string()).with_source(error)
    }
}

impl From<ConfigError> for GatekeeperError {
    fn from(error: ConfigError) -> Self {
        Self::with_internal(
            ErrorCode::InvalidConfiguration,
            "Authorization policy is invalid",
            error.to_string(),
        )
        .with_source(error)
    }
}

impl From<PolicyLoadError> for GatekeeperError {
    fn from(error: PolicyLoadError) -> Self {
        Self::with_internal(
            ErrorCode::PolicyLoadFailed,
            "Authorization policy could not be loaded",
            error.to_string(),
        )
        .with_source(error)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API Response
// ═══════════════════════════════════════════════════════════════════════════════

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Whether the request was successful (always false for errors)
    pub success: bool,

    /// Error information
    pub error: ErrorInfo,
}

/// Error information for API responses. Never carries internal detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub numeric_code: u32,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl From<&GatekeeperError> for ErrorResponse {
    fn from(error: &GatekeeperError) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: error.code,
                numeric_code: error.code.numeric_code(),
                message: error.user_message.to_string(),
                timestamp: chrono::Utc::now(),
            },
        }
    }
}

impl IntoResponse for GatekeeperError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.http_status();
        let response = ErrorResponse::from(&self);

        (status, Json(response)).into_response()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

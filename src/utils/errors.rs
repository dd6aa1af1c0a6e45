//! Error handling for Rendezvous
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for Rendezvous application
#[derive(Error, Debug)]
pub enum RendezvousError {
    /// Referenced entity does not exist or is not visible to the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Business rule or lifecycle state violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input that slipped past transport-level validation
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stats service error: {0}")]
    Stats(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias for Rendezvous operations
pub type Result<T> = std::result::Result<T, RendezvousError>;

impl RendezvousError {
    pub fn not_found(message: impl Into<String>) -> Self {
        RendezvousError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RendezvousError::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        RendezvousError::Validation(message.into())
    }

    /// "Event with id=N was not found"
    pub fn event_not_found(event_id: i64) -> Self {
        Self::not_found(format!("Event with id={} was not found", event_id))
    }

    pub fn user_not_found(user_id: i64) -> Self {
        Self::not_found(format!("User with id={} was not found", user_id))
    }

    pub fn category_not_found(category_id: i64) -> Self {
        Self::not_found(format!("Category with id={} was not found", category_id))
    }

    pub fn request_not_found(request_id: i64) -> Self {
        Self::not_found(format!("Request with id={} was not found", request_id))
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RendezvousError::NotFound(_) => false,
            RendezvousError::Conflict(_) => false,
            RendezvousError::Validation(_) => false,
            RendezvousError::Database(_) => false,
            RendezvousError::Migration(_) => false,
            RendezvousError::Config(_) => false,
            RendezvousError::Stats(_) => true,
            RendezvousError::Redis(_) => true,
            RendezvousError::Http(_) => true,
            RendezvousError::Serialization(_) => false,
            RendezvousError::Io(_) => true,
            RendezvousError::UrlParse(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RendezvousError::Database(_) => ErrorSeverity::Critical,
            RendezvousError::Migration(_) => ErrorSeverity::Critical,
            RendezvousError::Config(_) => ErrorSeverity::Critical,
            RendezvousError::Conflict(_) => ErrorSeverity::Warning,
            RendezvousError::Stats(_) => ErrorSeverity::Warning,
            RendezvousError::NotFound(_) => ErrorSeverity::Info,
            RendezvousError::Validation(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Classify the error for the caller-facing layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            RendezvousError::NotFound(_) => ErrorKind::NotFound,
            RendezvousError::Conflict(_) => ErrorKind::Conflict,
            RendezvousError::Validation(_) => ErrorKind::BadRequest,
            _ => ErrorKind::Internal,
        }
    }
}

/// Caller-facing classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status a transport layer would answer with
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::BadRequest => 400,
            ErrorKind::Internal => 500,
        }
    }

    /// Short reason phrase shown next to the error message
    pub fn reason(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "The required object was not found.",
            ErrorKind::Conflict => "For the requested operation the conditions are not met.",
            ErrorKind::BadRequest => "Incorrectly made request.",
            ErrorKind::Internal => "Internal server error.",
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

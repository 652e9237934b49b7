//! Structured error types for ingestion, storage and configuration.
//!
//! The filter engine itself never fails; these errors only surface at the
//! boundaries where untyped data or the filesystem is involved.

use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,
    InvalidDocument,

    // Storage errors
    StoreIo,
    StoreCorrupt,

    // Configuration
    ConfigError,

    InternalError,
}

/// Structured error returned across the crate's fallible boundaries.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct FollowUpError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FollowUpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidDocument, reason)
    }

    pub fn store_io(path: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::StoreIo,
            format!("Store I/O failed for {}", path.display()),
        )
        .with_details(err.to_string())
    }

    pub fn store_corrupt(path: &Path, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::StoreCorrupt,
            format!("Store file is not valid JSON: {}", path.display()),
        )
        .with_details(err.to_string())
    }

    pub fn config(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ConfigError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for FollowUpError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FollowUpError>() {
            Ok(inner) => inner,
            Err(err) => FollowUpError::internal(err),
        }
    }
}

impl From<serde_json::Error> for FollowUpError {
    fn from(err: serde_json::Error) -> Self {
        FollowUpError::invalid_document(format!("Malformed JSON: {}", err))
    }
}

/// Result type for fallible operations.
pub type Result<T> = std::result::Result<T, FollowUpError>;

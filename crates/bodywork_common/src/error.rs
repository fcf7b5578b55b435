use crate::models::FieldError;
use std::fmt;
use thiserror::Error;

/// The service-level error type every handler returns.
///
/// Each crate keeps its own error enum and converts into this one at the HTTP boundary,
/// where it is mapped to a status code, a stable machine-readable `code` and a message
/// that is safe to show to clients.
#[derive(Error, Debug)]
pub enum BodyworkError {
    /// Missing or malformed input, user-fixable
    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        fields: Vec<FieldError>,
    },

    /// The requested slot lies outside the configured working days or blocks
    #[error("Outside business hours: {0}")]
    OutsideBusinessHours(String),

    /// The slot is taken (stale UI state or a concurrent booking)
    #[error("Slot conflict: {0}")]
    SlotConflict(String),

    /// A status change that the appointment lifecycle does not allow
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred during authentication or authorization
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Persistence failure, fatal to the request
    #[error("Storage error: {0}")]
    StorageError(String),

}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for BodyworkError {
    fn status_code(&self) -> u16 {
        match self {
            BodyworkError::ValidationError { .. } => 400,
            BodyworkError::OutsideBusinessHours(_) => 404,
            BodyworkError::SlotConflict(_) => 409,
            BodyworkError::InvalidTransition(_) => 409,
            BodyworkError::NotFoundError(_) => 404,
            BodyworkError::AuthError(_) => 401,
            BodyworkError::ConfigError(_) => 500,
            BodyworkError::StorageError(_) => 500,
        }
    }
}

impl BodyworkError {
    /// Stable code clients can branch on.
    pub fn code(&self) -> &'static str {
        match self {
            BodyworkError::ValidationError { .. } => "validation_error",
            BodyworkError::OutsideBusinessHours(_) => "outside_business_hours",
            BodyworkError::SlotConflict(_) => "slot_conflict",
            BodyworkError::InvalidTransition(_) => "invalid_transition",
            BodyworkError::NotFoundError(_) => "not_found",
            BodyworkError::AuthError(_) => "unauthorized",
            BodyworkError::ConfigError(_) => "internal_error",
            BodyworkError::StorageError(_) => "storage_error",
        }
    }

    /// Message returned to the client. Server-side faults get a generic text; their
    /// detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self {
            BodyworkError::ValidationError { message, .. } => message.clone(),
            BodyworkError::OutsideBusinessHours(msg)
            | BodyworkError::SlotConflict(msg)
            | BodyworkError::InvalidTransition(msg)
            | BodyworkError::NotFoundError(msg)
            | BodyworkError::AuthError(msg) => msg.clone(),
            BodyworkError::StorageError(_) => {
                "We could not save your request. Please try again later.".to_string()
            }
            BodyworkError::ConfigError(_) => "An internal error occurred.".to_string(),
        }
    }

    /// Field-level detail for validation failures.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            BodyworkError::ValidationError { fields, .. } => fields,
            _ => &[],
        }
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> BodyworkError {
    BodyworkError::ConfigError(message.to_string())
}

pub fn validation_error(fields: Vec<FieldError>) -> BodyworkError {
    let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
    BodyworkError::ValidationError {
        message: format!("Please check the following fields: {}", names.join(", ")),
        fields,
    }
}

pub fn not_found<T: fmt::Display>(message: T) -> BodyworkError {
    BodyworkError::NotFoundError(message.to_string())
}

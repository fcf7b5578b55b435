// --- File: crates/bodywork_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Runtime feature switches
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared domain models
pub mod services; // Collaborator abstractions

#[cfg(test)]
mod error_test;

pub use error::{
    config_error, not_found, validation_error, BodyworkError, HttpStatusCode,
};

pub use http::{
    client::{create_client, HTTP_CLIENT},
    IntoHttpResponse,
};

pub use logging::{init, init_with_level, log_error, log_result};

pub use features::{is_calendar_enabled, is_feature_enabled, is_notifications_enabled};

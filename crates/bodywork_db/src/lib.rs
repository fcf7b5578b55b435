//! Schedule store for the Bodywork booking service
//!
//! Appointments and the audit log live in a relational database reached through
//! SQLx's `Any` driver. SQLite is the default backend.
//!
//! # Example
//!
//! ```rust,no_run
//! use bodywork_config::PiiCipher;
//! use bodywork_db::{
//!     AppointmentRepository, AppointmentRepositoryFactory, DbClient, RepositoryFactory,
//! };
//! use std::sync::Arc;
//!
//! async fn setup(key: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite://data/bodywork.db").await?;
//!     let cipher = Arc::new(PiiCipher::from_base64_key(key)?);
//!     let appointments = AppointmentRepositoryFactory::new(cipher).create_repository(db_client);
//!     appointments.init_schema().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use client::DbClient;
pub use error::DbError;
pub use factory::DbClientFactory;
pub use repository::RepositoryFactory;

pub use repositories::{
    AppointmentRepository, AppointmentRepositoryFactory, AuditLogRepository,
    AuditLogRepositoryFactory, BookedInterval, ReserveOutcome, SqlAppointmentRepository,
    SqlAuditLogRepository, MAX_AUDIT_PAGE,
};

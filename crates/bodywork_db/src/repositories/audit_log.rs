//! Repository for the audit log
//!
//! Append-only: entries are never updated or deleted.

use crate::error::DbError;
use async_trait::async_trait;

pub use bodywork_common::models::AuditLogEntry;

/// Upper bound for a single `list` call.
pub const MAX_AUDIT_PAGE: u32 = 500;

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Create the table (and, on SQLite, the triggers that reject changes).
    async fn init_schema(&self) -> Result<(), DbError>;

    /// Store an entry and return its id.
    async fn append(&self, entry: &AuditLogEntry) -> Result<i64, DbError>;

    /// Newest entries first, optionally narrowed to one object.
    async fn list(
        &self,
        object_type: Option<&str>,
        object_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, DbError>;
}

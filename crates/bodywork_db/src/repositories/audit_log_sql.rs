//! SQL implementation of the audit log repository

use crate::error::DbError;
use crate::repositories::audit_log::{AuditLogEntry, AuditLogRepository, MAX_AUDIT_PAGE};
use crate::repositories::columns::{column, nullable_column};
use crate::DbClient;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, error, info};

/// SQL implementation of the audit log repository
#[derive(Debug, Clone)]
pub struct SqlAuditLogRepository {
    db_client: DbClient,
}

impl SqlAuditLogRepository {
    pub fn new(db_client: DbClient) -> Self {
        Self { db_client }
    }
}

#[async_trait]
impl AuditLogRepository for SqlAuditLogRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing audit log schema");

        let query = r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                actor TEXT NOT NULL,
                object_type TEXT NOT NULL,
                object_id TEXT,
                details TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL
            )
        "#;
        self.db_client.execute(query).await?;
        self.db_client
            .execute(
                "CREATE INDEX IF NOT EXISTS idx_audit_log_object ON audit_log (object_type, object_id)",
            )
            .await?;

        if self.db_client.is_sqlite() {
            self.db_client
                .execute(
                    r#"
                    CREATE TRIGGER IF NOT EXISTS audit_log_no_update
                    BEFORE UPDATE ON audit_log
                    BEGIN
                        SELECT RAISE(ABORT, 'audit_log is append-only');
                    END
                    "#,
                )
                .await?;
            self.db_client
                .execute(
                    r#"
                    CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
                    BEFORE DELETE ON audit_log
                    BEGIN
                        SELECT RAISE(ABORT, 'audit_log is append-only');
                    END
                    "#,
                )
                .await?;
        }

        info!("Audit log schema initialized successfully");
        Ok(())
    }

    async fn append(&self, entry: &AuditLogEntry) -> Result<i64, DbError> {
        let query = r#"
            INSERT INTO audit_log (action, actor, object_type, object_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
        "#;

        let details = serde_json::to_string(&entry.details)
            .map_err(|e| DbError::QueryError(format!("audit details: {}", e)))?;

        let id: i64 = sqlx::query_scalar(query)
            .bind(entry.action.as_str())
            .bind(entry.actor.as_str())
            .bind(entry.object_type.as_str())
            .bind(entry.object_id.as_deref())
            .bind(details)
            .bind(entry.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to append audit entry: {}", e);
                DbError::from_query(e)
            })?;

        debug!(audit_id = id, action = %entry.action, "Audit entry recorded");
        Ok(id)
    }

    async fn list(
        &self,
        object_type: Option<&str>,
        object_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, DbError> {
        let query = r#"
            SELECT id, action, actor, object_type, object_id, details, created_at
            FROM audit_log
            WHERE ($1 IS NULL OR object_type = $2)
              AND ($3 IS NULL OR object_id = $4)
            ORDER BY id DESC
            LIMIT $5
        "#;

        let rows = sqlx::query(query)
            .bind(object_type)
            .bind(object_type)
            .bind(object_id)
            .bind(object_id)
            .bind(i64::from(limit.clamp(1, MAX_AUDIT_PAGE)))
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list audit entries: {}", e);
                DbError::from_query(e)
            })?;

        rows.iter()
            .map(|row| {
                let id: i64 = column(row, "id")?;
                let details: String = column(row, "details")?;
                let created_at: String = column(row, "created_at")?;
                Ok(AuditLogEntry {
                    id: Some(id),
                    action: column(row, "action")?,
                    actor: column(row, "actor")?,
                    object_type: column(row, "object_type")?,
                    object_id: nullable_column(row, "object_id")?,
                    created_at: DateTime::parse_from_rfc3339(&created_at)
                        .map(|ts| ts.with_timezone(&Utc))
                        .map_err(|e| DbError::CorruptRow(format!("audit {}: {}", id, e)))?,
                    details: serde_json::from_str(&details)
                        .map_err(|e| DbError::CorruptRow(format!("audit {}: {}", id, e)))?,
                })
            })
            .collect()
    }
}

//! Factories for creating repositories
//!
//! Used by the backend to hand repositories to the booking services.

use crate::repositories::appointment_sql::SqlAppointmentRepository;
use crate::repositories::audit_log_sql::SqlAuditLogRepository;
use crate::{DbClient, RepositoryFactory};
use bodywork_config::PiiCipher;
use std::sync::Arc;

/// Factory for appointment repositories. Every repository it creates encrypts with the same key.
#[derive(Debug, Clone)]
pub struct AppointmentRepositoryFactory {
    cipher: Arc<PiiCipher>,
}

impl AppointmentRepositoryFactory {
    pub fn new(cipher: Arc<PiiCipher>) -> Self {
        Self { cipher }
    }
}

impl RepositoryFactory<SqlAppointmentRepository, DbClient> for AppointmentRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlAppointmentRepository {
        SqlAppointmentRepository::new(db_client, self.cipher.clone())
    }
}

/// Factory for audit log repositories
#[derive(Debug, Clone, Default)]
pub struct AuditLogRepositoryFactory;

impl AuditLogRepositoryFactory {
    pub fn new() -> Self {
        Self
    }
}

impl RepositoryFactory<SqlAuditLogRepository, DbClient> for AuditLogRepositoryFactory {
    fn create_repository(&self, db_client: DbClient) -> SqlAuditLogRepository {
        SqlAuditLogRepository::new(db_client)
    }
}

//! Repository modules for database access
//!
//! This module contains repository traits and implementations for the
//! appointment schedule and the audit log.

pub mod appointment;
pub mod appointment_sql;
pub mod audit_log;
pub mod audit_log_sql;
mod columns;
pub mod factories;

pub use appointment::{AppointmentRepository, BookedInterval, ReserveOutcome};
pub use appointment_sql::SqlAppointmentRepository;
pub use audit_log::{AuditLogRepository, MAX_AUDIT_PAGE};
pub use audit_log_sql::SqlAuditLogRepository;
pub use factories::{AppointmentRepositoryFactory, AuditLogRepositoryFactory};

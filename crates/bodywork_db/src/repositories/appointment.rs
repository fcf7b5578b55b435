//! Repository for appointments
//!
//! The schedule store. Client name, email and phone are encrypted by the
//! implementation before they reach the database.

use crate::error::DbError;
use async_trait::async_trait;
use bodywork_common::models::{Appointment, AppointmentFilter, AppointmentStatus, NewAppointment};
use chrono::NaiveDate;

// Re-export the shared models for convenience
pub use bodywork_common::models::StatusCounts;

/// The part of a stored appointment the availability check needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub id: i64,
    /// Minutes since midnight.
    pub start_minute: u32,
    /// Minutes since midnight, exclusive, break not included.
    pub end_minute: u32,
}

/// Result of a conditional insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The row was written; carries the new id.
    Reserved(i64),
    /// An active appointment already occupies part of the window.
    Conflict,
}

/// Storage for appointments.
///
/// Object safe so services can hold an `Arc<dyn AppointmentRepository>`.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Create the tables and indexes if they don't already exist.
    async fn init_schema(&self) -> Result<(), DbError>;

    /// Insert an appointment without any overlap check.
    ///
    /// A second active appointment with the same date and start time violates the
    /// store's unique index and fails with [`DbError::ConstraintViolation`].
    async fn create(&self, appointment: NewAppointment) -> Result<i64, DbError>;

    /// Insert an appointment only if its `[start, end + break)` window overlaps no
    /// active appointment's `[start, end + break)` window on the same date.
    ///
    /// Check and insert are one statement.
    async fn reserve(
        &self,
        appointment: NewAppointment,
        break_minutes: u32,
    ) -> Result<ReserveOutcome, DbError>;

    /// Fetch one appointment with its PII decrypted.
    async fn get(&self, id: i64) -> Result<Option<Appointment>, DbError>;

    /// Appointments matching `filter`, newest date first, later start first within a day.
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DbError>;

    /// Intervals of the active appointments on `date`, ordered by start.
    async fn booked_intervals(&self, date: NaiveDate) -> Result<Vec<BookedInterval>, DbError>;

    /// Moves appointment `id` from `from` to `to` in one conditional write.
    ///
    /// Returns `false` when no appointment has this id or its status is no longer `from`.
    async fn update_status(
        &self,
        id: i64,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, DbError>;

    /// Returns `false` when no appointment has this id.
    async fn set_external_calendar_id(
        &self,
        id: i64,
        external_id: Option<&str>,
    ) -> Result<bool, DbError>;

    /// Returns `false` when no appointment has this id.
    async fn delete(&self, id: i64) -> Result<bool, DbError>;

    async fn count_by_status(&self, status: AppointmentStatus) -> Result<i64, DbError>;
}

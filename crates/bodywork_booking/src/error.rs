// --- File: crates/bodywork_booking/src/error.rs ---
use crate::availability::AvailabilityError;
use bodywork_common::error::{not_found, validation_error, BodyworkError};
use bodywork_common::models::{AppointmentStatus, FieldError};
use bodywork_db::DbError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid booking input ({} fields)", .0.len())]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Availability(#[from] AvailabilityError),
    /// Another booking took the slot between the check and the insert.
    #[error("Slot was taken before the booking could be stored")]
    ConflictAtCommit,
    #[error("Schedule store error: {0}")]
    Store(#[from] DbError),
}

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Appointment {0} not found")]
    NotFound(i64),
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("Schedule store error: {0}")]
    Store(#[from] DbError),
}

impl From<AvailabilityError> for BodyworkError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::OutsideBusinessHours(message) => {
                BodyworkError::OutsideBusinessHours(message)
            }
            AvailabilityError::SlotConflict { .. } => BodyworkError::SlotConflict(
                "The requested time is not available. Please choose another slot.".to_string(),
            ),
            AvailabilityError::TooSoon { earliest } => validation_error(vec![FieldError::new(
                "appointmentDate",
                format!(
                    "Bookings must start at or after {}",
                    earliest.format("%Y-%m-%d %H:%M")
                ),
            )]),
            AvailabilityError::InvalidDuration(minutes) => validation_error(vec![FieldError::new(
                "duration",
                format!("{} minutes is not an offered duration", minutes),
            )]),
            AvailabilityError::Store(e) => e.into(),
        }
    }
}

impl From<BookingError> for BodyworkError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(fields) => validation_error(fields),
            BookingError::Availability(e) => e.into(),
            BookingError::ConflictAtCommit => BodyworkError::SlotConflict(
                "This time was booked by someone else a moment ago. Please choose another slot."
                    .to_string(),
            ),
            BookingError::Store(e) => e.into(),
        }
    }
}

impl From<AdminError> for BodyworkError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::NotFound(id) => not_found(format!("Appointment {} not found", id)),
            e @ AdminError::InvalidTransition { .. } => {
                BodyworkError::InvalidTransition(e.to_string())
            }
            AdminError::Store(e) => e.into(),
        }
    }
}

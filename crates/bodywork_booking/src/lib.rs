// --- File: crates/bodywork_booking/src/lib.rs ---
//! The booking core: business hours, availability checks, reservations and
//! appointment administration, plus the HTTP routes that expose them.
pub mod admin;
pub mod auth;
pub mod availability;
#[cfg(test)]
mod availability_proptest;
#[cfg(test)]
mod availability_test;
pub mod booking;
#[cfg(test)]
mod booking_test;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod hours;
#[cfg(test)]
mod hours_test;
pub mod routes;
#[cfg(test)]
mod test_support;
pub mod validation;

pub use admin::AppointmentAdminService;
pub use availability::{
    AvailabilityChecker, AvailabilityError, SlotAvailability, SlotRequest, SlotWindow,
};
pub use booking::{BookingOutcome, BookingService, RetryPolicy, SideEffectStatus, SideEffects};
pub use error::{AdminError, BookingError};
pub use handlers::BookingState;
pub use hours::{BusinessHours, HoursError};
pub use routes::routes;
pub use validation::BookingInput;

//! HTTP implementations of the booking collaborators.
//!
//! * [`notification::WebhookNotificationService`] posts client and practitioner mail to a relay.
//! * [`calendar::HttpCalendarService`] mirrors appointments into an external calendar.

pub mod calendar;
pub mod error;
pub mod notification;

pub use calendar::HttpCalendarService;
pub use error::IntegrationError;
pub use notification::WebhookNotificationService;

// --- File: crates/bodywork_common/src/services.rs ---
//! Service abstractions for the practice's external collaborators.
//!
//! The booking core talks to mail delivery and the practitioner's calendar only
//! through these traits, so deployments can plug in any backend and tests can
//! substitute in-memory fakes.

use crate::models::Appointment;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// A wrapper error type that implements std::error::Error for Box<dyn std::error::Error + Send + Sync>
#[derive(Debug)]
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StdError for BoxedError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        BoxedError(err)
    }
}

impl BoxedError {
    pub fn new<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        BoxedError(Box::new(err))
    }
}

/// Outbound mail for booking events.
pub trait NotificationService: Send + Sync {
    /// Error type returned by notification service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Confirmation sent to the client's address.
    fn send_client_confirmation<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error>;

    /// Heads-up sent to the practitioner.
    fn send_practitioner_notification<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error>;
}

/// The practitioner's external calendar.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create an event mirroring the appointment.
    fn create_event<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, CalendarEventResult, Self::Error>;

    /// Delete a previously created event.
    fn delete_event<'a>(&'a self, event_id: &'a str) -> BoxFuture<'a, (), Self::Error>;
}

/// A factory for creating service instances.
///
/// Services that are disabled in the configuration are reported as `None`.
pub trait ServiceFactory: Send + Sync {
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>>;

    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>>;
}

/// Adapts a notification backend with its own error type to the boxed form the factory hands out.
pub struct BoxedNotificationService<S> {
    inner: S,
}

impl<S: NotificationService> BoxedNotificationService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: NotificationService> NotificationService for BoxedNotificationService<S> {
    type Error = BoxedError;

    fn send_client_confirmation<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.inner
                .send_client_confirmation(appointment)
                .await
                .map_err(BoxedError::new)
        })
    }

    fn send_practitioner_notification<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.inner
                .send_practitioner_notification(appointment)
                .await
                .map_err(BoxedError::new)
        })
    }
}

/// Calendar counterpart of [`BoxedNotificationService`].
pub struct BoxedCalendarService<S> {
    inner: S,
}

impl<S: CalendarService> BoxedCalendarService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: CalendarService> CalendarService for BoxedCalendarService<S> {
    type Error = BoxedError;

    fn create_event<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, CalendarEventResult, Self::Error> {
        Box::pin(async move {
            self.inner
                .create_event(appointment)
                .await
                .map_err(BoxedError::new)
        })
    }

    fn delete_event<'a>(&'a self, event_id: &'a str) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.inner
                .delete_event(event_id)
                .await
                .map_err(BoxedError::new)
        })
    }
}

/// Represents the result of a calendar event operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEventResult {
    /// The ID of the event in the external calendar.
    pub event_id: String,
    /// The status of the event.
    pub status: String,
}

/// Represents the result of a notification operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    /// The ID of the notification, if the provider returned one.
    pub id: Option<String>,
    /// The status of the notification.
    pub status: String,
}

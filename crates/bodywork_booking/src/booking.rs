// --- File: crates/bodywork_booking/src/booking.rs ---
use crate::availability::{SlotAvailability, SlotRequest};
use crate::error::BookingError;
use crate::hours::BusinessHours;
use crate::validation::{validate_booking, BookingInput};
use bodywork_common::models::{
    Appointment, AppointmentStatus, AuditLogEntry, NewAppointment, SYSTEM_ACTOR,
};
use bodywork_common::services::{BoxedError, CalendarService, NotificationService};
use bodywork_config::NotificationConfig;
use bodywork_db::{AppointmentRepository, AuditLogRepository, ReserveOutcome};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub const APPOINTMENT_OBJECT: &str = "appointment";

/// Status new bookings are stored with.
pub const NEW_BOOKING_STATUS: AppointmentStatus = AppointmentStatus::Confirmed;

const DEFAULT_NOTIFICATION_ATTEMPTS: u32 = 2;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Outcome of one best-effort side effect.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SideEffectStatus {
    Sent,
    Failed,
    Skipped,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SideEffects {
    pub calendar_sync: SideEffectStatus,
    pub client_confirmation: SideEffectStatus,
    pub practitioner_notification: SideEffectStatus,
}

/// A committed booking plus the fate of its side effects.
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub appointment: Appointment,
    pub side_effects: SideEffects,
}

/// How often and how patiently notifications are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_NOTIFICATION_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: Option<&NotificationConfig>) -> Self {
        let default = Self::default();
        match config {
            Some(c) => Self {
                max_attempts: c.max_attempts.unwrap_or(default.max_attempts).max(1),
                delay: c
                    .retry_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(default.delay),
            },
            None => default,
        }
    }
}

/// Attempt `op` up to `policy.max_attempts` times, sleeping `delay * attempt` in between.
async fn with_retries<F, Fut, T>(
    policy: RetryPolicy,
    label: &str,
    appointment_id: i64,
    mut op: F,
) -> SideEffectStatus
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BoxedError>>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match op().await {
            Ok(_) => {
                info!(appointment_id, attempt, "{} sent", label);
                return SideEffectStatus::Sent;
            }
            Err(e) if attempt < attempts => {
                warn!(appointment_id, attempt, error = %e, "{} failed, retrying", label);
                tokio::time::sleep(policy.delay * attempt).await;
            }
            Err(e) => {
                error!(appointment_id, attempt, error = %e, "{} failed, giving up", label);
            }
        }
    }
    SideEffectStatus::Failed
}

/// Validates submissions, re-checks availability, reserves the slot and runs the
/// post-commit side effects.
pub struct BookingService {
    hours: Arc<BusinessHours>,
    checker: Arc<dyn SlotAvailability>,
    appointments: Arc<dyn AppointmentRepository>,
    audit: Arc<dyn AuditLogRepository>,
    notifications: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
    calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    retry: RetryPolicy,
}

impl BookingService {
    pub fn new(
        hours: Arc<BusinessHours>,
        checker: Arc<dyn SlotAvailability>,
        appointments: Arc<dyn AppointmentRepository>,
        audit: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            hours,
            checker,
            appointments,
            audit,
            notifications: None,
            calendar: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_notifications(
        mut self,
        notifications: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
        retry: RetryPolicy,
    ) -> Self {
        self.notifications = notifications;
        self.retry = retry;
        self
    }

    pub fn with_calendar(
        mut self,
        calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    ) -> Self {
        self.calendar = calendar;
        self
    }

    /// Book a slot.
    ///
    /// Fails on invalid input, on a slot that is outside business hours or taken, and
    /// on storage errors. Once the row is committed the call succeeds; calendar and
    /// mail failures only show up in [`BookingOutcome::side_effects`].
    pub async fn submit_booking(
        &self,
        input: &BookingInput,
    ) -> Result<BookingOutcome, BookingError> {
        let valid = validate_booking(input, &self.hours).map_err(BookingError::Validation)?;

        let slot = SlotRequest {
            date: valid.appointment_date,
            start: valid.start_time,
            duration_minutes: valid.duration_minutes,
        };
        self.checker.check(&slot).await?;

        let new = valid.into_new_appointment(NEW_BOOKING_STATUS, Utc::now());
        let id = match self
            .appointments
            .reserve(new.clone(), self.hours.break_minutes)
            .await?
        {
            ReserveOutcome::Reserved(id) => id,
            ReserveOutcome::Conflict => {
                warn!(
                    date = %slot.date,
                    start = %slot.start,
                    "Slot was taken between availability check and insert"
                );
                return Err(BookingError::ConflictAtCommit);
            }
        };

        let mut appointment = stored_appointment(id, new);
        info!(
            appointment_id = id,
            date = %appointment.appointment_date,
            start = %appointment.start_time,
            duration = appointment.duration_minutes,
            "Appointment booked"
        );
        self.record(AuditLogEntry::new(
            "appointment_created",
            SYSTEM_ACTOR,
            APPOINTMENT_OBJECT,
            Some(id.to_string()),
            json!({
                "date": appointment.appointment_date.to_string(),
                "startTime": appointment.start_time.format("%H:%M").to_string(),
                "endTime": appointment.end_time.format("%H:%M").to_string(),
                "durationMinutes": appointment.duration_minutes,
                "status": appointment.status.as_str(),
            }),
        ))
        .await;

        let calendar_sync = self.sync_calendar(&mut appointment).await;
        let (client_confirmation, practitioner_notification) = self.notify(&appointment).await;

        Ok(BookingOutcome {
            appointment,
            side_effects: SideEffects {
                calendar_sync,
                client_confirmation,
                practitioner_notification,
            },
        })
    }

    /// Audit failures are logged but never undo a committed booking.
    async fn record(&self, entry: AuditLogEntry) {
        if let Err(e) = self.audit.append(&entry).await {
            error!(action = %entry.action, object_id = ?entry.object_id, error = %e, "Failed to write audit entry");
        }
    }

    async fn sync_calendar(&self, appointment: &mut Appointment) -> SideEffectStatus {
        let Some(calendar) = &self.calendar else {
            return SideEffectStatus::Skipped;
        };

        let event = match calendar.create_event(appointment).await {
            Ok(event) => event,
            Err(e) => {
                warn!(appointment_id = appointment.id, error = %e, "Calendar event creation failed");
                self.calendar_sync_failed(appointment.id, "create_event_failed")
                    .await;
                return SideEffectStatus::Failed;
            }
        };

        match self
            .appointments
            .set_external_calendar_id(appointment.id, Some(&event.event_id))
            .await
        {
            Ok(true) => {
                appointment.external_calendar_id = Some(event.event_id);
                SideEffectStatus::Sent
            }
            outcome => {
                if let Err(e) = &outcome {
                    error!(appointment_id = appointment.id, error = %e, "Failed to store calendar reference");
                }
                // Remove the event so it does not outlive its reference.
                if let Err(e) = calendar.delete_event(&event.event_id).await {
                    warn!(appointment_id = appointment.id, error = %e, "Compensating calendar delete failed");
                }
                self.calendar_sync_failed(appointment.id, "store_reference_failed")
                    .await;
                SideEffectStatus::Failed
            }
        }
    }

    async fn calendar_sync_failed(&self, appointment_id: i64, reason: &str) {
        self.record(AuditLogEntry::new(
            "calendar_sync_failed",
            SYSTEM_ACTOR,
            APPOINTMENT_OBJECT,
            Some(appointment_id.to_string()),
            json!({ "reason": reason }),
        ))
        .await;
    }

    async fn notify(&self, appointment: &Appointment) -> (SideEffectStatus, SideEffectStatus) {
        let Some(notifications) = &self.notifications else {
            return (SideEffectStatus::Skipped, SideEffectStatus::Skipped);
        };

        let client = with_retries(self.retry, "Client confirmation", appointment.id, || {
            notifications.send_client_confirmation(appointment)
        })
        .await;
        let practitioner = with_retries(
            self.retry,
            "Practitioner notification",
            appointment.id,
            || notifications.send_practitioner_notification(appointment),
        )
        .await;

        (client, practitioner)
    }
}

fn stored_appointment(id: i64, new: NewAppointment) -> Appointment {
    let end_time = new.end_time();
    Appointment {
        id,
        client_name: new.client_name,
        email: new.email,
        phone: new.phone,
        appointment_date: new.appointment_date,
        start_time: new.start_time,
        end_time,
        duration_minutes: new.duration_minutes,
        focus_areas: new.focus_areas,
        pressure_preference: new.pressure_preference,
        special_requests: new.special_requests,
        status: new.status,
        external_calendar_id: None,
        created_at: new.created_at,
    }
}

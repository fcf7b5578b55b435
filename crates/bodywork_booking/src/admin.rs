// --- File: crates/bodywork_booking/src/admin.rs ---
//! Administrative operations on stored appointments.

use crate::booking::APPOINTMENT_OBJECT;
use crate::error::AdminError;
use bodywork_common::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AuditLogEntry, StatusCounts,
};
use bodywork_common::services::{BoxedError, CalendarService};
use bodywork_db::{AppointmentRepository, AuditLogRepository, MAX_AUDIT_PAGE};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Conditional status writes attempted before a concurrent writer wins.
const STATUS_WRITE_ATTEMPTS: usize = 3;

/// Whether the lifecycle allows moving from `from` to `to`.
///
/// Cancelled is terminal. Re-applying the current status is allowed and changes nothing.
pub fn transition_allowed(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    use AppointmentStatus::*;
    match (from, to) {
        (a, b) if a == b => true,
        (Cancelled, _) => false,
        (Pending, Confirmed) | (Confirmed, Pending) => true,
        (_, Cancelled) => true,
        _ => false,
    }
}

pub struct AppointmentAdminService {
    appointments: Arc<dyn AppointmentRepository>,
    audit: Arc<dyn AuditLogRepository>,
    calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
}

impl AppointmentAdminService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        audit: Arc<dyn AuditLogRepository>,
        calendar: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    ) -> Self {
        Self {
            appointments,
            audit,
            calendar,
        }
    }

    pub async fn get(&self, id: i64) -> Result<Appointment, AdminError> {
        self.appointments
            .get(id)
            .await?
            .ok_or(AdminError::NotFound(id))
    }

    pub async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, AdminError> {
        Ok(self.appointments.list(filter).await?)
    }

    pub async fn counts(&self) -> Result<StatusCounts, AdminError> {
        let mut counts = StatusCounts::default();
        for status in AppointmentStatus::ALL {
            let n = self.appointments.count_by_status(status).await?;
            match status {
                AppointmentStatus::Pending => counts.pending = n,
                AppointmentStatus::Confirmed => counts.confirmed = n,
                AppointmentStatus::Cancelled => counts.cancelled = n,
            }
            counts.total += n;
        }
        Ok(counts)
    }

    /// Move an appointment to `status`, recording who did it.
    ///
    /// The write only lands if the row still holds the status the lifecycle check saw.
    /// When another writer got there first the row is re-read and the check runs again.
    pub async fn update_status(
        &self,
        id: i64,
        status: AppointmentStatus,
        actor: &str,
    ) -> Result<Appointment, AdminError> {
        let mut current = self.get(id).await?;
        for _ in 0..STATUS_WRITE_ATTEMPTS {
            if current.status == status {
                return Ok(current);
            }
            if !transition_allowed(current.status, status) {
                return Err(AdminError::InvalidTransition {
                    from: current.status,
                    to: status,
                });
            }
            if self
                .appointments
                .update_status(id, current.status, status)
                .await?
            {
                return self.status_changed(current, status, actor).await;
            }
            warn!(appointment_id = id, expected = %current.status, to = %status, "Status changed concurrently, re-reading");
            current = self.get(id).await?;
        }
        Err(AdminError::InvalidTransition {
            from: current.status,
            to: status,
        })
    }

    async fn status_changed(
        &self,
        previous: Appointment,
        status: AppointmentStatus,
        actor: &str,
    ) -> Result<Appointment, AdminError> {
        let id = previous.id;
        info!(appointment_id = id, from = %previous.status, to = %status, actor, "Appointment status changed");
        self.record(AuditLogEntry::new(
            "appointment_status_changed",
            actor,
            APPOINTMENT_OBJECT,
            Some(id.to_string()),
            json!({ "from": previous.status.as_str(), "to": status.as_str() }),
        ))
        .await;

        if !status.is_active() {
            if let Some(event_id) = &previous.external_calendar_id {
                self.remove_calendar_event(id, event_id).await;
            }
        }

        self.get(id).await
    }

    pub async fn delete(&self, id: i64, actor: &str) -> Result<(), AdminError> {
        let current = self.get(id).await?;
        if !self.appointments.delete(id).await? {
            return Err(AdminError::NotFound(id));
        }
        info!(appointment_id = id, actor, "Appointment deleted");
        self.record(AuditLogEntry::new(
            "appointment_deleted",
            actor,
            APPOINTMENT_OBJECT,
            Some(id.to_string()),
            json!({
                "date": current.appointment_date.to_string(),
                "startTime": current.start_time.format("%H:%M").to_string(),
                "status": current.status.as_str(),
            }),
        ))
        .await;

        if let Some(event_id) = &current.external_calendar_id {
            self.remove_calendar_event(id, event_id).await;
        }
        Ok(())
    }

    /// Audit entries for appointments, newest first. `limit` is capped at [`MAX_AUDIT_PAGE`].
    pub async fn audit_trail(
        &self,
        object_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<AuditLogEntry>, AdminError> {
        Ok(self
            .audit
            .list(Some(APPOINTMENT_OBJECT), object_id, limit.min(MAX_AUDIT_PAGE))
            .await?)
    }

    /// Audit writes follow a committed change, so a failure is logged and not returned.
    async fn record(&self, entry: AuditLogEntry) {
        if let Err(e) = self.audit.append(&entry).await {
            error!(action = %entry.action, object_id = ?entry.object_id, error = %e, "Failed to write audit entry");
        }
    }

    async fn remove_calendar_event(&self, appointment_id: i64, event_id: &str) {
        let Some(calendar) = &self.calendar else {
            return;
        };
        match calendar.delete_event(event_id).await {
            Ok(()) => info!(appointment_id, "Calendar event removed"),
            Err(e) => warn!(appointment_id, error = %e, "Failed to remove calendar event"),
        }
    }
}

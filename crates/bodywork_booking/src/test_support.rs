//! Shared fixtures for the unit tests of this crate.

use crate::hours::BusinessHours;
use async_trait::async_trait;
use bodywork_common::models::{
    Appointment, AppointmentFilter, AppointmentStatus, AuditLogEntry, NewAppointment,
};
use bodywork_common::services::{
    BoxFuture, BoxedError, CalendarEventResult, CalendarService, NotificationResult,
    NotificationService,
};
use bodywork_config::secrets::generate_key;
use bodywork_config::{BusinessHoursConfig, DurationOption, PiiCipher, TimeBlock};
use bodywork_db::{
    AppointmentRepository, AuditLogRepository, BookedInterval, DbClient, DbError,
    ReserveOutcome, SqlAppointmentRepository, SqlAuditLogRepository,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Mon-Fri, 09:00-17:00, 15 minute break, 60/90/120 minute sessions.
pub fn hours_config() -> BusinessHoursConfig {
    BusinessHoursConfig {
        working_days: vec![1, 2, 3, 4, 5],
        time_blocks: vec![TimeBlock {
            day: None,
            from: "09:00".to_string(),
            to: "17:00".to_string(),
        }],
        duration_options: [60, 90, 120]
            .into_iter()
            .map(|minutes| DurationOption {
                minutes,
                price: i64::from(minutes) * 150,
                currency: None,
                label: None,
            })
            .collect(),
        break_minutes: 15,
        slot_step_minutes: Some(15),
        time_zone: Some("Europe/Zurich".to_string()),
        min_notice_minutes: Some(60),
        currency: Some("CHF".to_string()),
    }
}

pub fn hours() -> Arc<BusinessHours> {
    Arc::new(BusinessHours::from_config(&hours_config()).unwrap())
}

/// 2030-01-01 06:00 UTC, well before every test date.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 6, 0, 0).unwrap()
}

pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

pub fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 12).unwrap()
}

pub fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub struct Stores {
    pub client: DbClient,
    pub appointments: Arc<SqlAppointmentRepository>,
    pub audit: Arc<SqlAuditLogRepository>,
}

pub async fn memory_stores() -> Stores {
    let client = DbClient::from_url("sqlite::memory:").await.unwrap();
    let cipher = Arc::new(PiiCipher::from_base64_key(&generate_key().unwrap()).unwrap());
    let appointments = Arc::new(SqlAppointmentRepository::new(client.clone(), cipher));
    appointments.init_schema().await.unwrap();
    let audit = Arc::new(SqlAuditLogRepository::new(client.clone()));
    audit.init_schema().await.unwrap();
    Stores {
        client,
        appointments,
        audit,
    }
}

/// Notification fake that fails the first `failures` calls of each kind.
#[derive(Default)]
pub struct RecordingNotifier {
    pub failures: u32,
    pub client_calls: AtomicU32,
    pub practitioner_calls: AtomicU32,
}

impl RecordingNotifier {
    pub fn failing(failures: u32) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    fn outcome(&self, calls: &AtomicU32) -> Result<NotificationResult, BoxedError> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(BoxedError::new(io::Error::other("relay down")))
        } else {
            Ok(NotificationResult {
                id: Some(format!("msg-{}", call)),
                status: "accepted".to_string(),
            })
        }
    }
}

impl NotificationService for RecordingNotifier {
    type Error = BoxedError;

    fn send_client_confirmation<'a>(
        &'a self,
        _appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move { self.outcome(&self.client_calls) })
    }

    fn send_practitioner_notification<'a>(
        &'a self,
        _appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move { self.outcome(&self.practitioner_calls) })
    }
}

/// Calendar fake that remembers created and deleted event ids.
#[derive(Default)]
pub struct RecordingCalendar {
    pub fail_create: bool,
    pub created: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl CalendarService for RecordingCalendar {
    type Error = BoxedError;

    fn create_event<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, CalendarEventResult, Self::Error> {
        Box::pin(async move {
            if self.fail_create {
                return Err(BoxedError::new(io::Error::other("calendar down")));
            }
            let event_id = format!("evt-{}", appointment.id);
            self.created.lock().unwrap().push(event_id.clone());
            Ok(CalendarEventResult {
                event_id,
                status: "confirmed".to_string(),
            })
        })
    }

    fn delete_event<'a>(&'a self, event_id: &'a str) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.deleted.lock().unwrap().push(event_id.to_string());
            Ok(())
        })
    }
}

pub fn as_audit(stores: &Stores) -> Arc<dyn AuditLogRepository> {
    stores.audit.clone()
}

pub fn as_appointments(stores: &Stores) -> Arc<dyn AppointmentRepository> {
    stores.appointments.clone()
}


/// Store wrapper that cancels the target appointment through the inner store right
/// before the first status write, as a concurrent admin would.
pub struct CancelledMidway {
    pub inner: Arc<SqlAppointmentRepository>,
    pub fired: AtomicBool,
}

impl CancelledMidway {
    pub fn new(inner: Arc<SqlAppointmentRepository>) -> Self {
        Self {
            inner,
            fired: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AppointmentRepository for CancelledMidway {
    async fn init_schema(&self) -> Result<(), DbError> {
        self.inner.init_schema().await
    }

    async fn create(&self, appointment: NewAppointment) -> Result<i64, DbError> {
        self.inner.create(appointment).await
    }

    async fn reserve(
        &self,
        appointment: NewAppointment,
        break_minutes: u32,
    ) -> Result<ReserveOutcome, DbError> {
        self.inner.reserve(appointment, break_minutes).await
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>, DbError> {
        self.inner.get(id).await
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DbError> {
        self.inner.list(filter).await
    }

    async fn booked_intervals(&self, date: NaiveDate) -> Result<Vec<BookedInterval>, DbError> {
        self.inner.booked_intervals(date).await
    }

    async fn update_status(
        &self,
        id: i64,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, DbError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            self.inner
                .update_status(id, from, AppointmentStatus::Cancelled)
                .await?;
        }
        self.inner.update_status(id, from, to).await
    }

    async fn set_external_calendar_id(
        &self,
        id: i64,
        external_id: Option<&str>,
    ) -> Result<bool, DbError> {
        self.inner.set_external_calendar_id(id, external_id).await
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        self.inner.delete(id).await
    }

    async fn count_by_status(&self, status: AppointmentStatus) -> Result<i64, DbError> {
        self.inner.count_by_status(status).await
    }
}

/// Audit log whose writes always fail.
pub struct FailingAudit;

#[async_trait]
impl AuditLogRepository for FailingAudit {
    async fn init_schema(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn append(&self, _entry: &AuditLogEntry) -> Result<i64, DbError> {
        Err(DbError::QueryError("disk full".to_string()))
    }

    async fn list(
        &self,
        _object_type: Option<&str>,
        _object_id: Option<&str>,
        _limit: u32,
    ) -> Result<Vec<AuditLogEntry>, DbError> {
        Ok(Vec::new())
    }
}

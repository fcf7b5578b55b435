//! SQL implementation of the appointment repository

use crate::error::{is_busy, is_unique_violation, DbError};
use crate::repositories::appointment::{AppointmentRepository, BookedInterval, ReserveOutcome};
use crate::repositories::columns::{column, nullable_column};
use crate::DbClient;
use async_trait::async_trait;
use bodywork_common::models::{
    time_from_minute, Appointment, AppointmentFilter, AppointmentStatus, NewAppointment,
    PressurePreference,
};
use bodywork_config::PiiCipher;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::any::AnyRow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Attempts after the first one when SQLite reports the database as busy.
const BUSY_RETRIES: u32 = 5;
const BUSY_BACKOFF_MS: u64 = 25;

const SELECT_COLUMNS: &str = "id, client_name, email, phone, appointment_date, start_minute, \
     end_minute, duration_minutes, focus_areas, pressure_preference, special_requests, status, \
     external_calendar_id, created_at";

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        client_name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT NOT NULL,
        appointment_date TEXT NOT NULL,
        start_minute INTEGER NOT NULL,
        end_minute INTEGER NOT NULL,
        duration_minutes INTEGER NOT NULL,
        focus_areas TEXT NOT NULL DEFAULT '[]',
        pressure_preference TEXT,
        special_requests TEXT,
        status TEXT NOT NULL DEFAULT 'confirmed'
            CHECK (status IN ('pending', 'confirmed', 'cancelled')),
        external_calendar_id TEXT,
        created_at TEXT NOT NULL,
        CHECK (end_minute = start_minute + duration_minutes)
    )
"#;

// Two active appointments can never share a start time, whatever path wrote them.
const CREATE_ACTIVE_SLOT_INDEX: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_active_slot
    ON appointments (appointment_date, start_minute)
    WHERE status <> 'cancelled'
"#;

const CREATE_DATE_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_appointments_date_status
    ON appointments (appointment_date, status)
"#;

const INSERT: &str = r#"
    INSERT INTO appointments (
        client_name, email, phone, appointment_date, start_minute, end_minute,
        duration_minutes, focus_areas, pressure_preference, special_requests, status, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    RETURNING id
"#;

// Candidate window [T, T+M+B) against each existing [s, e+B):
// overlap iff s < T+M+B and T < e+B.
const RESERVE: &str = r#"
    INSERT INTO appointments (
        client_name, email, phone, appointment_date, start_minute, end_minute,
        duration_minutes, focus_areas, pressure_preference, special_requests, status, created_at
    )
    SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12
    WHERE NOT EXISTS (
        SELECT 1 FROM appointments
        WHERE appointment_date = $13
          AND status <> 'cancelled'
          AND start_minute < $14
          AND $15 < end_minute + $16
    )
    RETURNING id
"#;

/// SQL implementation of the appointment repository
#[derive(Debug, Clone)]
pub struct SqlAppointmentRepository {
    /// The database client
    db_client: DbClient,
    cipher: Arc<PiiCipher>,
}

/// Column values of an appointment as written to the table.
struct EncodedAppointment {
    client_name: String,
    email: String,
    phone: String,
    appointment_date: String,
    start_minute: i64,
    end_minute: i64,
    duration_minutes: i64,
    focus_areas: String,
    pressure_preference: Option<&'static str>,
    special_requests: Option<String>,
    status: &'static str,
    created_at: String,
}

impl SqlAppointmentRepository {
    pub fn new(db_client: DbClient, cipher: Arc<PiiCipher>) -> Self {
        Self { db_client, cipher }
    }

    fn encode(&self, appointment: &NewAppointment) -> Result<EncodedAppointment, DbError> {
        Ok(EncodedAppointment {
            client_name: self.cipher.encrypt(&appointment.client_name)?,
            email: self.cipher.encrypt(&appointment.email)?,
            phone: self.cipher.encrypt(&appointment.phone)?,
            appointment_date: appointment.appointment_date.format("%Y-%m-%d").to_string(),
            start_minute: i64::from(appointment.start_minute()),
            end_minute: i64::from(appointment.end_minute()),
            duration_minutes: i64::from(appointment.duration_minutes),
            focus_areas: serde_json::to_string(&appointment.focus_areas)
                .map_err(|e| DbError::QueryError(format!("focus areas: {}", e)))?,
            pressure_preference: appointment.pressure_preference.map(|p| p.as_str()),
            special_requests: appointment.special_requests.clone(),
            status: appointment.status.as_str(),
            created_at: appointment
                .created_at
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }

    fn decode(&self, row: &AnyRow) -> Result<Appointment, DbError> {
        let id: i64 = column(row, "id")?;
        let date: String = column(row, "appointment_date")?;
        let start_minute: i64 = column(row, "start_minute")?;
        let end_minute: i64 = column(row, "end_minute")?;
        let duration_minutes: i64 = column(row, "duration_minutes")?;
        let focus_areas: String = column(row, "focus_areas")?;
        let pressure: Option<String> = nullable_column(row, "pressure_preference")?;
        let status: String = column(row, "status")?;
        let created_at: String = column(row, "created_at")?;

        let corrupt = |what: &str| DbError::CorruptRow(format!("appointment {}: {}", id, what));

        Ok(Appointment {
            id,
            client_name: self.cipher.decrypt(&column::<String>(row, "client_name")?)?,
            email: self.cipher.decrypt(&column::<String>(row, "email")?)?,
            phone: self.cipher.decrypt(&column::<String>(row, "phone")?)?,
            appointment_date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| corrupt("appointment_date"))?,
            start_time: minute_to_time(start_minute).ok_or_else(|| corrupt("start_minute"))?,
            end_time: minute_to_time(end_minute).ok_or_else(|| corrupt("end_minute"))?,
            duration_minutes: u32::try_from(duration_minutes)
                .map_err(|_| corrupt("duration_minutes"))?,
            focus_areas: serde_json::from_str(&focus_areas).map_err(|_| corrupt("focus_areas"))?,
            pressure_preference: pressure
                .map(|p| p.parse::<PressurePreference>())
                .transpose()
                .map_err(|_| corrupt("pressure_preference"))?,
            special_requests: nullable_column(row, "special_requests")?,
            status: status.parse().map_err(|_| corrupt("status"))?,
            external_calendar_id: nullable_column(row, "external_calendar_id")?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| corrupt("created_at"))?,
        })
    }
}

fn minute_to_time(minute: i64) -> Option<chrono::NaiveTime> {
    u32::try_from(minute).ok().and_then(time_from_minute)
}

/// Runs `op` again while SQLite reports lock contention, up to [`BUSY_RETRIES`] times.
async fn retry_busy<T, F, Fut>(what: &str, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if attempt < BUSY_RETRIES && is_busy(&err) => {
                attempt += 1;
                warn!(operation = what, attempt, "Database busy, retrying: {}", err);
                tokio::time::sleep(Duration::from_millis(BUSY_BACKOFF_MS * u64::from(attempt)))
                    .await;
            }
            result => return result,
        }
    }
}

#[async_trait]
impl AppointmentRepository for SqlAppointmentRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        debug!("Initializing appointment schema");

        self.db_client.execute(CREATE_TABLE).await?;
        self.db_client.execute(CREATE_ACTIVE_SLOT_INDEX).await?;
        self.db_client.execute(CREATE_DATE_INDEX).await?;

        info!("Appointment schema initialized successfully");
        Ok(())
    }

    async fn create(&self, appointment: NewAppointment) -> Result<i64, DbError> {
        let row = self.encode(&appointment)?;
        let pool = self.db_client.pool();

        let id: i64 = retry_busy("create", || {
            sqlx::query_scalar(INSERT)
                .bind(row.client_name.as_str())
                .bind(row.email.as_str())
                .bind(row.phone.as_str())
                .bind(row.appointment_date.as_str())
                .bind(row.start_minute)
                .bind(row.end_minute)
                .bind(row.duration_minutes)
                .bind(row.focus_areas.as_str())
                .bind(row.pressure_preference)
                .bind(row.special_requests.as_deref())
                .bind(row.status)
                .bind(row.created_at.as_str())
                .fetch_one(pool)
        })
        .await
        .map_err(|e| {
            error!("Failed to insert appointment: {}", e);
            DbError::from_query(e)
        })?;

        info!(appointment_id = id, "Appointment created");
        Ok(id)
    }

    async fn reserve(
        &self,
        appointment: NewAppointment,
        break_minutes: u32,
    ) -> Result<ReserveOutcome, DbError> {
        let row = self.encode(&appointment)?;
        let brk = i64::from(break_minutes);
        let window_end = row.end_minute + brk;
        let pool = self.db_client.pool();

        let result: Result<Option<i64>, sqlx::Error> = retry_busy("reserve", || {
            sqlx::query_scalar(RESERVE)
                .bind(row.client_name.as_str())
                .bind(row.email.as_str())
                .bind(row.phone.as_str())
                .bind(row.appointment_date.as_str())
                .bind(row.start_minute)
                .bind(row.end_minute)
                .bind(row.duration_minutes)
                .bind(row.focus_areas.as_str())
                .bind(row.pressure_preference)
                .bind(row.special_requests.as_deref())
                .bind(row.status)
                .bind(row.created_at.as_str())
                .bind(row.appointment_date.as_str())
                .bind(window_end)
                .bind(row.start_minute)
                .bind(brk)
                .fetch_optional(pool)
        })
        .await;

        match result {
            Ok(Some(id)) => {
                info!(
                    appointment_id = id,
                    date = %appointment.appointment_date,
                    start_minute = row.start_minute,
                    "Slot reserved"
                );
                Ok(ReserveOutcome::Reserved(id))
            }
            Ok(None) => {
                info!(
                    date = %appointment.appointment_date,
                    start_minute = row.start_minute,
                    "Slot already taken at commit time"
                );
                Ok(ReserveOutcome::Conflict)
            }
            Err(e) if is_unique_violation(&e) => {
                info!(
                    date = %appointment.appointment_date,
                    start_minute = row.start_minute,
                    "Slot start already taken (unique index)"
                );
                Ok(ReserveOutcome::Conflict)
            }
            Err(e) => {
                error!("Failed to reserve appointment: {}", e);
                Err(DbError::from_query(e))
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Appointment>, DbError> {
        debug!(appointment_id = id, "Fetching appointment");

        let query = format!("SELECT {} FROM appointments WHERE id = $1", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to fetch appointment: {}", e);
                DbError::from_query(e)
            })?;

        row.as_ref().map(|r| self.decode(r)).transpose()
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>, DbError> {
        debug!(?filter, "Listing appointments");

        let query = format!(
            "SELECT {} FROM appointments \
             WHERE ($1 IS NULL OR status = $2) \
               AND ($3 IS NULL OR appointment_date >= $4) \
               AND ($5 IS NULL OR appointment_date <= $6) \
             ORDER BY appointment_date DESC, start_minute DESC, id DESC",
            SELECT_COLUMNS
        );

        let status = filter.status.map(|s| s.as_str());
        let date_from = filter.date_from.map(|d| d.format("%Y-%m-%d").to_string());
        let date_to = filter.date_to.map(|d| d.format("%Y-%m-%d").to_string());

        let rows = sqlx::query(&query)
            .bind(status)
            .bind(status)
            .bind(date_from.as_deref())
            .bind(date_from.as_deref())
            .bind(date_to.as_deref())
            .bind(date_to.as_deref())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to list appointments: {}", e);
                DbError::from_query(e)
            })?;

        rows.iter().map(|row| self.decode(row)).collect()
    }

    async fn booked_intervals(&self, date: NaiveDate) -> Result<Vec<BookedInterval>, DbError> {
        let query = r#"
            SELECT id, start_minute, end_minute
            FROM appointments
            WHERE appointment_date = $1 AND status <> 'cancelled'
            ORDER BY start_minute
        "#;

        let rows = sqlx::query(query)
            .bind(date.format("%Y-%m-%d").to_string())
            .fetch_all(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to load booked intervals: {}", e);
                DbError::from_query(e)
            })?;

        rows.iter()
            .map(|row| {
                let id: i64 = column(row, "id")?;
                let start: i64 = column(row, "start_minute")?;
                let end: i64 = column(row, "end_minute")?;
                let bad = |_| DbError::CorruptRow(format!("appointment {}: minutes", id));
                Ok(BookedInterval {
                    id,
                    start_minute: u32::try_from(start).map_err(bad)?,
                    end_minute: u32::try_from(end).map_err(bad)?,
                })
            })
            .collect()
    }

    async fn update_status(
        &self,
        id: i64,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<bool, DbError> {
        debug!(appointment_id = id, %from, %to, "Updating appointment status");

        let pool = self.db_client.pool();
        let result = retry_busy("update_status", || {
            sqlx::query("UPDATE appointments SET status = $1 WHERE id = $2 AND status = $3")
                .bind(to.as_str())
                .bind(id)
                .bind(from.as_str())
                .execute(pool)
        })
        .await
        .map_err(|e| {
            error!("Failed to update appointment status: {}", e);
            DbError::from_query(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_external_calendar_id(
        &self,
        id: i64,
        external_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let pool = self.db_client.pool();
        let result = retry_busy("set_external_calendar_id", || {
            sqlx::query("UPDATE appointments SET external_calendar_id = $1 WHERE id = $2")
                .bind(external_id)
                .bind(id)
                .execute(pool)
        })
        .await
        .map_err(|e| {
            error!("Failed to store external calendar id: {}", e);
            DbError::from_query(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, DbError> {
        debug!(appointment_id = id, "Deleting appointment");

        let pool = self.db_client.pool();
        let result = retry_busy("delete", || {
            sqlx::query("DELETE FROM appointments WHERE id = $1")
                .bind(id)
                .execute(pool)
        })
        .await
        .map_err(|e| {
            error!("Failed to delete appointment: {}", e);
            DbError::from_query(e)
        })?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self, status: AppointmentStatus) -> Result<i64, DbError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(self.db_client.pool())
            .await
            .map_err(|e| {
                error!("Failed to count appointments: {}", e);
                DbError::from_query(e)
            })
    }
}

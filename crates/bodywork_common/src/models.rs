// --- File: crates/bodywork_common/src/models.rs ---

// Data structures shared by the store, the booking core and the HTTP layer.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Actor recorded for audit entries that no person triggered.
pub const SYSTEM_ACTOR: &str = "system";

/// Lifecycle state of an appointment.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Non-cancelled appointments occupy their slot.
    pub fn is_active(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" | "canceled" => Ok(AppointmentStatus::Cancelled),
            other => Err(format!("unknown appointment status '{}'", other)),
        }
    }
}

/// Massage pressure the client asked for.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressurePreference {
    Light,
    Medium,
    Firm,
    Deep,
}

impl PressurePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressurePreference::Light => "light",
            PressurePreference::Medium => "medium",
            PressurePreference::Firm => "firm",
            PressurePreference::Deep => "deep",
        }
    }
}

impl FromStr for PressurePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(PressurePreference::Light),
            "medium" => Ok(PressurePreference::Medium),
            "firm" => Ok(PressurePreference::Firm),
            "deep" => Ok(PressurePreference::Deep),
            other => Err(format!("unknown pressure preference '{}'", other)),
        }
    }
}

/// Minutes since midnight for a wall-clock time (seconds are dropped).
pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Inverse of [`minute_of_day`]. `None` for values past the end of the day.
pub fn time_from_minute(minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
}

/// Serializes times as `HH:MM`, the format clients submit.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}

/// A stored appointment with client details in clear text.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub client_name: String,
    pub email: String,
    pub phone: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date", example = "2030-01-07"))]
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "09:00"))]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "10:00"))]
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub focus_areas: Vec<String>,
    pub pressure_preference: Option<PressurePreference>,
    pub special_requests: Option<String>,
    pub status: AppointmentStatus,
    pub external_calendar_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: DateTime<Utc>,
}

/// An appointment that has not been persisted yet.
///
/// The end time is never stored here; it is derived from start and duration so the
/// two can not disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub client_name: String,
    pub email: String,
    pub phone: String,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub focus_areas: Vec<String>,
    pub pressure_preference: Option<PressurePreference>,
    pub special_requests: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl NewAppointment {
    pub fn start_minute(&self) -> u32 {
        minute_of_day(self.start_time)
    }

    pub fn end_minute(&self) -> u32 {
        self.start_minute() + self.duration_minutes
    }

    pub fn end_time(&self) -> NaiveTime {
        self.start_time + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Filters for listing appointments. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilter {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Number of appointments per status.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub confirmed: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// An append-only record of something that happened to a stored object.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    /// Assigned by the store.
    pub id: Option<i64>,
    pub action: String,
    /// User id or [`SYSTEM_ACTOR`].
    pub actor: String,
    pub object_type: String,
    pub object_id: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub details: serde_json::Value,
}

impl AuditLogEntry {
    pub fn new(
        action: impl Into<String>,
        actor: impl Into<String>,
        object_type: impl Into<String>,
        object_id: Option<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: None,
            action: action.into(),
            actor: actor.into(),
            object_type: object_type.into(),
            object_id,
            created_at: Utc::now(),
            details,
        }
    }
}

/// A single rejected input field.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

// --- File: crates/bodywork_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/bodywork.db, loaded via BODYWORK__DATABASE__URL
    /// Upper bound for the connection pool. In-memory SQLite always uses one connection.
    #[serde(default)]
    pub max_connections: Option<u32>,
}

/// A bookable window on a working day, e.g. 09:00-17:00.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimeBlock {
    /// Weekday number (0 = Sunday ... 6 = Saturday). `None` applies the block to every working day.
    #[serde(default)]
    pub day: Option<u8>,
    /// Start of the block, `HH:MM`.
    pub from: String,
    /// End of the block, `HH:MM`. Appointment plus break must end by this time.
    pub to: String,
}

/// A session length the practice offers, with its price.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DurationOption {
    /// Duration in minutes.
    pub minutes: u32,
    /// Price in the smallest currency unit (e.g. cents).
    pub price: i64,
    /// Optional currency code for this option, falls back to `BusinessHoursConfig::currency`.
    #[serde(default)]
    pub currency: Option<String>,
    /// Optional label shown to clients, e.g. "Deep Tissue (90 Min)".
    #[serde(default)]
    pub label: Option<String>,
}

// --- Business Hours Config ---
// Read on every availability check, written only by an administrator.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BusinessHoursConfig {
    /// Weekday numbers (0 = Sunday ... 6 = Saturday).
    pub working_days: Vec<u8>,
    pub time_blocks: Vec<TimeBlock>,
    pub duration_options: Vec<DurationOption>,
    /// Mandatory buffer after each appointment, in minutes.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
    /// Granularity of the open-slot listing, defaults to 15 minutes.
    #[serde(default)]
    pub slot_step_minutes: Option<u32>,
    /// IANA time zone of the practice, defaults to UTC.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Bookings must start at least this many minutes from now.
    #[serde(default)]
    pub min_notice_minutes: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

fn default_break_minutes() -> u32 {
    15
}

// --- PII Config ---
// The key is normally `secret_from_env` and injected from PII_ENCRYPTION_KEY.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PiiConfig {
    /// Base64 encoded 32 byte AES-256-GCM key.
    pub encryption_key: String,
}

#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub shared_secret: Option<String>, // Secret key loaded from env var: ADMIN_SHARED_SECRET
}

// --- Notification Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotificationConfig {
    /// Mail relay endpoint that accepts JSON messages.
    pub webhook_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
    pub practitioner_email: String,
    #[serde(default)]
    pub practitioner_name: Option<String>,
    /// Attempts per message, including the first one. Defaults to 2.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,
}

// --- External Calendar Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CalendarConfig {
    /// Collection URL; events are created with POST and removed with DELETE `{events_url}/{id}`.
    pub events_url: String,
    #[serde(default)]
    pub api_token: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_notifications: bool,
    #[serde(default)]
    pub use_calendar: bool,

    pub database: DatabaseConfig,
    pub business_hours: BusinessHoursConfig,
    pub pii: PiiConfig,
    #[serde(default)]
    pub admin: AdminConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub notifications: Option<NotificationConfig>,
    #[serde(default)]
    pub calendar: Option<CalendarConfig>,
}

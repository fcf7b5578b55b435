// File: crates/bodywork_booking/src/handlers.rs
use crate::admin::AppointmentAdminService;
use crate::auth::AdminActor;
use crate::availability::{AvailabilityError, SlotAvailability, SlotRequest};
use crate::booking::{BookingService, SideEffects};
use crate::hours::BusinessHours;
use crate::validation::{parse_duration, parse_slot_fields, BookingInput, Minutes};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    Extension,
};
use bodywork_common::error::{validation_error, BodyworkError};
use bodywork_common::models::{
    minute_of_day, time_from_minute, Appointment, AppointmentFilter, AppointmentStatus,
    AuditLogEntry, FieldError, StatusCounts,
};
use bodywork_db::DbClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_AUDIT_PAGE: u32 = 100;

// Shared state for all booking handlers
#[derive(Clone)]
pub struct BookingState {
    pub hours: Arc<BusinessHours>,
    pub checker: Arc<dyn SlotAvailability>,
    pub booking: Arc<BookingService>,
    pub admin: Arc<AppointmentAdminService>,
    pub db: DbClient,
}

// --- Request / response bodies ---

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub success: bool,
    pub appointment_id: i64,
    pub message: String,
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07"))]
    pub appointment_date: String,
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub start_time: String,
    #[cfg_attr(feature = "openapi", schema(example = "10:00"))]
    pub end_time: String,
    pub status: AppointmentStatus,
    pub side_effects: SideEffects,
}

/// Availability parameters, from the query string or a JSON body.
#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailabilityParams {
    #[cfg_attr(feature = "openapi", schema(example = "2030-01-07"))]
    pub date: Option<String>,
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub time: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<u32>, example = 60))]
    pub duration: Option<Minutes>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub available: bool,
    pub start_time: String,
    pub end_time: String,
    pub duration: u32,
    pub break_time: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OpenSlotsParams {
    pub date: Option<String>,
    pub duration: Option<Minutes>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OpenSlotsResponse {
    pub date: String,
    pub duration: u32,
    pub slots: Vec<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DurationOptionView {
    pub minutes: u32,
    /// Minor units, e.g. cents.
    pub price: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TimeBlockView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    pub from: String,
    pub to: String,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BookingOptionsResponse {
    pub durations: Vec<DurationOptionView>,
    pub break_minutes: u32,
    pub slot_step_minutes: u32,
    /// 0 = Sunday ... 6 = Saturday
    pub working_days: Vec<u8>,
    pub time_blocks: Vec<TimeBlockView>,
    pub time_zone: String,
    pub min_notice_minutes: i64,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub store: bool,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusUpdateRequest {
    #[cfg_attr(feature = "openapi", schema(example = "cancelled"))]
    pub status: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogParams {
    pub object_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

// --- Helpers ---

fn hhmm(minute: u32) -> String {
    time_from_minute(minute)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn rejected(field: &str, message: impl Into<String>) -> BodyworkError {
    validation_error(vec![FieldError::new(field, message)])
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, BodyworkError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| rejected("body", e.body_text()))
}

fn appointment_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, BodyworkError> {
    id.map(|Path(id)| id)
        .map_err(|_| rejected("id", "Appointment id must be a number"))
}

// --- Public handlers ---

/// Submit a booking.
#[axum::debug_handler]
pub async fn submit_booking_handler(
    State(state): State<Arc<BookingState>>,
    payload: Result<Json<BookingInput>, JsonRejection>,
) -> Result<Json<BookingResponse>, BodyworkError> {
    let input = json_body(payload)?;
    let outcome = state.booking.submit_booking(&input).await?;
    let appointment = outcome.appointment;

    Ok(Json(BookingResponse {
        success: true,
        appointment_id: appointment.id,
        message: "Your appointment has been booked.".to_string(),
        appointment_date: appointment.appointment_date.to_string(),
        start_time: appointment.start_time.format("%H:%M").to_string(),
        end_time: appointment.end_time.format("%H:%M").to_string(),
        status: appointment.status,
        side_effects: outcome.side_effects,
    }))
}

async fn check_availability(
    state: &BookingState,
    params: AvailabilityParams,
) -> Result<Json<AvailabilityResponse>, BodyworkError> {
    let mut errors = Vec::new();
    let (date, time) = parse_slot_fields(
        params.date.as_deref(),
        params.time.as_deref(),
        "date",
        "time",
        &mut errors,
    );
    let duration = parse_duration(params.duration.as_ref(), &state.hours, "duration", &mut errors);
    let (Some(date), Some(start), Some(duration_minutes)) = (date, time, duration) else {
        return Err(validation_error(errors));
    };

    let slot = SlotRequest {
        date,
        start,
        duration_minutes,
    };
    let start_minute = minute_of_day(start);
    let unavailable = |reason: String, code: &'static str| AvailabilityResponse {
        available: false,
        start_time: hhmm(start_minute),
        end_time: hhmm(start_minute + duration_minutes),
        duration: duration_minutes,
        break_time: state.hours.break_minutes,
        reason: Some(reason),
        code: Some(code.to_string()),
    };

    match state.checker.check(&slot).await {
        Ok(window) => Ok(Json(AvailabilityResponse {
            available: true,
            start_time: window.start_time.format("%H:%M").to_string(),
            end_time: window.end_time.format("%H:%M").to_string(),
            duration: window.duration,
            break_time: window.break_time,
            reason: None,
            code: None,
        })),
        Err(AvailabilityError::OutsideBusinessHours(reason)) => {
            Ok(Json(unavailable(reason, "outside_business_hours")))
        }
        Err(AvailabilityError::SlotConflict { .. }) => Ok(Json(unavailable(
            "This time is already booked.".to_string(),
            "slot_conflict",
        ))),
        Err(AvailabilityError::TooSoon { earliest }) => Ok(Json(unavailable(
            format!(
                "Bookings must start at or after {}.",
                earliest.format("%Y-%m-%d %H:%M")
            ),
            "too_soon",
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Check one slot, parameters in the query string.
#[axum::debug_handler]
pub async fn availability_query_handler(
    State(state): State<Arc<BookingState>>,
    params: Result<Query<AvailabilityParams>, QueryRejection>,
) -> Result<Json<AvailabilityResponse>, BodyworkError> {
    let Query(params) = params.map_err(|e| rejected("query", e.body_text()))?;
    check_availability(&state, params).await
}

/// Check one slot, parameters in a JSON body.
#[axum::debug_handler]
pub async fn availability_body_handler(
    State(state): State<Arc<BookingState>>,
    payload: Result<Json<AvailabilityParams>, JsonRejection>,
) -> Result<Json<AvailabilityResponse>, BodyworkError> {
    let params = json_body(payload)?;
    check_availability(&state, params).await
}

/// Open start times on one day.
#[axum::debug_handler]
pub async fn open_slots_handler(
    State(state): State<Arc<BookingState>>,
    params: Result<Query<OpenSlotsParams>, QueryRejection>,
) -> Result<Json<OpenSlotsResponse>, BodyworkError> {
    let Query(params) = params.map_err(|e| rejected("query", e.body_text()))?;

    let mut errors = Vec::new();
    let date = match params.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => match chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push(FieldError::new("date", "Use the format YYYY-MM-DD"));
                None
            }
        },
        None => {
            errors.push(FieldError::new("date", "This field is required"));
            None
        }
    };
    let duration = parse_duration(params.duration.as_ref(), &state.hours, "duration", &mut errors);
    let (Some(date), Some(duration)) = (date, duration) else {
        return Err(validation_error(errors));
    };

    let slots = state.checker.open_slots(date, duration).await?;
    info!(date = %date, duration, count = slots.len(), "Open slots computed");

    Ok(Json(OpenSlotsResponse {
        date: date.to_string(),
        duration,
        slots: slots
            .into_iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect(),
    }))
}

/// Durations, prices and opening hours for the booking form.
#[axum::debug_handler]
pub async fn booking_options_handler(
    State(state): State<Arc<BookingState>>,
) -> Json<BookingOptionsResponse> {
    let hours = &state.hours;
    Json(BookingOptionsResponse {
        durations: hours
            .duration_options()
            .iter()
            .map(|d| DurationOptionView {
                minutes: d.minutes,
                price: d.price,
                currency: d.currency.clone().unwrap_or_else(|| hours.currency.clone()),
                label: d.label.clone(),
            })
            .collect(),
        break_minutes: hours.break_minutes,
        slot_step_minutes: hours.slot_step_minutes,
        working_days: hours.working_days().collect(),
        time_blocks: hours
            .time_blocks()
            .map(|(day, range)| TimeBlockView {
                day,
                from: hhmm(range.from),
                to: hhmm(range.to),
            })
            .collect(),
        time_zone: hours.time_zone.name().to_string(),
        min_notice_minutes: hours.min_notice_minutes,
    })
}

/// Liveness plus a store round trip.
#[axum::debug_handler]
pub async fn health_handler(State(state): State<Arc<BookingState>>) -> Response {
    let store = state.db.is_healthy().await;
    if !store {
        warn!("Health check: schedule store unreachable");
    }
    let (code, status) = if store {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            store,
        }),
    )
        .into_response()
}

// --- Admin handlers ---

#[axum::debug_handler]
pub async fn list_appointments_handler(
    State(state): State<Arc<BookingState>>,
    filter: Result<Query<AppointmentFilter>, QueryRejection>,
) -> Result<Json<Vec<Appointment>>, BodyworkError> {
    let Query(filter) = filter.map_err(|e| rejected("query", e.body_text()))?;
    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        if from > to {
            return Err(rejected("dateFrom", "dateFrom must not be after dateTo"));
        }
    }
    Ok(Json(state.admin.list(&filter).await?))
}

#[axum::debug_handler]
pub async fn get_appointment_handler(
    State(state): State<Arc<BookingState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Appointment>, BodyworkError> {
    let id = appointment_id(id)?;
    Ok(Json(state.admin.get(id).await?))
}

#[axum::debug_handler]
pub async fn update_status_handler(
    State(state): State<Arc<BookingState>>,
    Extension(actor): Extension<AdminActor>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<Appointment>, BodyworkError> {
    let id = appointment_id(id)?;
    let body = json_body(payload)?;
    let status: AppointmentStatus = body
        .status
        .parse()
        .map_err(|_| rejected("status", "Use pending, confirmed or cancelled"))?;
    Ok(Json(state.admin.update_status(id, status, &actor.0).await?))
}

#[axum::debug_handler]
pub async fn delete_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Extension(actor): Extension<AdminActor>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, BodyworkError> {
    let id = appointment_id(id)?;
    state.admin.delete(id, &actor.0).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: format!("Appointment {} deleted", id),
    }))
}

#[axum::debug_handler]
pub async fn counts_handler(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<StatusCounts>, BodyworkError> {
    Ok(Json(state.admin.counts().await?))
}

#[axum::debug_handler]
pub async fn audit_log_handler(
    State(state): State<Arc<BookingState>>,
    params: Result<Query<AuditLogParams>, QueryRejection>,
) -> Result<Json<Vec<AuditLogEntry>>, BodyworkError> {
    let Query(params) = params.map_err(|e| rejected("query", e.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_AUDIT_PAGE);
    Ok(Json(
        state
            .admin
            .audit_trail(params.object_id.as_deref(), limit)
            .await?,
    ))
}

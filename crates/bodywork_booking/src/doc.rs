// File: crates/bodywork_booking/src/doc.rs

#![allow(dead_code)]
#![cfg(feature = "openapi")]
use crate::availability::SlotWindow;
use crate::booking::{SideEffectStatus, SideEffects};
use crate::handlers::{
    AvailabilityParams, AvailabilityResponse, BookingOptionsResponse, BookingResponse,
    DeleteResponse, DurationOptionView, HealthResponse, OpenSlotsResponse, StatusUpdateRequest,
    TimeBlockView,
};
use crate::validation::{BookingInput, FocusAreas, Minutes};
use bodywork_common::models::{
    Appointment, AppointmentStatus, AuditLogEntry, FieldError, PressurePreference, StatusCounts,
};
use utoipa::OpenApi;

#[utoipa::path(
    post,
    path = "/bookings",
    request_body(content = BookingInput, example = json!({
        "fullName": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+41 79 123 45 67",
        "appointmentDate": "2030-01-07",
        "startTime": "09:00",
        "duration": 60,
        "focusAreas": ["neck", "shoulders"],
        "pressurePreference": "medium"
    })),
    responses(
        (status = 200, description = "Appointment booked", body = BookingResponse),
        (status = 400, description = "Invalid input",
         example = json!({
             "success": false,
             "message": "Please check the following fields: email",
             "code": "validation_error",
             "errors": [{"field": "email", "message": "Please enter a valid email address"}]
         })
        ),
        (status = 404, description = "Outside business hours",
         example = json!({
             "success": false,
             "message": "We are closed on Saturdays.",
             "code": "outside_business_hours"
         })
        ),
        (status = 409, description = "Slot taken",
         example = json!({
             "success": false,
             "message": "The requested time is not available. Please choose another slot.",
             "code": "slot_conflict"
         })
        ),
        (status = 500, description = "Storage failure")
    ),
    tag = "Booking"
)]
fn doc_submit_booking_handler() {}

#[utoipa::path(
    get,
    path = "/availability",
    params(
        ("date" = String, Query, description = "Date in YYYY-MM-DD format", example = "2030-01-07", format = "date"),
        ("time" = String, Query, description = "Start time HH:MM", example = "09:00"),
        ("duration" = u32, Query, description = "Duration in minutes", example = 60)
    ),
    responses(
        (status = 200, description = "Availability of the slot", body = AvailabilityResponse),
        (status = 400, description = "Invalid parameters")
    ),
    tag = "Booking"
)]
fn doc_availability_query_handler() {}

#[utoipa::path(
    post,
    path = "/availability",
    request_body = AvailabilityParams,
    responses(
        (status = 200, description = "Availability of the slot", body = AvailabilityResponse),
        (status = 400, description = "Invalid parameters")
    ),
    tag = "Booking"
)]
fn doc_availability_body_handler() {}

#[utoipa::path(
    get,
    path = "/availability/slots",
    params(
        ("date" = String, Query, description = "Date in YYYY-MM-DD format", example = "2030-01-07", format = "date"),
        ("duration" = u32, Query, description = "Duration in minutes", example = 60)
    ),
    responses(
        (status = 200, description = "Open start times", body = OpenSlotsResponse),
        (status = 400, description = "Invalid parameters")
    ),
    tag = "Booking"
)]
fn doc_open_slots_handler() {}

#[utoipa::path(
    get,
    path = "/booking-options",
    responses((status = 200, description = "Durations, prices and opening hours", body = BookingOptionsResponse)),
    tag = "Booking"
)]
fn doc_booking_options_handler() {}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are up", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    ),
    tag = "Booking"
)]
fn doc_health_handler() {}

#[utoipa::path(
    get,
    path = "/admin/appointments",
    params(
        ("X-Admin-Secret" = String, Header, description = "Admin shared secret"),
        ("status" = Option<AppointmentStatus>, Query, description = "Only appointments with this status"),
        ("dateFrom" = Option<String>, Query, description = "Earliest date, inclusive", format = "date"),
        ("dateTo" = Option<String>, Query, description = "Latest date, inclusive", format = "date")
    ),
    responses(
        (status = 200, description = "Appointments, newest first", body = [Appointment]),
        (status = 401, description = "Missing or invalid secret")
    ),
    tag = "Admin"
)]
fn doc_list_appointments_handler() {}

#[utoipa::path(
    get,
    path = "/admin/appointments/{id}",
    params(
        ("X-Admin-Secret" = String, Header, description = "Admin shared secret"),
        ("id" = i64, Path, description = "Appointment id")
    ),
    responses(
        (status = 200, description = "The appointment", body = Appointment),
        (status = 404, description = "No such appointment")
    ),
    tag = "Admin"
)]
fn doc_get_appointment_handler() {}

#[utoipa::path(
    patch,
    path = "/admin/appointments/{id}/status",
    params(
        ("X-Admin-Secret" = String, Header, description = "Admin shared secret"),
        ("X-Actor-Id" = Option<String>, Header, description = "Recorded as the actor in the audit log"),
        ("id" = i64, Path, description = "Appointment id")
    ),
    request_body(content = StatusUpdateRequest, example = json!({"status": "cancelled"})),
    responses(
        (status = 200, description = "Updated appointment", body = Appointment),
        (status = 404, description = "No such appointment"),
        (status = 409, description = "Transition not allowed",
         example = json!({
             "success": false,
             "message": "Cannot change status from cancelled to confirmed",
             "code": "invalid_transition"
         })
        )
    ),
    tag = "Admin"
)]
fn doc_update_status_handler() {}

#[utoipa::path(
    delete,
    path = "/admin/appointments/{id}",
    params(
        ("X-Admin-Secret" = String, Header, description = "Admin shared secret"),
        ("X-Actor-Id" = Option<String>, Header, description = "Recorded as the actor in the audit log"),
        ("id" = i64, Path, description = "Appointment id")
    ),
    responses(
        (status = 200, description = "Appointment deleted", body = DeleteResponse),
        (status = 404, description = "No such appointment")
    ),
    tag = "Admin"
)]
fn doc_delete_appointment_handler() {}

#[utoipa::path(
    get,
    path = "/admin/appointments/counts",
    params(("X-Admin-Secret" = String, Header, description = "Admin shared secret")),
    responses((status = 200, description = "Appointments per status", body = StatusCounts)),
    tag = "Admin"
)]
fn doc_counts_handler() {}

#[utoipa::path(
    get,
    path = "/admin/audit-log",
    params(
        ("X-Admin-Secret" = String, Header, description = "Admin shared secret"),
        ("objectId" = Option<String>, Query, description = "Only entries for this appointment id"),
        ("limit" = Option<u32>, Query, description = "Maximum entries, capped at 500", example = 100)
    ),
    responses((status = 200, description = "Audit entries, newest first", body = [AuditLogEntry])),
    tag = "Admin"
)]
fn doc_audit_log_handler() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        doc_submit_booking_handler,
        doc_availability_query_handler,
        doc_availability_body_handler,
        doc_open_slots_handler,
        doc_booking_options_handler,
        doc_health_handler,
        doc_list_appointments_handler,
        doc_get_appointment_handler,
        doc_update_status_handler,
        doc_delete_appointment_handler,
        doc_counts_handler,
        doc_audit_log_handler
    ),
    components(
        schemas(
            BookingInput,
            Minutes,
            FocusAreas,
            BookingResponse,
            SideEffects,
            SideEffectStatus,
            AvailabilityParams,
            AvailabilityResponse,
            SlotWindow,
            OpenSlotsResponse,
            BookingOptionsResponse,
            DurationOptionView,
            TimeBlockView,
            HealthResponse,
            StatusUpdateRequest,
            DeleteResponse,
            Appointment,
            AppointmentStatus,
            PressurePreference,
            AuditLogEntry,
            StatusCounts,
            FieldError
        )
    ),
    tags(
        (name = "Booking", description = "Public booking API"),
        (name = "Admin", description = "Appointment administration")
    ),
    servers(
        (url = "/api", description = "Booking API server")
    )
)]
pub struct BookingApiDoc;

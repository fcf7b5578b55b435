//! Test fixtures for the booking API tests
//!
//! Builds the full router over an in-memory schedule store with a fixed clock.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use bodywork_booking::{
    routes, AppointmentAdminService, AvailabilityChecker, BookingService, BookingState,
    BusinessHours, SlotAvailability,
};
use bodywork_config::secrets::generate_key;
use bodywork_config::{BusinessHoursConfig, DurationOption, PiiCipher, TimeBlock};
use bodywork_db::{
    AppointmentRepository, AuditLogRepository, DbClient, SqlAppointmentRepository,
    SqlAuditLogRepository,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

pub const ADMIN_SECRET: &str = "test-admin-secret";

/// Creates the business hours used by every API test
pub fn create_hours_config() -> BusinessHoursConfig {
    BusinessHoursConfig {
        working_days: vec![1, 2, 3, 4, 5],
        time_blocks: vec![TimeBlock {
            day: None,
            from: "09:00".to_string(),
            to: "17:00".to_string(),
        }],
        duration_options: vec![
            DurationOption {
                minutes: 60,
                price: 9000,
                currency: None,
                label: Some("Classic massage".to_string()),
            },
            DurationOption {
                minutes: 90,
                price: 13000,
                currency: None,
                label: None,
            },
            DurationOption {
                minutes: 120,
                price: 17000,
                currency: Some("EUR".to_string()),
                label: None,
            },
        ],
        break_minutes: 15,
        slot_step_minutes: Some(15),
        time_zone: Some("Europe/Zurich".to_string()),
        min_notice_minutes: Some(120),
        currency: Some("CHF".to_string()),
    }
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub db: DbClient,
}

/// Creates the router over a fresh in-memory store
pub async fn create_test_app() -> TestApp {
    let db = DbClient::from_url("sqlite::memory:").await.unwrap();
    let cipher = Arc::new(PiiCipher::from_base64_key(&generate_key().unwrap()).unwrap());

    let appointments: Arc<dyn AppointmentRepository> =
        Arc::new(SqlAppointmentRepository::new(db.clone(), cipher));
    appointments.init_schema().await.unwrap();
    let audit: Arc<dyn AuditLogRepository> = Arc::new(SqlAuditLogRepository::new(db.clone()));
    audit.init_schema().await.unwrap();

    let hours = Arc::new(BusinessHours::from_config(&create_hours_config()).unwrap());
    let checker: Arc<dyn SlotAvailability> = Arc::new(
        AvailabilityChecker::new(hours.clone(), appointments.clone()).with_clock(fixed_now),
    );
    let booking = BookingService::new(
        hours.clone(),
        checker.clone(),
        appointments.clone(),
        audit.clone(),
    );
    let admin = AppointmentAdminService::new(appointments, audit, None);

    let state = Arc::new(BookingState {
        hours,
        checker,
        booking: Arc::new(booking),
        admin: Arc::new(admin),
        db: db.clone(),
    });

    TestApp {
        router: Router::new().nest("/api", routes(state, Some(ADMIN_SECRET.to_string()))),
        db,
    }
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Admin-Secret", ADMIN_SECRET)
        .header("X-Actor-Id", "therapist-1");
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A valid booking form for Monday 2030-01-07
pub fn booking_form(start: &str, duration: u32) -> Value {
    serde_json::json!({
        "fullName": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+41 79 123 45 67",
        "appointmentDate": "2030-01-07",
        "startTime": start,
        "duration": duration,
        "focusAreas": ["neck", "shoulders"],
        "pressurePreference": "medium",
        "specialRequests": "Quiet room please"
    })
}

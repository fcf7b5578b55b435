use crate::error::{config_error, validation_error, BodyworkError, HttpStatusCode};
use crate::models::{AppointmentStatus, FieldError};
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

async fn body_json(err: BodyworkError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn status_codes_match_error_kinds() {
    assert_eq!(validation_error(vec![]).status_code(), 400);
    assert_eq!(
        BodyworkError::OutsideBusinessHours("closed".into()).status_code(),
        404
    );
    assert_eq!(BodyworkError::SlotConflict("taken".into()).status_code(), 409);
    assert_eq!(
        BodyworkError::InvalidTransition("no".into()).status_code(),
        409
    );
    assert_eq!(BodyworkError::AuthError("no".into()).status_code(), 401);
    assert_eq!(BodyworkError::StorageError("disk".into()).status_code(), 500);
}

#[tokio::test]
async fn validation_errors_list_fields() {
    let err = validation_error(vec![
        FieldError::new("email", "Invalid email address"),
        FieldError::new("phone", "Phone is required"),
    ]);
    let (status, body) = body_json(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "validation_error");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    assert_eq!(body["errors"][0]["field"], "email");
    assert!(body["message"].as_str().unwrap().contains("phone"));
}

#[tokio::test]
async fn storage_errors_hide_detail() {
    let err = BodyworkError::StorageError("database is locked at /var/lib/bodywork.db".into());
    let (status, body) = body_json(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "storage_error");
    assert!(!body["message"].as_str().unwrap().contains("/var/lib"));
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn configuration_errors_are_generic_internal_errors() {
    let (status, body) = body_json(config_error("admin.shared_secret is not set")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "internal_error");
    assert!(!body["message"].as_str().unwrap().contains("shared_secret"));
}

#[tokio::test]
async fn conflict_keeps_message() {
    let (status, body) =
        body_json(BodyworkError::SlotConflict("This time is no longer available".into())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "slot_conflict");
    assert_eq!(body["message"], "This time is no longer available");
}

#[test]
fn status_parsing_accepts_american_spelling() {
    assert_eq!(
        "canceled".parse::<AppointmentStatus>().unwrap(),
        AppointmentStatus::Cancelled
    );
    assert_eq!(
        " Confirmed ".parse::<AppointmentStatus>().unwrap(),
        AppointmentStatus::Confirmed
    );
    assert!("done".parse::<AppointmentStatus>().is_err());
}

// --- File: crates/bodywork_booking/src/routes.rs ---

use crate::auth::{admin_auth_middleware, AdminAuthState};
use crate::handlers::{
    audit_log_handler, availability_body_handler, availability_query_handler,
    booking_options_handler, counts_handler, delete_appointment_handler, get_appointment_handler,
    health_handler, list_appointments_handler, open_slots_handler, submit_booking_handler,
    update_status_handler, BookingState,
};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

/// Public booking routes plus the admin routes behind the shared-secret middleware.
///
/// Paths are relative; the backend nests the router under `/api`.
pub fn routes(state: Arc<BookingState>, admin_secret: Option<String>) -> Router {
    let auth_state = Arc::new(AdminAuthState {
        shared_secret: admin_secret,
    });

    let admin = Router::new()
        .route("/admin/appointments", get(list_appointments_handler))
        .route("/admin/appointments/counts", get(counts_handler))
        .route(
            "/admin/appointments/{id}",
            get(get_appointment_handler).delete(delete_appointment_handler),
        )
        .route(
            "/admin/appointments/{id}/status",
            patch(update_status_handler),
        )
        .route("/admin/audit-log", get(audit_log_handler))
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/bookings", post(submit_booking_handler))
        .route(
            "/availability",
            get(availability_query_handler).post(availability_body_handler),
        )
        .route("/availability/slots", get(open_slots_handler))
        .route("/booking-options", get(booking_options_handler))
        .route("/health", get(health_handler))
        .merge(admin)
        .with_state(state)
}

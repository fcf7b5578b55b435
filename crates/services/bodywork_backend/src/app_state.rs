// --- File: crates/services/bodywork_backend/src/app_state.rs ---
use bodywork_booking::{
    AppointmentAdminService, AvailabilityChecker, BookingService, BookingState, BusinessHours,
    HoursError, RetryPolicy, SlotAvailability,
};
use bodywork_common::log_result;
use bodywork_common::services::ServiceFactory;
use bodywork_config::{AppConfig, PiiCipher, SecretError};
use bodywork_db::{
    AppointmentRepository, AppointmentRepositoryFactory, AuditLogRepository,
    AuditLogRepositoryFactory, DbClient, DbClientFactory, DbError, RepositoryFactory,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Anything that stops the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] bodywork_config::ConfigError),
    #[error("Invalid business hours: {0}")]
    Hours(#[from] HoursError),
    #[error("Invalid PII key: {0}")]
    Secret(#[from] SecretError),
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wires the store, the availability checker and the booking services into the
/// state shared by all booking routes.
pub async fn build_booking_state(
    config: &AppConfig,
    services: &dyn ServiceFactory,
) -> Result<Arc<BookingState>, StartupError> {
    let hours = Arc::new(BusinessHours::from_config(&config.business_hours)?);
    info!(
        working_days = ?hours.working_days().collect::<Vec<_>>(),
        time_zone = %hours.time_zone,
        "Business hours loaded"
    );

    let db = DbClientFactory::new().from_app_config(config).await?;
    let cipher = Arc::new(PiiCipher::from_base64_key(&config.pii.encryption_key)?);

    let appointments: Arc<dyn AppointmentRepository> =
        Arc::new(AppointmentRepositoryFactory::new(cipher).create_repository(db.clone()));
    log_result(
        appointments.init_schema().await,
        "Appointment schema ready",
        "Appointment schema setup failed",
    )?;
    let audit: Arc<dyn AuditLogRepository> =
        Arc::new(AuditLogRepositoryFactory::new().create_repository(db.clone()));
    log_result(
        audit.init_schema().await,
        "Audit log schema ready",
        "Audit log schema setup failed",
    )?;

    Ok(Arc::new(assemble(hours, db, appointments, audit, config, services)))
}

fn assemble(
    hours: Arc<BusinessHours>,
    db: DbClient,
    appointments: Arc<dyn AppointmentRepository>,
    audit: Arc<dyn AuditLogRepository>,
    config: &AppConfig,
    services: &dyn ServiceFactory,
) -> BookingState {
    let checker: Arc<dyn SlotAvailability> =
        Arc::new(AvailabilityChecker::new(hours.clone(), appointments.clone()));

    let booking = BookingService::new(
        hours.clone(),
        checker.clone(),
        appointments.clone(),
        audit.clone(),
    )
    .with_notifications(
        services.notification_service(),
        RetryPolicy::from_config(config.notifications.as_ref()),
    )
    .with_calendar(services.calendar_service());

    let admin = AppointmentAdminService::new(appointments, audit, services.calendar_service());

    BookingState {
        hours,
        checker,
        booking: Arc::new(booking),
        admin: Arc::new(admin),
        db,
    }
}

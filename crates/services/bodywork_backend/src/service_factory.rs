// --- File: crates/services/bodywork_backend/src/service_factory.rs ---
//! Service factory implementation.
//!
//! Builds the optional outbound collaborators from configuration. A collaborator is only
//! created when its `use_*` flag is on and its section is present.
use bodywork_common::services::{
    BoxedCalendarService, BoxedError, BoxedNotificationService, CalendarService,
    NotificationService, ServiceFactory,
};
use bodywork_common::{is_calendar_enabled, is_notifications_enabled};
use bodywork_config::AppConfig;
use bodywork_integrations::{HttpCalendarService, WebhookNotificationService};
use std::sync::Arc;
use tracing::info;

/// Holds the collaborators the booking service talks to after a reservation commits.
pub struct BodyworkServiceFactory {
    calendar_service: Option<Arc<dyn CalendarService<Error = BoxedError>>>,
    notification_service: Option<Arc<dyn NotificationService<Error = BoxedError>>>,
}

impl BodyworkServiceFactory {
    pub fn new(config: &AppConfig) -> Self {
        let notification_service = match config.notifications.as_ref() {
            Some(settings) if is_notifications_enabled(config) => {
                info!(url = %settings.webhook_url, "Initializing notification webhook");
                let service = BoxedNotificationService::new(WebhookNotificationService::new(
                    settings.clone(),
                ));
                Some(Arc::new(service) as Arc<dyn NotificationService<Error = BoxedError>>)
            }
            _ => {
                info!("Notifications disabled");
                None
            }
        };

        let calendar_service = match config.calendar.as_ref() {
            Some(settings) if is_calendar_enabled(config) => {
                info!(url = %settings.events_url, "Initializing external calendar");
                let service =
                    BoxedCalendarService::new(HttpCalendarService::new(settings.clone()));
                Some(Arc::new(service) as Arc<dyn CalendarService<Error = BoxedError>>)
            }
            _ => {
                info!("Calendar sync disabled");
                None
            }
        };

        Self {
            calendar_service,
            notification_service,
        }
    }
}

impl ServiceFactory for BodyworkServiceFactory {
    fn calendar_service(&self) -> Option<Arc<dyn CalendarService<Error = BoxedError>>> {
        self.calendar_service.clone()
    }

    fn notification_service(&self) -> Option<Arc<dyn NotificationService<Error = BoxedError>>> {
        self.notification_service.clone()
    }
}

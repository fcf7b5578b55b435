//! External calendar over a small REST contract.
//!
//! `POST {events_url}` with an event body answers `{"id": "..."}`;
//! `DELETE {events_url}/{id}` removes the event (404 counts as already gone).

use crate::error::{ensure_success, IntegrationError};
use bodywork_common::http::client::HTTP_CLIENT;
use bodywork_common::models::Appointment;
use bodywork_common::services::{BoxFuture, CalendarEventResult, CalendarService};
use bodywork_config::CalendarConfig;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SERVICE: &str = "calendar";

/// Event body sent to the calendar. Carries no client contact details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventRequest {
    pub summary: String,
    pub description: String,
    /// Local wall-clock time of the practice, `YYYY-MM-DDTHH:MM:SS`.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
    #[serde(default)]
    status: Option<String>,
}

impl CalendarEventRequest {
    pub fn from_appointment(appointment: &Appointment) -> Self {
        let mut description = format!("Duration: {} minutes", appointment.duration_minutes);
        if !appointment.focus_areas.is_empty() {
            description.push_str(&format!("\nFocus areas: {}", appointment.focus_areas.join(", ")));
        }
        if let Some(pressure) = appointment.pressure_preference {
            description.push_str(&format!("\nPressure: {}", pressure.as_str()));
        }

        Self {
            summary: format!("Massage appointment #{}", appointment.id),
            description,
            start: appointment.appointment_date.and_time(appointment.start_time),
            end: appointment.appointment_date.and_time(appointment.end_time),
            reference: format!("appointment-{}", appointment.id),
        }
    }
}

pub struct HttpCalendarService {
    client: reqwest::Client,
    config: CalendarConfig,
}

impl HttpCalendarService {
    pub fn new(config: CalendarConfig) -> Self {
        Self::with_client(HTTP_CLIENT.clone(), config)
    }

    pub fn with_client(client: reqwest::Client, config: CalendarConfig) -> Self {
        Self { client, config }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// `events_url` with the event id appended as one percent-encoded path segment.
    fn event_url(&self, event_id: &str) -> Result<reqwest::Url, IntegrationError> {
        let invalid = |detail: String| IntegrationError::InvalidUrl {
            service: SERVICE,
            detail,
        };
        if matches!(event_id, "" | "." | "..") {
            return Err(invalid(format!("event id {:?} is not a path segment", event_id)));
        }
        let mut url = reqwest::Url::parse(&self.config.events_url)
            .map_err(|e| invalid(format!("{}: {}", self.config.events_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} cannot take a path", self.config.events_url)))?
            .pop_if_empty()
            .push(event_id);
        Ok(url)
    }
}

impl CalendarService for HttpCalendarService {
    type Error = IntegrationError;

    fn create_event<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, CalendarEventResult, Self::Error> {
        Box::pin(async move {
            let body = CalendarEventRequest::from_appointment(appointment);
            debug!(appointment_id = appointment.id, "Creating calendar event");

            let response = self
                .authorize(self.client.post(&self.config.events_url).json(&body))
                .send()
                .await
                .map_err(IntegrationError::request(SERVICE))?;
            let response = ensure_success(SERVICE, response).await?;

            let created: CreatedEvent =
                response
                    .json()
                    .await
                    .map_err(|e| IntegrationError::UnexpectedResponse {
                        service: SERVICE,
                        detail: e.to_string(),
                    })?;

            info!(appointment_id = appointment.id, event_id = %created.id, "Calendar event created");
            Ok(CalendarEventResult {
                event_id: created.id,
                status: created.status.unwrap_or_else(|| "confirmed".to_string()),
            })
        })
    }

    fn delete_event<'a>(&'a self, event_id: &'a str) -> BoxFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let response = self
                .authorize(self.client.delete(self.event_url(event_id)?))
                .send()
                .await
                .map_err(IntegrationError::request(SERVICE))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                info!(event_id, "Calendar event already gone");
                return Ok(());
            }
            ensure_success(SERVICE, response).await?;

            info!(event_id, "Calendar event deleted");
            Ok(())
        })
    }
}

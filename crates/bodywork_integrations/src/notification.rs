//! Mail delivery through a JSON webhook (mail relay, transactional mail API).

use crate::error::{ensure_success, IntegrationError};
use bodywork_common::http::client::HTTP_CLIENT;
use bodywork_common::models::Appointment;
use bodywork_common::services::{BoxFuture, NotificationResult, NotificationService};
use bodywork_config::NotificationConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SERVICE: &str = "notification webhook";

/// One message handed to the relay.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub kind: &'static str,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_name: Option<String>,
    pub subject: String,
    pub text: String,
    pub appointment_id: i64,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Sends booking mail by POSTing [`OutboundMessage`]s to `notifications.webhook_url`.
pub struct WebhookNotificationService {
    client: reqwest::Client,
    config: NotificationConfig,
}

impl WebhookNotificationService {
    pub fn new(config: NotificationConfig) -> Self {
        Self::with_client(HTTP_CLIENT.clone(), config)
    }

    pub fn with_client(client: reqwest::Client, config: NotificationConfig) -> Self {
        Self { client, config }
    }

    async fn deliver(&self, message: OutboundMessage) -> Result<NotificationResult, IntegrationError> {
        debug!(kind = message.kind, appointment_id = message.appointment_id, "Posting mail to relay");

        let mut request = self.client.post(&self.config.webhook_url).json(&message);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(IntegrationError::request(SERVICE))?;
        let response = ensure_success(SERVICE, response).await?;

        // An empty or non-JSON body still counts as accepted.
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<RelayResponse> = serde_json::from_str(&body).ok();

        info!(kind = message.kind, appointment_id = message.appointment_id, "Mail accepted by relay");
        Ok(NotificationResult {
            id: parsed.as_ref().and_then(|r| r.id.clone()),
            status: parsed
                .and_then(|r| r.status)
                .unwrap_or_else(|| "accepted".to_string()),
        })
    }
}

fn describe(appointment: &Appointment) -> String {
    let mut lines = vec![
        format!("Date: {}", appointment.appointment_date.format("%A, %d %B %Y")),
        format!(
            "Time: {} - {}",
            appointment.start_time.format("%H:%M"),
            appointment.end_time.format("%H:%M")
        ),
        format!("Duration: {} minutes", appointment.duration_minutes),
    ];
    if !appointment.focus_areas.is_empty() {
        lines.push(format!("Focus areas: {}", appointment.focus_areas.join(", ")));
    }
    if let Some(pressure) = appointment.pressure_preference {
        lines.push(format!("Pressure: {}", pressure.as_str()));
    }
    if let Some(requests) = &appointment.special_requests {
        lines.push(format!("Special requests: {}", requests));
    }
    lines.join("\n")
}

/// Mail to the client confirming the booking.
pub fn client_confirmation(appointment: &Appointment) -> OutboundMessage {
    OutboundMessage {
        kind: "client_confirmation",
        to: appointment.email.clone(),
        to_name: Some(appointment.client_name.clone()),
        subject: format!(
            "Your massage appointment on {} at {}",
            appointment.appointment_date.format("%d.%m.%Y"),
            appointment.start_time.format("%H:%M")
        ),
        text: format!(
            "Dear {},\n\nthank you for your booking. Your appointment is {}.\n\n{}\n",
            appointment.client_name,
            appointment.status,
            describe(appointment)
        ),
        appointment_id: appointment.id,
    }
}

/// Mail to the practitioner announcing a new booking.
pub fn practitioner_notification(
    appointment: &Appointment,
    config: &NotificationConfig,
) -> OutboundMessage {
    OutboundMessage {
        kind: "practitioner_notification",
        to: config.practitioner_email.clone(),
        to_name: config.practitioner_name.clone(),
        subject: format!(
            "New booking #{}: {} {}",
            appointment.id,
            appointment.appointment_date.format("%d.%m.%Y"),
            appointment.start_time.format("%H:%M")
        ),
        text: format!(
            "Client: {}\nEmail: {}\nPhone: {}\n\n{}\n",
            appointment.client_name,
            appointment.email,
            appointment.phone,
            describe(appointment)
        ),
        appointment_id: appointment.id,
    }
}

impl NotificationService for WebhookNotificationService {
    type Error = IntegrationError;

    fn send_client_confirmation<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move { self.deliver(client_confirmation(appointment)).await })
    }

    fn send_practitioner_notification<'a>(
        &'a self,
        appointment: &'a Appointment,
    ) -> BoxFuture<'a, NotificationResult, Self::Error> {
        Box::pin(async move {
            self.deliver(practitioner_notification(appointment, &self.config))
                .await
        })
    }
}

// --- File: crates/bodywork_booking/src/auth.rs ---

use axum::{
    body::Body as AxumBody,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use bodywork_common::error::{config_error, BodyworkError};
use constant_time_eq::constant_time_eq;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const ADMIN_SECRET_HEADER: &str = "X-Admin-Secret";
pub const ACTOR_HEADER: &str = "X-Actor-Id";
pub const DEFAULT_ADMIN_ACTOR: &str = "admin";
const MAX_ACTOR_LEN: usize = 64;

/// State for the admin middleware: the configured shared secret, if any.
#[derive(Clone)]
pub struct AdminAuthState {
    pub shared_secret: Option<String>,
}

/// Who performed an admin request; recorded in audit entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminActor(pub String);

fn actor_from(req: &Request<AxumBody>) -> AdminActor {
    let actor = req
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
                .take(MAX_ACTOR_LEN)
                .collect::<String>()
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_ACTOR.to_string());
    AdminActor(actor)
}

/// Checks the `X-Admin-Secret` header against the configured secret and attaches
/// the [`AdminActor`] to the request.
pub async fn admin_auth_middleware(
    State(auth_state): State<Arc<AdminAuthState>>,
    mut req: Request<AxumBody>,
    next: Next,
) -> Response {
    let Some(expected) = auth_state.shared_secret.as_deref().filter(|s| !s.is_empty()) else {
        error!("Admin shared secret is not configured; rejecting admin request");
        return config_error("admin.shared_secret is not set").into_response();
    };

    let provided = req
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => {
            let actor = actor_from(&req);
            debug!(actor = %actor.0, "Admin request authenticated");
            req.extensions_mut().insert(actor);
            next.run(req).await
        }
        Some(_) => {
            warn!("Admin request with an invalid secret");
            BodyworkError::AuthError("Invalid credentials.".to_string()).into_response()
        }
        None => {
            warn!("Admin request without {} header", ADMIN_SECRET_HEADER);
            BodyworkError::AuthError(format!("Missing {} header.", ADMIN_SECRET_HEADER))
                .into_response()
        }
    }
}

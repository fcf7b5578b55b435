use thiserror::Error;

/// Errors from the outbound mail and calendar calls.
#[derive(Error, Debug)]
pub enum IntegrationError {
    /// The request could not be sent or the response could not be read
    #[error("{service} request failed: {source}")]
    RequestError {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The remote side answered with a non-success status
    #[error("{service} returned an error: {message} (Status: {status_code})")]
    ApiError {
        service: &'static str,
        status_code: u16,
        message: String,
    },

    /// The remote side answered 2xx but the body was not what we expect
    #[error("{service} returned an unexpected response: {detail}")]
    UnexpectedResponse {
        service: &'static str,
        detail: String,
    },

    /// A request URL could not be built from the configured base and the given id
    #[error("{service} URL is invalid: {detail}")]
    InvalidUrl {
        service: &'static str,
        detail: String,
    },
}

impl IntegrationError {
    pub(crate) fn request(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| IntegrationError::RequestError { service, source }
    }
}

/// Turns a non-2xx response into [`IntegrationError::ApiError`], keeping a bounded body excerpt.
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let mut message = response.text().await.unwrap_or_default();
    if message.len() > 200 {
        let mut cut = 200;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
    }
    Err(IntegrationError::ApiError {
        service,
        status_code: status.as_u16(),
        message,
    })
}

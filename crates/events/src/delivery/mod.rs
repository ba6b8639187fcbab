//! External delivery channels for completion notifications.

pub mod email;
pub mod push;

use std::time::Duration;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Delivery endpoint returned HTTP {0}")]
    HttpStatus(u16),
}

/// Build the HTTP client shared by the delivery channels.
pub(crate) fn http_client() -> Result<reqwest::Client, DeliveryError> {
    Ok(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// POST a JSON payload and check the response status.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    url: &str,
    api_key: Option<&str>,
    payload: &serde_json::Value,
) -> Result<(), DeliveryError> {
    let mut request = client.post(url).json(payload);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }
    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(DeliveryError::HttpStatus(response.status().as_u16()));
    }
    Ok(())
}

//! Shared HTTP plumbing for the REST providers

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::ports::FetchError;

/// Default per-request timeout for provider calls
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Longest response body echoed into an error message
const MAX_ERROR_BODY: usize = 300;

/// Build a client with an explicit request timeout
pub fn build_client(timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("mint-watcher/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))
}

fn truncate(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

/// Send a request and decode a JSON body
///
/// Transport failures, non-success statuses and undecodable bodies map to
/// distinct `FetchError` variants.
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder, timeout: Duration) -> Result<T, FetchError> {
    let response = request
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(e, timeout))?;

    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    decode_json(&body)
}

/// Decode a provider body, mapping shape errors to `MalformedResponse`
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(format!("{}: {}", e, truncate(body))))
}

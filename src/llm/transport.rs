//! HTTP transport for streaming completion requests.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::LlmError;
use crate::llm::registry::{ServiceDescriptor, parse_endpoint};

/// Longest error body kept in `HttpStatus`.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Sends completion requests and hands back the streaming response.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    /// Create a transport, optionally bounding each request's total duration.
    pub fn new(timeout: Option<Duration>) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(LlmError::Transport)?;
        Ok(Self { client })
    }

    /// POST `body` to the service and return the response once it is known
    /// to be a successful stream.
    ///
    /// # Errors
    ///
    /// * `InvalidUrl` / `InvalidHeader` when the request cannot be built
    /// * `Transport` on connection-level failure
    /// * `AuthFailure` on HTTP 401
    /// * `HttpStatus` on any other status than 200
    pub async fn send(
        &self,
        descriptor: &ServiceDescriptor,
        endpoint: &str,
        api_key: Option<&str>,
        body: Vec<u8>,
    ) -> Result<Response, LlmError> {
        let target = request_url(descriptor, endpoint)?;
        let headers = request_headers(descriptor, api_key)?;
        debug!(service = %descriptor.name, url = %target, bytes = body.len(), "sending completion request");

        let response = self
            .client
            .post(target)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(LlmError::Transport)?;

        check_status(response).await
    }
}

/// URL the request is sent to.
///
/// The configured endpoint is used as is, unless it has no path, in which
/// case the service's API path is appended.
pub fn request_url(descriptor: &ServiceDescriptor, endpoint: &str) -> Result<Url, LlmError> {
    let mut url = parse_endpoint(endpoint)?;
    if url.path().is_empty() || url.path() == "/" {
        url.set_path(&descriptor.api_path);
    }
    Ok(url)
}

/// Headers for a request to `descriptor`.
///
/// Applied in order: content type, the service's default headers, then the
/// auth header when both a key and an auth header are present.
pub fn request_headers(
    descriptor: &ServiceDescriptor,
    api_key: Option<&str>,
) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in &descriptor.default_headers {
        insert_header(&mut headers, name, value)?;
    }

    let api_key = api_key.filter(|k| !k.is_empty());
    if let (Some(key), Some(auth)) = (api_key, &descriptor.auth) {
        insert_header(&mut headers, &auth.name, &auth.value_for(key))?;
    }

    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), LlmError> {
    let invalid = || LlmError::InvalidHeader {
        name: name.to_string(),
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    headers.insert(header_name, header_value);
    Ok(())
}

async fn check_status(response: Response) -> Result<Response, LlmError> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::UNAUTHORIZED => {
            warn!("LLM API rejected credentials");
            Err(LlmError::AuthFailure)
        }
        status => {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, "failed to read error response body");
                    String::new()
                }
            };
            let body: String = body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect();
            warn!(status = status.as_u16(), "LLM API request failed");
            Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

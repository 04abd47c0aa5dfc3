//! Production HTTP backend on `reqwest::blocking`.
//!
//! One call is one request: no retries, no pooling guarantees, and no
//! timeout. A slow pipeline on a large image runs until the service answers;
//! callers that want a deadline pass their own client to
//! [`ReqwestBackend::with_client`].
//!
//! | Concern | Crate / function |
//! |---|---|
//! | Multipart body | `reqwest::blocking::multipart::Form::file` (streamed from disk) |
//! | Request parameters | `RequestBuilder::query` |
//! | Extra headers (auth etc.) | `ClientBuilder::default_headers` |

use super::backend::{HttpBackend, RawResponse, UploadRequest};
use crate::error::{ImaginaryError, Result};
use reqwest::blocking::{Client, ClientBuilder, multipart};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

/// Name of the multipart part carrying the source image.
pub const FILE_PART: &str = "file";

pub struct ReqwestBackend {
    client: Client,
}

/// `reqwest::blocking` defaults to a 30s timeout; lift it.
fn untimed() -> ClientBuilder {
    Client::builder().timeout(None)
}

impl ReqwestBackend {
    pub fn new() -> Self {
        // The builder only fails where `Client::new` would panic.
        let client = untimed().build().unwrap_or_else(|_| Client::new());
        Self { client }
    }

    /// Wrap a caller-configured client (TLS, proxies, timeouts).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Build a client that sends `headers` on every request.
    pub fn with_headers<'a>(
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ImaginaryError::Configuration(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ImaginaryError::Configuration(format!("invalid header value: {e}")))?;
            map.insert(name, value);
        }
        let client = untimed().default_headers(map).build()?;
        Ok(Self { client })
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpBackend for ReqwestBackend {
    fn post_multipart(&self, request: &UploadRequest) -> Result<RawResponse> {
        let form = multipart::Form::new().file(FILE_PART, &request.file)?;

        let response = self
            .client
            .post(&request.url)
            .query(&request.query)
            .multipart(form)
            .send()?;

        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        debug!(url = %request.url, status, bytes = body.len(), "response received");

        Ok(RawResponse { status, body })
    }
}

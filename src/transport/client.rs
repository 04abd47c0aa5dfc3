//! Transport: endpoint configuration, request assembly and status mapping.
//!
//! The endpoint is a value held by each [`ImaginaryClient`], not process-wide
//! state, so independent clients can point at different services.

use super::backend::{HttpBackend, RawResponse, UploadRequest};
use super::reqwest_backend::ReqwestBackend;
use crate::config::ClientConfig;
use crate::error::{ImaginaryError, Result};
use crate::pipeline::Pipeline;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Remote routes this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Apply an operation list; the body is the processed image.
    Pipeline,
    /// Describe the uploaded image; the body is a JSON object.
    Info,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URI of the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEndpoint(String);

impl ServiceEndpoint {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_set(&self) -> bool {
        !self.0.trim().is_empty()
    }

    /// Full URL for `route`, with exactly one `/` between base and route.
    pub fn url_for(&self, route: &str) -> Result<String> {
        if !self.is_set() {
            return Err(ImaginaryError::Configuration(
                "Service imaginary uri not set".into(),
            ));
        }
        Ok(format!(
            "{}/{}",
            self.0.trim().trim_end_matches('/'),
            route.trim_start_matches('/')
        ))
    }
}

impl From<&str> for ServiceEndpoint {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for ServiceEndpoint {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// Client for one imaginary service.
pub struct ImaginaryClient<B: HttpBackend = ReqwestBackend> {
    endpoint: ServiceEndpoint,
    backend: B,
}

impl ImaginaryClient<ReqwestBackend> {
    pub fn new(endpoint: impl Into<ServiceEndpoint>) -> Self {
        Self::with_backend(endpoint, ReqwestBackend::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.service_uri.as_str())
    }
}

impl<B: HttpBackend> ImaginaryClient<B> {
    pub fn with_backend(endpoint: impl Into<ServiceEndpoint>, backend: B) -> Self {
        Self {
            endpoint: endpoint.into(),
            backend,
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn set_endpoint(&mut self, endpoint: impl Into<ServiceEndpoint>) {
        self.endpoint = endpoint.into();
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start an empty pipeline bound to this client.
    pub fn pipeline(&self) -> Pipeline<'_, B> {
        Pipeline::new(self)
    }

    /// Upload `file` to `route` with `params` as request parameters.
    ///
    /// Succeeds only on HTTP 200. Any other status, including other 2xx
    /// codes, becomes [`ImaginaryError::Remote`] with the body text.
    pub fn send(
        &self,
        route: &str,
        file: &Path,
        params: &[(&str, String)],
    ) -> Result<RawResponse> {
        let url = self.endpoint.url_for(route)?;
        let request = UploadRequest {
            url,
            file: file.to_path_buf(),
            query: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };

        debug!(url = %request.url, file = %file.display(), "sending request");
        let response = self.backend.post_multipart(&request)?;

        if !response.is_success() {
            let body = response.text();
            warn!(url = %request.url, status = response.status, %body, "service responded error");
            return Err(ImaginaryError::Remote {
                status: response.status,
                body,
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::backend::tests::MockBackend;

    #[test]
    fn url_joins_with_single_slash() {
        let with_slash = ServiceEndpoint::new("http://localhost:9000/");
        let without = ServiceEndpoint::new("http://localhost:9000");
        assert_eq!(
            with_slash.url_for("pipeline").unwrap(),
            "http://localhost:9000/pipeline"
        );
        assert_eq!(without.url_for("/info").unwrap(), "http://localhost:9000/info");
    }

    #[test]
    fn url_keeps_base_path() {
        let endpoint = ServiceEndpoint::new("https://img.example.com/imaginary");
        assert_eq!(
            endpoint.url_for("pipeline").unwrap(),
            "https://img.example.com/imaginary/pipeline"
        );
    }

    #[test]
    fn unset_endpoint_fails_before_backend() {
        let backend = MockBackend::new();
        let client = ImaginaryClient::with_backend("", &backend);

        let err = client
            .send("pipeline", Path::new("/tmp/a.jpg"), &[])
            .unwrap_err();

        assert!(matches!(err, ImaginaryError::Configuration(_)));
        assert!(backend.get_requests().is_empty());
    }

    #[test]
    fn blank_endpoint_is_unset() {
        assert!(!ServiceEndpoint::new("   ").is_set());
        assert!(ServiceEndpoint::new("http://x").is_set());
    }

    #[test]
    fn endpoint_is_checked_on_every_send() {
        let backend = MockBackend::responding(200, Vec::new());
        let mut client = ImaginaryClient::with_backend("http://imaginary", &backend);
        assert!(client.send("info", Path::new("/tmp/a.jpg"), &[]).is_ok());

        client.set_endpoint("");
        let err = client.send("info", Path::new("/tmp/a.jpg"), &[]).unwrap_err();
        assert!(matches!(err, ImaginaryError::Configuration(_)));
        assert_eq!(backend.get_requests().len(), 1);
    }

    #[test]
    fn send_builds_request() {
        let backend = MockBackend::responding(200, b"img".to_vec());
        let client = ImaginaryClient::with_backend("http://imaginary:9000", &backend);

        let response = client
            .send(
                "pipeline",
                Path::new("/tmp/a.jpg"),
                &[("operations", "[]".to_string())],
            )
            .unwrap();

        assert_eq!(response.body, b"img");
        let requests = backend.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://imaginary:9000/pipeline");
        assert_eq!(requests[0].file, Path::new("/tmp/a.jpg"));
        assert_eq!(
            requests[0].query,
            vec![("operations".to_string(), "[]".to_string())]
        );
    }

    #[test]
    fn non_200_maps_to_remote_error_unchanged() {
        let body = b"{\"message\":\"Unsupported operation\"}".to_vec();
        let backend = MockBackend::responding(400, body);
        let client = ImaginaryClient::with_backend("http://imaginary", &backend);

        let err = client
            .send("pipeline", Path::new("/tmp/a.jpg"), &[])
            .unwrap_err();

        match err {
            ImaginaryError::Remote { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "{\"message\":\"Unsupported operation\"}");
            }
            other => panic!("expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn other_2xx_is_failure() {
        let backend = MockBackend::responding(204, Vec::new());
        let client = ImaginaryClient::with_backend("http://imaginary", &backend);

        let err = client.send("info", Path::new("/tmp/a.jpg"), &[]).unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[test]
    fn route_names() {
        assert_eq!(Route::Pipeline.to_string(), "pipeline");
        assert_eq!(Route::Info.as_str(), "info");
    }

    #[test]
    fn client_from_config_uses_service_uri() {
        let config = ClientConfig {
            service_uri: "http://imaginary:9000".into(),
            ..ClientConfig::default()
        };
        let client = ImaginaryClient::from_config(&config);
        assert_eq!(client.endpoint().as_str(), "http://imaginary:9000");
    }
}

//! HTTP backend trait and shared request/response types.
//!
//! The [`HttpBackend`] trait is the one seam between this crate and the
//! network: it performs a single multipart POST and reports the raw status and
//! body. It does not interpret the status; that is the
//! [`ImaginaryClient`](super::client::ImaginaryClient)'s job, so every backend
//! maps errors the same way.
//!
//! The production implementation is
//! [`ReqwestBackend`](super::reqwest_backend::ReqwestBackend).

use crate::error::Result;
use std::path::PathBuf;

/// One multipart upload: the file goes in the `file` part, `query` is sent as
/// request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub url: String,
    pub file: PathBuf,
    pub query: Vec<(String, String)>,
}

/// Status and body exactly as the service returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for HTTP backends.
pub trait HttpBackend: Sync {
    /// Issue one blocking multipart POST. Implementations return `Ok` for any
    /// HTTP status and `Err` only when no response was obtained.
    fn post_multipart(&self, request: &UploadRequest) -> Result<RawResponse>;
}

impl<B: HttpBackend + ?Sized> HttpBackend for &B {
    fn post_multipart(&self, request: &UploadRequest) -> Result<RawResponse> {
        (**self).post_multipart(request)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records requests and replays canned responses.
    /// Uses Mutex (not RefCell) so it is Sync like the real backend.
    #[derive(Default)]
    pub struct MockBackend {
        pub responses: Mutex<Vec<RawResponse>>,
        pub requests: Mutex<Vec<UploadRequest>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to every request with `status` and `body`, in order. The
        /// last response is reused once the queue runs dry.
        pub fn responding(status: u16, body: impl Into<Vec<u8>>) -> Self {
            Self {
                responses: Mutex::new(vec![RawResponse {
                    status,
                    body: body.into(),
                }]),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn get_requests(&self) -> Vec<UploadRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// The `operations` query value of the last request.
        pub fn last_operations(&self) -> Option<String> {
            self.requests.lock().unwrap().last().and_then(|r| {
                r.query
                    .iter()
                    .find(|(k, _)| k == "operations")
                    .map(|(_, v)| v.clone())
            })
        }
    }

    impl HttpBackend for MockBackend {
        fn post_multipart(&self, request: &UploadRequest) -> Result<RawResponse> {
            self.requests.lock().unwrap().push(request.clone());

            let mut responses = self.responses.lock().unwrap();
            let response = if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses.first().cloned().unwrap_or(RawResponse {
                    status: 200,
                    body: Vec::new(),
                })
            };
            Ok(response)
        }
    }

    #[test]
    fn mock_records_requests() {
        let backend = MockBackend::responding(200, b"ok".to_vec());
        let request = UploadRequest {
            url: "http://imaginary/pipeline".into(),
            file: "/tmp/a.jpg".into(),
            query: vec![("operations".into(), "[]".into())],
        };

        let response = backend.post_multipart(&request).unwrap();
        assert_eq!(response.body, b"ok");
        assert_eq!(backend.get_requests(), vec![request]);
        assert_eq!(backend.last_operations().as_deref(), Some("[]"));
    }

    #[test]
    fn mock_replays_queue_then_repeats_last() {
        let backend = MockBackend::new();
        *backend.responses.lock().unwrap() = vec![
            RawResponse {
                status: 500,
                body: b"boom".to_vec(),
            },
            RawResponse {
                status: 200,
                body: b"fine".to_vec(),
            },
        ];
        let request = UploadRequest {
            url: "http://imaginary/info".into(),
            file: "/tmp/a.jpg".into(),
            query: Vec::new(),
        };

        assert_eq!(backend.post_multipart(&request).unwrap().status, 500);
        assert_eq!(backend.post_multipart(&request).unwrap().status, 200);
        assert_eq!(backend.post_multipart(&request).unwrap().status, 200);
    }

    #[test]
    fn only_200_is_success() {
        for status in [201, 204, 301, 400, 500] {
            let response = RawResponse {
                status,
                body: Vec::new(),
            };
            assert!(!response.is_success(), "{status} must not count as success");
        }
        assert!(
            RawResponse {
                status: 200,
                body: Vec::new()
            }
            .is_success()
        );
    }

    #[test]
    fn text_is_lossy() {
        let response = RawResponse {
            status: 400,
            body: vec![b'b', b'a', b'd', 0xff],
        };
        assert_eq!(response.text(), "bad\u{fffd}");
    }
}

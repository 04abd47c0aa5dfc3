//! Transport to the remote service.
//!
//! The module is split into:
//! - **Backend**: [`HttpBackend`] trait + request/response types
//! - **Reqwest backend**: [`ReqwestBackend`], the blocking production backend
//! - **Client**: [`ImaginaryClient`], which owns the endpoint and turns
//!   non-200 responses into errors

pub mod backend;
pub mod client;
pub mod reqwest_backend;

pub use backend::{HttpBackend, RawResponse, UploadRequest};
pub use client::{ImaginaryClient, Route, ServiceEndpoint};
pub use reqwest_backend::ReqwestBackend;

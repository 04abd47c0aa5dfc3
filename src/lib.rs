//! # imaginary-client
//!
//! A client for the [imaginary](https://github.com/h2non/imaginary) image
//! processing service. Build an ordered pipeline of operations, upload the
//! source image together with the encoded pipeline, and get back either the
//! processed image or a metadata report.
//!
//! No pixels are touched locally: every transform runs on the service.
//!
//! # Architecture
//!
//! ```text
//! Pipeline  ──operations JSON + file──▶  ImaginaryClient  ──POST multipart──▶  service
//!    │                                        │
//!    └──────── ImaginaryResource ◀── 200 body ┘   (non-200 → ImaginaryError::Remote)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Fluent builder: one method per operation, `execute` and `info` |
//! | [`operation`] | Operation kinds, option maps and the JSON wire format |
//! | [`transport`] | Endpoint handling, the [`HttpBackend`] seam and the reqwest backend |
//! | [`resource`] | Materializing response bytes into a temp file or memory buffer |
//! | [`config`] | `imaginary.toml` loading and validation |
//! | [`error`] | The [`ImaginaryError`] type |
//! | [`cli`] | `--op` argument parsing for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Endpoint Per Client
//!
//! The service address lives in each [`ImaginaryClient`], so two clients can
//! talk to two services and tests can point a client at a mock backend. It is
//! still checked on every send: an empty address fails with a configuration
//! error before anything touches the network.
//!
//! ## Passthrough Parameters
//!
//! Optional parameters are merged over required ones and may replace them.
//! Values are not range-checked; the service is the authority on what it
//! accepts and reports rejections as [`ImaginaryError::Remote`] with its
//! status and body.
//!
//! ## One Attempt Per Call
//!
//! Sends are blocking and are never retried. A failed send means no
//! operation was applied.

pub mod cli;
pub mod config;
pub mod error;
pub mod operation;
pub mod output;
pub mod pipeline;
pub mod resource;
pub mod transport;

pub use error::{ImaginaryError, Result};
pub use operation::{FORMAT_JPEG, FORMAT_PNG, FORMAT_WEBP, Operation, OperationKind, Options};
pub use pipeline::Pipeline;
pub use resource::{ImaginaryResource, MemoryStore, ResourceLocation, ResourceStore, TempFileStore};
pub use transport::{HttpBackend, ImaginaryClient, ReqwestBackend, ServiceEndpoint};

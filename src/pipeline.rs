//! Pipeline builder.
//!
//! A [`Pipeline`] accumulates an ordered list of operations and an upload
//! file, then submits both to the service in one request:
//!
//! ```no_run
//! use imaginary_client::{ImaginaryClient, Options, FORMAT_WEBP};
//!
//! let client = ImaginaryClient::new("http://localhost:9000");
//! let image = client
//!     .pipeline()
//!     .resize(800, 600, None)
//!     .blur(1.5, Options::new().set("minampl", 0.2))
//!     .convert(FORMAT_WEBP, None)
//!     .upload_file("/tmp/a.jpg")
//!     .execute()?;
//! let bytes = image.content()?;
//! # Ok::<(), imaginary_client::ImaginaryError>(())
//! ```
//!
//! Each convenience method writes the operation's required parameters and
//! then merges the optional ones on top; an optional key that repeats a
//! required one replaces its value. Parameter values are not range-checked
//! here: the service rejects what it cannot apply.

use crate::error::{ImaginaryError, Result};
use crate::operation::{Operation, OperationKind, Options, encode_operations};
use crate::resource::{ImaginaryResource, ResourceStore, TempFileStore};
use crate::transport::{HttpBackend, ImaginaryClient, RawResponse, ReqwestBackend, Route};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the request parameter carrying the encoded operation list.
pub const OPERATIONS_PARAM: &str = "operations";

/// An ordered list of operations plus the file they apply to.
pub struct Pipeline<'c, B: HttpBackend = ReqwestBackend> {
    client: &'c ImaginaryClient<B>,
    operations: Vec<Operation>,
    upload: Option<PathBuf>,
}

impl<'c, B: HttpBackend> Pipeline<'c, B> {
    pub fn new(client: &'c ImaginaryClient<B>) -> Self {
        Self {
            client,
            operations: Vec::new(),
            upload: None,
        }
    }

    /// Set the image to upload. Existence is checked when the pipeline is
    /// submitted, not here; a later call replaces the earlier path.
    pub fn upload_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload = Some(path.into());
        self
    }

    pub fn upload_path(&self) -> Option<&Path> {
        self.upload.as_deref()
    }

    /// Append an operation by name. Use this for kinds without a convenience
    /// method; the same kind may be added any number of times.
    pub fn add_operation(
        mut self,
        name: impl Into<String>,
        options: impl Into<Option<Options>>,
    ) -> Self {
        let params = options.into().map(Options::into_map).unwrap_or_default();
        self.operations.push(Operation::new(name, params));
        self
    }

    fn push(
        mut self,
        kind: OperationKind,
        required: impl IntoIterator<Item = (&'static str, Value)>,
        options: Option<Options>,
    ) -> Self {
        self.operations
            .push(Operation::merged(kind.as_str(), required, options));
        self
    }

    pub fn crop(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Crop, dims(width, height), options.into())
    }

    pub fn smart_crop(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::SmartCrop, dims(width, height), options.into())
    }

    pub fn resize(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Resize, dims(width, height), options.into())
    }

    pub fn enlarge(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Enlarge, dims(width, height), options.into())
    }

    /// Extract the `area_width` x `area_height` area whose top-left corner is
    /// at (`left`, `top`).
    pub fn extract(
        self,
        top: u32,
        left: u32,
        area_width: u32,
        area_height: u32,
        options: impl Into<Option<Options>>,
    ) -> Self {
        self.push(
            OperationKind::Extract,
            [
                ("top", Value::from(top)),
                ("left", Value::from(left)),
                ("areawidth", Value::from(area_width)),
                ("areaheight", Value::from(area_height)),
            ],
            options.into(),
        )
    }

    pub fn zoom(self, factor: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Zoom, [("factor", Value::from(factor))], options.into())
    }

    pub fn thumbnail(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Thumbnail, dims(width, height), options.into())
    }

    pub fn fit(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Fit, dims(width, height), options.into())
    }

    /// Rotate by `degrees`; the service accepts multiples of 90.
    pub fn rotate(self, degrees: i32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Rotate, [("rotate", Value::from(degrees))], options.into())
    }

    pub fn flip(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Flip, dims(width, height), options.into())
    }

    pub fn flop(self, width: u32, height: u32, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Flop, dims(width, height), options.into())
    }

    /// Convert to `format`, e.g. [`FORMAT_WEBP`](crate::operation::FORMAT_WEBP).
    pub fn convert(self, format: &str, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Convert, [("type", Value::from(format))], options.into())
    }

    pub fn watermark(self, text: &str, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Watermark, [("text", Value::from(text))], options.into())
    }

    /// Overlay the image at `image_url`. The service fetches it itself, so
    /// this must be a URL reachable from the service, not a local path.
    pub fn watermark_image(
        self,
        image_url: &str,
        top: u32,
        left: u32,
        options: impl Into<Option<Options>>,
    ) -> Self {
        self.push(
            OperationKind::WatermarkImage,
            [
                ("image", Value::from(image_url)),
                ("top", Value::from(top)),
                ("left", Value::from(left)),
            ],
            options.into(),
        )
    }

    pub fn blur(self, sigma: f64, options: impl Into<Option<Options>>) -> Self {
        self.push(OperationKind::Blur, [("sigma", Value::from(sigma))], options.into())
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The `operations` parameter exactly as it will be sent.
    pub fn operations_json(&self) -> Result<String> {
        encode_operations(&self.operations)
    }

    /// Run the pipeline and keep the processed image in a temporary file.
    pub fn execute(&self) -> Result<ImaginaryResource> {
        self.execute_into(&TempFileStore::new())
    }

    /// Run the pipeline and materialize the processed image through `store`.
    pub fn execute_into(&self, store: &impl ResourceStore) -> Result<ImaginaryResource> {
        let response = self.submit(Route::Pipeline)?;
        ImaginaryResource::new(response.body, store)
    }

    /// Ask the service to describe the uploaded image.
    pub fn info(&self) -> Result<Map<String, Value>> {
        let response = self.submit(Route::Info)?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    fn submit(&self, route: Route) -> Result<RawResponse> {
        let path = self.upload.as_deref().unwrap_or(Path::new(""));
        if !path.is_file() {
            return Err(ImaginaryError::Input {
                path: path.to_path_buf(),
            });
        }

        let operations = self.operations_json()?;
        debug!(%route, count = self.operations.len(), "submitting pipeline");
        self.client
            .send(route.as_str(), path, &[(OPERATIONS_PARAM, operations)])
    }
}

fn dims(width: u32, height: u32) -> [(&'static str, Value); 2] {
    [("width", Value::from(width)), ("height", Value::from(height))]
}

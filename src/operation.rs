//! Operation model and wire format.
//!
//! An [`Operation`] is one named transform step plus its parameters. These
//! types describe *what* the remote service should do; the
//! [`pipeline`](crate::pipeline) module decides the order, and the
//! [`transport`](crate::transport) carries them over the wire.
//!
//! ## Wire format
//!
//! A pipeline is sent as a compact JSON array, one record per operation, in
//! application order:
//!
//! ```text
//! [{"operation":"resize","params":{"width":800,"height":600}},
//!  {"operation":"convert","params":{"type":"webp"}}]
//! ```
//!
//! Parameter maps keep insertion order, so the same sequence of builder
//! calls always encodes to the same bytes.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub const FORMAT_JPEG: &str = "jpeg";
pub const FORMAT_PNG: &str = "png";
pub const FORMAT_WEBP: &str = "webp";

/// The operation kinds the remote pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Crop,
    SmartCrop,
    Resize,
    Enlarge,
    Extract,
    Zoom,
    Thumbnail,
    Fit,
    Rotate,
    Flip,
    Flop,
    Convert,
    Watermark,
    WatermarkImage,
    Blur,
}

impl OperationKind {
    pub const ALL: [OperationKind; 15] = [
        Self::Crop,
        Self::SmartCrop,
        Self::Resize,
        Self::Enlarge,
        Self::Extract,
        Self::Zoom,
        Self::Thumbnail,
        Self::Fit,
        Self::Rotate,
        Self::Flip,
        Self::Flop,
        Self::Convert,
        Self::Watermark,
        Self::WatermarkImage,
        Self::Blur,
    ];

    /// Canonical name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::SmartCrop => "smartcrop",
            Self::Resize => "resize",
            Self::Enlarge => "enlarge",
            Self::Extract => "extract",
            Self::Zoom => "zoom",
            Self::Thumbnail => "thumbnail",
            Self::Fit => "fit",
            Self::Rotate => "rotate",
            Self::Flip => "flip",
            Self::Flop => "flop",
            Self::Convert => "convert",
            Self::Watermark => "watermark",
            Self::WatermarkImage => "watermarkImage",
            Self::Blur => "blur",
        }
    }

    /// Names of the required parameters, in the order they are written.
    pub fn required_params(self) -> &'static [&'static str] {
        match self {
            Self::Crop
            | Self::SmartCrop
            | Self::Resize
            | Self::Enlarge
            | Self::Thumbnail
            | Self::Fit
            | Self::Flip
            | Self::Flop => &["width", "height"],
            Self::Extract => &["top", "left", "areawidth", "areaheight"],
            Self::Zoom => &["factor"],
            Self::Rotate => &["rotate"],
            Self::Convert => &["type"],
            Self::Watermark => &["text"],
            Self::WatermarkImage => &["image", "top", "left"],
            Self::Blur => &["sigma"],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperation(pub String);

impl fmt::Display for UnknownOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operation '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperation {}

impl FromStr for OperationKind {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // `watermarkimage` is how the service documents the standalone route.
        if s == "watermarkimage" {
            return Ok(Self::WatermarkImage);
        }
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// Caller-supplied parameters merged on top of an operation's required ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any earlier value under the same key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Options {
    type Error = Value;

    /// Only JSON objects convert; anything else is handed back unchanged.
    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single named transform step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operation")]
    pub name: String,
    pub params: Map<String, Value>,
}

impl Operation {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Build an operation from its required parameters overlaid by optional
    /// ones. On a key collision the optional value wins but the key keeps the
    /// position it had among the required parameters.
    pub fn merged(
        name: impl Into<String>,
        required: impl IntoIterator<Item = (&'static str, Value)>,
        optional: Option<Options>,
    ) -> Self {
        let mut params: Map<String, Value> = required
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        if let Some(optional) = optional {
            for (key, value) in optional.into_map() {
                params.insert(key, value);
            }
        }
        Self::new(name, params)
    }

    /// The known kind for this operation's name, if any.
    pub fn kind(&self) -> Option<OperationKind> {
        self.name.parse().ok()
    }
}

/// Encode operations as the compact JSON array the service expects.
pub fn encode_operations(operations: &[Operation]) -> Result<String> {
    Ok(serde_json::to_string(operations)?)
}

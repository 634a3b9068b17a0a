//! Error types for the certificate capture pipeline

use thiserror::Error;

use crate::share::ShareTarget;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while producing the vector snapshot of a capture target.
///
/// Any of these aborts the pipeline; a snapshot is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The target is unmounted or has nothing to render
    #[error("capture target is detached")]
    Detached,

    /// An embedded resource cannot be inlined (cross-origin without CORS permission)
    #[error("unsupported external resource: {0}")]
    UnsupportedResource(String),

    /// An allowed resource failed to load
    #[error("failed to load resource {0}: {1}")]
    ResourceLoad(String, String),

    /// The fragment could not be laid out
    #[error("layout failed: {0}")]
    Layout(String),
}

/// Errors raised while decoding the snapshot or encoding the raster output
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error("failed to decode vector snapshot: {0}")]
    Decode(String),

    #[error("failed to encode raster image: {0}")]
    Encode(String),
}

/// Errors raised while turning a data URL into a share payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("not a data URL")]
    NotDataUrl,

    #[error("data URL has no ',' separating header and body")]
    MissingComma,

    #[error("invalid base64 body: {0}")]
    Base64(String),

    #[error("invalid percent escape at byte {0}")]
    PercentEncoding(usize),
}

/// Errors reported by platform collaborators (file saving, share sheet, clipboard)
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("platform rejected the request: {0}")]
    Rejected(String),
}

/// Errors raised by the share dispatcher
#[derive(Error, Debug)]
pub enum ShareError {
    /// The action is not offered in the current dispatcher state
    #[error("share target {0:?} is not available")]
    Unavailable(ShareTarget),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("failed to build share URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Errors raised by the product search client
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("search API returned status {0}")]
    Status(u16),

    #[error("failed to decode search response: {0}")]
    Decode(String),
}

/// Errors surfaced by the certificate view's download action
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    /// The view was unmounted while the capture was in flight
    #[error("certificate view was unmounted during capture")]
    Unmounted,

    #[error("failed to save certificate: {0}")]
    Save(#[from] PlatformError),
}

/// Invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Any error produced by this crate
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

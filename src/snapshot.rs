//! Capture targets and the vector snapshot producer.
//!
//! A [`CaptureTarget`] is the rendered certificate node: a markup fragment
//! plus its on-screen pixel box. [`SvgSnapshotProducer`] lays the fragment
//! out, inlines every embedded image and serializes the result to a
//! self-contained SVG data URL.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{FutureExt, LocalBoxFuture};
use log::debug;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::CaptureConfig;
use crate::error::SnapshotError;
use crate::payload::encode_data_url;
use crate::platform::{NoResourceLoader, ResourceLoader};
use crate::rendering::layout::layout_fragment;
use crate::rendering::paint::{paint_layout, to_svg};

/// Shared mounted/unmounted flag of a capture target
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Liveness(Arc::new(AtomicBool::new(true)))
    }
}

/// The renderable certificate region
#[derive(Debug, Clone)]
pub struct CaptureTarget {
    html: String,
    width: u32,
    height: u32,
    base_url: Option<Url>,
    liveness: Liveness,
}

impl CaptureTarget {
    /// A mounted target of `width` x `height` device-independent pixels
    pub fn new(html: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            html: html.into(),
            width,
            height,
            base_url: None,
            liveness: Liveness::default(),
        }
    }

    /// Page URL the fragment is rendered in; resolves relative image sources
    /// and defines the same origin.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.liveness.is_mounted()
    }
}

/// Self-contained vector image of a capture target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSnapshot {
    data_url: String,
    width: u32,
    height: u32,
}

impl VectorSnapshot {
    pub fn from_svg(svg: &str, width: u32, height: u32) -> Self {
        Self::from_data_url(encode_data_url("image/svg+xml", svg.as_bytes()), width, height)
    }

    pub fn from_data_url(data_url: String, width: u32, height: u32) -> Self {
        Self { data_url, width, height }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Width of the source node in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the source node in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Hex SHA-256 of the data URL
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.data_url.as_bytes()))
    }
}

/// Produces a vector snapshot of a capture target without mutating it.
pub trait SnapshotProducer {
    fn snapshot<'a>(
        &'a self,
        target: &'a CaptureTarget,
    ) -> LocalBoxFuture<'a, Result<VectorSnapshot, SnapshotError>>;
}

enum ImageSource {
    Inline,
    Fetch(Url),
}

/// Default producer: layout → display list → SVG data URL
pub struct SvgSnapshotProducer {
    loader: Box<dyn ResourceLoader>,
    allowed_origins: Vec<String>,
}

impl SvgSnapshotProducer {
    /// A producer that refuses to fetch images; only inline `data:` images
    /// can be captured until a loader is installed with `with_loader`.
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            loader: Box::new(NoResourceLoader),
            allowed_origins: config
                .cors_allowed_origins
                .iter()
                .map(|o| o.trim_end_matches('/').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    fn classify(&self, src: &str, base: Option<&Url>) -> Result<ImageSource, SnapshotError> {
        if src.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("data:")) {
            return Ok(ImageSource::Inline);
        }
        let unsupported = || SnapshotError::UnsupportedResource(src.to_string());
        let url = match base {
            Some(base) => base.join(src),
            None => Url::parse(src),
        }
        .map_err(|_| unsupported())?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(unsupported());
        }
        let same_origin = base.map(|b| b.origin() == url.origin()).unwrap_or(false);
        let origin = url.origin().ascii_serialization();
        if same_origin || self.allowed_origins.iter().any(|o| *o == origin) {
            Ok(ImageSource::Fetch(url))
        } else {
            Err(unsupported())
        }
    }

    async fn inline_image(&self, src: &str, base: Option<&Url>) -> Result<String, SnapshotError> {
        match self.classify(src, base)? {
            ImageSource::Inline => Ok(src.to_string()),
            ImageSource::Fetch(url) => {
                let res = self
                    .loader
                    .load(&url)
                    .await
                    .map_err(|e| SnapshotError::ResourceLoad(url.to_string(), e))?;
                debug!("inlined {} ({}, {} bytes)", url, res.mime, res.bytes.len());
                Ok(encode_data_url(&res.mime, &res.bytes))
            }
        }
    }

    async fn render(&self, target: &CaptureTarget) -> Result<VectorSnapshot, SnapshotError> {
        if !target.is_mounted() {
            return Err(SnapshotError::Detached);
        }

        let mut layout = layout_fragment(target.html(), target.width(), target.height())?;
        for src in layout.image_sources_mut() {
            *src = self.inline_image(src, target.base_url()).await?;
        }

        let svg = to_svg(layout.width, layout.height, &paint_layout(&layout));
        let snapshot = VectorSnapshot::from_svg(&svg, target.width(), target.height());
        debug!(
            "snapshot {}x{}: {} bytes, sha256 {}",
            snapshot.width(),
            snapshot.height(),
            snapshot.data_url().len(),
            snapshot.digest()
        );
        Ok(snapshot)
    }
}

impl SnapshotProducer for SvgSnapshotProducer {
    fn snapshot<'a>(
        &'a self,
        target: &'a CaptureTarget,
    ) -> LocalBoxFuture<'a, Result<VectorSnapshot, SnapshotError>> {
        self.render(target).boxed_local()
    }
}

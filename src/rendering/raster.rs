//! Progressive raster encoder.
//!
//! Decodes a vector snapshot, draws it onto an opaque off-screen surface at
//! `oversample` times the target size and re-encodes the surface as a PNG
//! data URL once per frame. The loop stops redrawing when the encoded length
//! exceeds the size ceiling (treated as "sufficient fidelity") or when
//! `max_frames` is reached, and the result is finalized when the time budget
//! elapses.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use log::{debug, info, warn};
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use tokio::time::Instant;

use crate::config::CaptureConfig;
use crate::error::RasterError;
use crate::payload::{encode_data_url, parse_data_url};
use crate::platform::{FrameScheduler, IntervalFrames};
use crate::snapshot::VectorSnapshot;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A decoded vector snapshot, ready to be drawn at any size
pub struct DecodedImage {
    tree: usvg::Tree,
}

impl DecodedImage {
    pub fn width(&self) -> f32 {
        self.tree.size().width()
    }

    pub fn height(&self) -> f32 {
        self.tree.size().height()
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Decode a vector snapshot. Resolves once, either with the image or with
/// the reason it could not be loaded.
pub async fn decode_snapshot(snapshot: &VectorSnapshot) -> Result<DecodedImage, RasterError> {
    let parsed =
        parse_data_url(snapshot.data_url()).map_err(|e| RasterError::Decode(e.to_string()))?;
    if parsed.mime != "image/svg+xml" {
        return Err(RasterError::Decode(format!(
            "unexpected snapshot type {:?}",
            parsed.mime
        )));
    }

    let options = usvg::Options {
        fontdb: font_database(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_data(&parsed.bytes, &options)
        .map_err(|e| RasterError::Decode(e.to_string()))?;

    // parsing can be heavy; give other tasks a turn before drawing starts
    tokio::task::yield_now().await;
    Ok(DecodedImage { tree })
}

/// An off-screen 2D drawing surface
pub trait DrawingSurface {
    /// Surface size in pixels
    fn size(&self) -> (u32, u32);

    /// Draw `image` scaled to fill the surface. Draws accumulate; the surface
    /// is never cleared between frames.
    fn draw(&mut self, image: &DecodedImage);

    /// Encode the current surface contents as PNG bytes
    fn encode_png(&self) -> Result<Vec<u8>, RasterError>;
}

/// Hands out drawing surfaces; `None` means no drawing context is available.
pub trait SurfaceProvider {
    fn acquire(&self, width: u32, height: u32) -> Option<Box<dyn DrawingSurface>>;
}

/// Opaque `tiny-skia` surface, encoded without an alpha channel
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    /// Returns `None` when the pixmap cannot be allocated (zero or oversized).
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        pixmap.fill(Color::WHITE);
        Some(Self { pixmap })
    }
}

impl DrawingSurface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn draw(&mut self, image: &DecodedImage) {
        let (w, h) = self.size();
        let sx = w as f32 / image.width().max(1.0);
        let sy = h as f32 / image.height().max(1.0);
        resvg::render(&image.tree, Transform::from_scale(sx, sy), &mut self.pixmap.as_mut());
    }

    fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        let (w, h) = self.size();
        // opaque surface: premultiplied RGBA equals straight RGB, drop alpha
        let rgb: Vec<u8> = self
            .pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let mut buf = Vec::new();
        PngEncoder::new_with_quality(&mut buf, CompressionType::Default, FilterType::Adaptive)
            .write_image(&rgb, w, h, ExtendedColorType::Rgb8)
            .map_err(|e| RasterError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// Default provider backed by `PixmapSurface`
#[derive(Debug, Default, Clone, Copy)]
pub struct PixmapSurfaces;

impl SurfaceProvider for PixmapSurfaces {
    fn acquire(&self, width: u32, height: u32) -> Option<Box<dyn DrawingSurface>> {
        PixmapSurface::new(width, height).map(|s| Box::new(s) as Box<dyn DrawingSurface>)
    }
}

/// How the encode loop terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The encoded size exceeded the ceiling before the deadline
    FidelityReached,
    /// The time budget (or frame bound) ran out first
    TimedOut,
}

/// A finalized PNG data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterResult {
    data_url: String,
    width: u32,
    height: u32,
    frames: u32,
    outcome: EncodeOutcome,
}

impl RasterResult {
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Length of the data URL in bytes
    pub fn byte_len(&self) -> usize {
        self.data_url.len()
    }

    /// Output size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of redraws performed
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn outcome(&self) -> EncodeOutcome {
        self.outcome
    }
}

/// Length of the base64 PNG data URL for `png_len` bytes of PNG
fn data_url_len(png_len: usize) -> usize {
    PNG_DATA_URL_PREFIX.len() + png_len.div_ceil(3) * 4
}

/// Rasterizes vector snapshots; see the module docs for the loop contract.
pub struct RasterEncoder {
    surfaces: Box<dyn SurfaceProvider>,
    frames: Box<dyn FrameScheduler>,
    oversample: u32,
    size_ceiling: usize,
    timeout: Duration,
    max_frames: u32,
}

impl RasterEncoder {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            surfaces: Box::new(PixmapSurfaces),
            frames: Box::new(IntervalFrames::new(config.frame_interval())),
            oversample: config.oversample,
            size_ceiling: config.size_ceiling,
            timeout: config.timeout(),
            max_frames: config.max_frames.max(1),
        }
    }

    pub fn with_surfaces(mut self, surfaces: impl SurfaceProvider + 'static) -> Self {
        self.surfaces = Box::new(surfaces);
        self
    }

    pub fn with_frames(mut self, frames: impl FrameScheduler + 'static) -> Self {
        self.frames = Box::new(frames);
        self
    }

    /// Output surface size for a `width` x `height` source, `None` on overflow
    pub fn surface_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        Some((width.checked_mul(self.oversample)?, height.checked_mul(self.oversample)?))
    }

    /// Rasterize `snapshot`.
    ///
    /// Returns `Ok(None)` when no drawing surface can be acquired; callers
    /// treat that as "no image available".
    pub async fn encode(
        &self,
        snapshot: &VectorSnapshot,
    ) -> Result<Option<RasterResult>, RasterError> {
        let surface = self
            .surface_size(snapshot.width(), snapshot.height())
            .and_then(|(w, h)| self.surfaces.acquire(w, h));
        let Some(mut surface) = surface else {
            warn!(
                "no drawing surface for {}x{} snapshot; skipping raster",
                snapshot.width(),
                snapshot.height()
            );
            return Ok(None);
        };

        let image = decode_snapshot(snapshot).await?;
        let started = Instant::now();
        let deadline = started + self.timeout;

        let mut frames = 0u32;
        let reached = {
            let redraw = self.redraw_until_fidelity(surface.as_mut(), &image, &mut frames);
            tokio::select! {
                res = redraw => res?,
                _ = tokio::time::sleep_until(deadline) => false,
            }
        };

        tokio::time::sleep_until(deadline).await;
        let png = surface.encode_png()?;
        let data_url = encode_data_url("image/png", &png);
        let outcome = if reached {
            EncodeOutcome::FidelityReached
        } else {
            EncodeOutcome::TimedOut
        };
        let (width, height) = surface.size();

        info!(
            "rasterized {}x{} in {} frame(s): {:?}, {} bytes after {:?}",
            width,
            height,
            frames,
            outcome,
            data_url.len(),
            started.elapsed()
        );
        Ok(Some(RasterResult { data_url, width, height, frames, outcome }))
    }

    async fn redraw_until_fidelity(
        &self,
        surface: &mut dyn DrawingSurface,
        image: &DecodedImage,
        frames: &mut u32,
    ) -> Result<bool, RasterError> {
        loop {
            surface.draw(image);
            *frames += 1;
            let len = data_url_len(surface.encode_png()?.len());
            debug!("frame {}: encoded {} bytes", frames, len);
            if len > self.size_ceiling {
                return Ok(true);
            }
            if *frames >= self.max_frames {
                return Ok(false);
            }
            self.frames.next_frame().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{FutureExt, LocalBoxFuture};
    use std::cell::Cell;
    use std::rc::Rc;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="#ff0000"/></svg>"##;

    #[derive(Clone, Default)]
    struct CountingFrames(Rc<Cell<u32>>);

    impl FrameScheduler for CountingFrames {
        fn next_frame(&self) -> LocalBoxFuture<'_, ()> {
            self.0.set(self.0.get() + 1);
            futures::future::ready(()).boxed_local()
        }
    }

    struct NoSurfaces;

    impl SurfaceProvider for NoSurfaces {
        fn acquire(&self, _: u32, _: u32) -> Option<Box<dyn DrawingSurface>> {
            None
        }
    }

    /// Surface whose encoded size grows by `step` bytes per draw
    struct GrowingSurface {
        draws: u32,
        step: usize,
    }

    impl DrawingSurface for GrowingSurface {
        fn size(&self) -> (u32, u32) {
            (1, 1)
        }

        fn draw(&mut self, _: &DecodedImage) {
            self.draws += 1;
        }

        fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
            Ok(vec![0u8; self.draws as usize * self.step])
        }
    }

    struct GrowingSurfaces(usize);

    impl SurfaceProvider for GrowingSurfaces {
        fn acquire(&self, _: u32, _: u32) -> Option<Box<dyn DrawingSurface>> {
            Some(Box::new(GrowingSurface { draws: 0, step: self.0 }))
        }
    }

    #[test]
    fn data_url_len_matches_encoding() {
        for n in [0usize, 1, 2, 3, 4, 100] {
            assert_eq!(data_url_len(n), encode_data_url("image/png", &vec![7u8; n]).len());
        }
    }

    #[test]
    fn surface_size_oversamples_and_detects_overflow() {
        let enc = RasterEncoder::new(&CaptureConfig::default());
        assert_eq!(enc.surface_size(400, 600), Some((800, 1200)));
        assert_eq!(enc.surface_size(u32::MAX, 1), None);
    }

    #[tokio::test(start_paused = true)]
    async fn produces_opaque_png_at_twice_the_size() {
        let snapshot = VectorSnapshot::from_svg(SVG, 20, 10);
        let enc = RasterEncoder::new(&CaptureConfig::default());
        let started = Instant::now();
        let result = enc.encode(&snapshot).await.unwrap().expect("surface available");

        assert!(result.data_url().starts_with(PNG_DATA_URL_PREFIX));
        assert_eq!(result.size(), (40, 20));
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(result.outcome(), EncodeOutcome::TimedOut);

        let png = parse_data_url(result.data_url()).unwrap().bytes;
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
        let px = decoded.to_rgb8().get_pixel(20, 10).0;
        assert!(px[0] > 200 && px[1] < 50 && px[2] < 50, "expected red, got {:?}", px);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_surface_is_empty_result() {
        let frames = CountingFrames::default();
        let snapshot = VectorSnapshot::from_svg(SVG, 20, 10);
        let enc = RasterEncoder::new(&CaptureConfig::default())
            .with_surfaces(NoSurfaces)
            .with_frames(frames.clone());
        assert_eq!(enc.encode(&snapshot).await.unwrap(), None);
        assert_eq!(frames.0.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_sized_target_has_no_surface() {
        let snapshot = VectorSnapshot::from_svg(SVG, 0, 10);
        let enc = RasterEncoder::new(&CaptureConfig::default());
        assert_eq!(enc.encode(&snapshot).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_redrawing_once_ceiling_exceeded() {
        let frames = CountingFrames::default();
        let cfg = CaptureConfig { size_ceiling: 10_000, ..Default::default() };
        let enc = RasterEncoder::new(&cfg)
            .with_surfaces(GrowingSurfaces(3000))
            .with_frames(frames.clone());
        let result = enc
            .encode(&VectorSnapshot::from_svg(SVG, 20, 10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.outcome(), EncodeOutcome::FidelityReached);
        assert_eq!(result.frames(), 3);
        assert_eq!(frames.0.get(), 2);
        assert!(result.byte_len() > 10_000);
    }

    #[tokio::test(start_paused = true)]
    async fn instant_scheduler_is_bounded_by_max_frames() {
        let frames = CountingFrames::default();
        let cfg = CaptureConfig { max_frames: 5, ..Default::default() };
        let enc = RasterEncoder::new(&cfg)
            .with_surfaces(GrowingSurfaces(1))
            .with_frames(frames.clone());
        let started = Instant::now();
        let result = enc
            .encode(&VectorSnapshot::from_svg(SVG, 20, 10))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.frames(), 5);
        assert_eq!(frames.0.get(), 4);
        assert_eq!(result.outcome(), EncodeOutcome::TimedOut);
        assert!(result.byte_len() <= cfg.size_ceiling);
        assert!(started.elapsed() >= cfg.timeout());
    }

    #[tokio::test]
    async fn decode_rejects_non_svg_snapshot() {
        let snapshot = VectorSnapshot::from_data_url(encode_data_url("image/png", b"x"), 1, 1);
        let err = decode_snapshot(&snapshot).await.unwrap_err();
        assert!(matches!(err, RasterError::Decode(_)));
    }
}

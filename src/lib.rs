//! certshot: certificate capture and sharing
//!
//! Converts the rendered savings certificate (a markup fragment with a pixel
//! box) into a size-bounded PNG data URL, entirely in-process, and wires the
//! result into a file download and a share dispatcher.
//!
//! # Pipeline
//!
//! - [`snapshot`]: markup fragment → self-contained SVG data URL
//! - [`rendering::raster`]: SVG → opaque 2x PNG, re-encoded once per frame
//!   until the size ceiling or the time budget is reached
//! - [`payload`]: PNG data URL → named binary file for native share
//! - [`share`]: native share sheet or the four fallback share actions
//! - [`certificate`]: the view controller tying the steps together
//!
//! # Example
//!
//! ```no_run
//! use certshot::{CaptureConfig, CaptureTarget, CertificateView};
//! use certshot::platform::{DirectorySaver, RecordingPlatform};
//!
//! # async fn run() -> certshot::Result<()> {
//! let config = CaptureConfig::default();
//! let target = CaptureTarget::new("<div><h1>임명장</h1></div>", 400, 600);
//! let mut view = CertificateView::new(target, &config);
//! let platform = RecordingPlatform::new(false);
//! let outcome = view.download(&DirectorySaver::new("out"), &platform).await?;
//! println!("{:?}, share via {:?}", outcome, view.share().actions());
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod config;
pub mod error;
pub mod payload;
pub mod platform;
pub mod rendering;
pub mod search;
pub mod share;
pub mod snapshot;
pub mod store;

pub use certificate::{CertificateView, DownloadOutcome};
pub use config::{CaptureConfig, ShareMessage};
pub use error::{
    ConversionError, Error, PipelineError, RasterError, Result, ShareError, SnapshotError,
};
pub use payload::{to_share_payload, PayloadNaming, SharePayload};
pub use rendering::{EncodeOutcome, RasterEncoder, RasterResult};
pub use share::{ShareDispatcher, ShareState, ShareTarget};
pub use snapshot::{CaptureTarget, SnapshotProducer, SvgSnapshotProducer, VectorSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CaptureConfig::default();
        assert_eq!(config.oversample, 2);
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.max_frames, 64);
    }

    #[test]
    fn test_capture_target() {
        let target = CaptureTarget::new("<div></div>", 400, 600);
        assert_eq!(target.width(), 400);
        assert_eq!(target.height(), 600);
        assert!(target.is_mounted());
    }

    #[test]
    fn test_errors_convert_into_crate_error() {
        fn payload_of(raw: &str) -> Result<Option<SharePayload>> {
            Ok(to_share_payload(raw, &PayloadNaming::default())?)
        }
        assert!(matches!(
            payload_of("https://sobisa.test/a.png"),
            Err(Error::Conversion(ConversionError::NotDataUrl))
        ));
        assert_eq!(payload_of("").unwrap(), None);
    }
}

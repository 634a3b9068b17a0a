//! Certificate view controller.
//!
//! Owns the capture target and runs snapshot → raster at most once per view
//! lifetime; the memoized result feeds both the file download and the share
//! dispatcher.

use log::{info, warn};

use crate::config::CaptureConfig;
use crate::error::PipelineError;
use crate::payload::PayloadNaming;
use crate::platform::{FileSaver, Navigator, SharePlatform};
use crate::rendering::{RasterEncoder, RasterResult};
use crate::share::ShareDispatcher;
use crate::snapshot::{CaptureTarget, SnapshotProducer, SvgSnapshotProducer};

/// What a download request produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The certificate was handed to the file saver
    Saved {
        filename: String,
        bytes: usize,
        /// Whether the memoized raster was reused
        reused: bool,
    },
    /// No drawing surface was available; nothing was saved
    NoImage,
}

pub struct CertificateView {
    target: CaptureTarget,
    producer: Box<dyn SnapshotProducer>,
    encoder: RasterEncoder,
    share: ShareDispatcher,
    download_filename: String,
    // outer None: not computed yet; inner None: computed, no image available
    raster: Option<Option<RasterResult>>,
}

impl CertificateView {
    /// Mount a view over `target` with the default producer and encoder.
    pub fn new(target: CaptureTarget, config: &CaptureConfig) -> Self {
        Self {
            target,
            producer: Box::new(SvgSnapshotProducer::new(config)),
            encoder: RasterEncoder::new(config),
            share: ShareDispatcher::new(config.share_message.clone(), PayloadNaming::from(config)),
            download_filename: config.download_filename.clone(),
            raster: None,
        }
    }

    pub fn with_producer(mut self, producer: impl SnapshotProducer + 'static) -> Self {
        self.producer = Box::new(producer);
        self
    }

    pub fn with_encoder(mut self, encoder: RasterEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn target(&self) -> &CaptureTarget {
        &self.target
    }

    pub fn share(&self) -> &ShareDispatcher {
        &self.share
    }

    /// The memoized raster, if a download produced an image
    pub fn raster(&self) -> Option<&RasterResult> {
        self.raster.as_ref().and_then(Option::as_ref)
    }

    /// Mark the view as gone; captures still in flight are discarded.
    pub fn unmount(&self) {
        self.target.liveness().unmount();
    }

    async fn capture(&self) -> Result<Option<RasterResult>, PipelineError> {
        let snapshot = self.producer.snapshot(&self.target).await?;
        self.ensure_mounted()?;
        let result = self.encoder.encode(&snapshot).await?;
        self.ensure_mounted()?;
        Ok(result)
    }

    fn ensure_mounted(&self) -> Result<(), PipelineError> {
        if self.target.is_mounted() {
            Ok(())
        } else {
            warn!("certificate view unmounted during capture; dropping result");
            Err(PipelineError::Unmounted)
        }
    }

    fn save(
        &self,
        saver: &dyn FileSaver,
        raster: Option<&RasterResult>,
        reused: bool,
    ) -> Result<DownloadOutcome, PipelineError> {
        let Some(raster) = raster else {
            warn!("no certificate image available; nothing to save");
            return Ok(DownloadOutcome::NoImage);
        };
        saver.save(&self.download_filename, raster.data_url())?;
        info!("certificate saved as {} (reused: {})", self.download_filename, reused);
        Ok(DownloadOutcome::Saved {
            filename: self.download_filename.clone(),
            bytes: raster.byte_len(),
            reused,
        })
    }

    /// Save the certificate image, computing it on first use.
    ///
    /// The first successful capture is memoized and offered to the share
    /// dispatcher, which checks `platform` for a native share sheet.
    pub async fn download(
        &mut self,
        saver: &dyn FileSaver,
        platform: &dyn SharePlatform,
    ) -> Result<DownloadOutcome, PipelineError> {
        if let Some(memo) = &self.raster {
            return self.save(saver, memo.as_ref(), true);
        }

        let result = self.capture().await?;
        let outcome = self.save(saver, result.as_ref(), false)?;

        self.raster = Some(result);
        let data_url = self
            .raster
            .as_ref()
            .and_then(Option::as_ref)
            .map(RasterResult::data_url)
            .unwrap_or_default();
        self.share.offer_image(data_url, platform).await;
        Ok(outcome)
    }

    pub fn home(&self, navigator: &dyn Navigator) {
        navigator.push("/");
    }
}

//! Platform surface: frame scheduling, resource loading, file saving, share sheet
//!
//! This module contains the traits the pipeline uses to reach the host
//! platform, together with headless defaults. Tests swap in their own
//! implementations to observe or control each primitive.

pub mod frames;
pub mod loader;
pub mod recording;

use std::path::PathBuf;

use crate::error::PlatformError;
use crate::payload::{parse_data_url, SharePayload};

pub use frames::{FrameScheduler, IntervalFrames};
pub use loader::{LoadedResource, NoResourceLoader, ResourceLoader};
#[cfg(feature = "http")]
pub use loader::HttpResourceLoader;
pub use recording::{PlatformEvent, RecordingPlatform};

/// Payload handed to the platform's native share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeShareData {
    pub title: String,
    pub url: String,
    pub files: Vec<SharePayload>,
}

/// Platform primitives needed by the share dispatcher.
pub trait SharePlatform {
    /// Whether a native share sheet is present
    fn supports_native_share(&self) -> bool;

    /// Open the native share sheet
    fn native_share(&self, data: NativeShareData) -> Result<(), PlatformError>;

    /// Open a share intent URL (social network sharer)
    fn open_url(&self, url: &str) -> Result<(), PlatformError>;

    /// Put text on the clipboard
    fn copy_text(&self, text: &str) -> Result<(), PlatformError>;

    /// Share a web URL through the messaging app
    fn send_messaging_link(&self, web_url: &str) -> Result<(), PlatformError>;
}

/// Triggers a file download for a data URL.
pub trait FileSaver {
    fn save(&self, filename: &str, data_url: &str) -> Result<(), PlatformError>;
}

/// Simple page navigation
pub trait Navigator {
    fn push(&self, path: &str);
}

/// Saves downloads into a directory on disk
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl FileSaver for DirectorySaver {
    fn save(&self, filename: &str, data_url: &str) -> Result<(), PlatformError> {
        let decoded = parse_data_url(data_url)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(filename);
        std::fs::write(&path, &decoded.bytes)?;
        log::info!("saved {} ({} bytes)", path.display(), decoded.bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::encode_data_url;

    #[test]
    fn directory_saver_writes_decoded_bytes() {
        let dir = std::env::temp_dir().join(format!("certshot-saver-{}", std::process::id()));
        let saver = DirectorySaver::new(&dir);
        saver
            .save("임명장.png", &encode_data_url("image/png", b"\x89PNG"))
            .unwrap();
        let written = std::fs::read(saver.path_for("임명장.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn directory_saver_rejects_non_data_url() {
        let saver = DirectorySaver::new(std::env::temp_dir());
        let err = saver.save("x.png", "not a url").unwrap_err();
        assert!(matches!(err, PlatformError::Conversion(_)));
    }
}

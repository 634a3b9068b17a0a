//! Pipeline configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed message attached to every share action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareMessage {
    pub title: String,
    pub url: String,
}

impl Default for ShareMessage {
    fn default() -> Self {
        Self {
            title: "소비사의 계산기".to_string(),
            url: "https://sobisa.vercel.app".to_string(),
        }
    }
}

/// Configuration for capturing and sharing a certificate.
///
/// The defaults reproduce the shipped behaviour: a 2x export, a 200 KiB
/// fidelity ceiling on the encoded data URL and a 500ms time budget.
///
/// # Examples
///
/// ```
/// let cfg = certshot::CaptureConfig::default();
/// assert_eq!(cfg.oversample, 2);
/// assert_eq!(cfg.size_ceiling, 204_800);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Multiplier applied to the target's pixel size for the output surface
    pub oversample: u32,
    /// Encoded data URL length (bytes) treated as "sufficient fidelity"
    pub size_ceiling: usize,
    /// Wall-clock budget for the encode loop in milliseconds
    pub timeout_ms: u64,
    /// Interval of the default frame scheduler in milliseconds
    pub frame_interval_ms: u64,
    /// Upper bound on redraw iterations regardless of the scheduler
    pub max_frames: u32,
    /// Filename used for the downloaded certificate
    pub download_filename: String,
    /// Stem for payload filenames derived from a recognized MIME type
    pub payload_stem: String,
    /// Filename used when the payload type cannot be recognized
    pub fallback_filename: String,
    /// MIME type used when the payload type cannot be recognized
    pub fallback_mime: String,
    /// Title/URL pair used by every share action
    pub share_message: ShareMessage,
    /// Origins (e.g. `https://shopping-phinf.pstatic.net`) allowed to serve
    /// images embedded in a snapshot
    pub cors_allowed_origins: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            oversample: 2,
            size_ceiling: 204_800,
            timeout_ms: 500,
            frame_interval_ms: 16,
            max_frames: 64,
            download_filename: "임명장.png".to_string(),
            payload_stem: "임명장".to_string(),
            fallback_filename: "영수증.png".to_string(),
            fallback_mime: "image/png".to_string(),
            share_message: ShareMessage::default(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl CaptureConfig {
    /// Load a config from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let cfg: CaptureConfig = serde_json::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.oversample == 0 {
            return Err(ConfigError::Invalid("oversample must be at least 1".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        if self.size_ceiling == 0 {
            return Err(ConfigError::Invalid("size_ceiling must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = CaptureConfig::default();
        assert_eq!(cfg.oversample, 2);
        assert_eq!(cfg.timeout(), Duration::from_millis(500));
        assert_eq!(cfg.download_filename, "임명장.png");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: CaptureConfig =
            serde_json::from_str(r#"{"timeout_ms": 250, "share_message": {"title": "t", "url": "https://x.test"}}"#)
                .unwrap();
        assert_eq!(cfg.timeout_ms, 250);
        assert_eq!(cfg.size_ceiling, 204_800);
        assert_eq!(cfg.share_message.url, "https://x.test");
    }

    #[test]
    fn zero_values_are_rejected() {
        for cfg in [
            CaptureConfig { oversample: 0, ..Default::default() },
            CaptureConfig { timeout_ms: 0, ..Default::default() },
            CaptureConfig { size_ceiling: 0, ..Default::default() },
        ] {
            assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("certshot-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_config_file() {
        let path = write_config("ok", r#"{"max_frames": 8, "cors_allowed_origins": ["https://img.test"]}"#);
        let cfg = CaptureConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.max_frames, 8);
        assert_eq!(cfg.cors_allowed_origins, vec!["https://img.test".to_string()]);
        assert_eq!(cfg.oversample, 2);
    }

    #[test]
    fn config_file_with_invalid_value_is_rejected() {
        let path = write_config("zero-timeout", r#"{"timeout_ms": 0}"#);
        let err = CaptureConfig::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("timeout_ms")));
    }

    #[test]
    fn config_file_errors_are_classified() {
        let missing = std::env::temp_dir().join("certshot-does-not-exist.json");
        assert!(matches!(CaptureConfig::from_json_file(&missing), Err(ConfigError::Io(_))));

        let path = write_config("garbage", "{ not json");
        let err = CaptureConfig::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

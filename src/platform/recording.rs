/// In-memory platform that records every request, for headless runs and tests

use std::sync::Mutex;

use crate::error::PlatformError;
use crate::platform::{FileSaver, NativeShareData, Navigator, SharePlatform};

/// A platform interaction observed by `RecordingPlatform`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    NativeShare { title: String, url: String, files: Vec<String> },
    OpenUrl(String),
    CopyText(String),
    MessagingLink(String),
    Save { filename: String, data_url_len: usize },
    Navigate(String),
}

/// Keeps the event log in-memory; native share support is fixed at construction.
pub struct RecordingPlatform {
    native_share: bool,
    events: Mutex<Vec<PlatformEvent>>,
}

impl RecordingPlatform {
    pub fn new(native_share: bool) -> Self {
        RecordingPlatform { native_share, events: Mutex::new(Vec::new()) }
    }

    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: PlatformEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SharePlatform for RecordingPlatform {
    fn supports_native_share(&self) -> bool {
        self.native_share
    }

    fn native_share(&self, data: NativeShareData) -> Result<(), PlatformError> {
        if !self.native_share {
            return Err(PlatformError::Rejected("native share is not supported".into()));
        }
        let files = data.files.iter().map(|f| f.name.clone()).collect();
        self.record(PlatformEvent::NativeShare { title: data.title, url: data.url, files });
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), PlatformError> {
        self.record(PlatformEvent::OpenUrl(url.to_string()));
        Ok(())
    }

    fn copy_text(&self, text: &str) -> Result<(), PlatformError> {
        self.record(PlatformEvent::CopyText(text.to_string()));
        Ok(())
    }

    fn send_messaging_link(&self, web_url: &str) -> Result<(), PlatformError> {
        self.record(PlatformEvent::MessagingLink(web_url.to_string()));
        Ok(())
    }
}

impl FileSaver for RecordingPlatform {
    fn save(&self, filename: &str, data_url: &str) -> Result<(), PlatformError> {
        self.record(PlatformEvent::Save {
            filename: filename.to_string(),
            data_url_len: data_url.len(),
        });
        Ok(())
    }
}

impl Navigator for RecordingPlatform {
    fn push(&self, path: &str) {
        self.record(PlatformEvent::Navigate(path.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_events_in_order() {
        let p = RecordingPlatform::new(false);
        p.open_url("https://a.test").unwrap();
        p.copy_text("https://b.test").unwrap();
        Navigator::push(&p, "/");
        assert_eq!(
            p.events(),
            vec![
                PlatformEvent::OpenUrl("https://a.test".into()),
                PlatformEvent::CopyText("https://b.test".into()),
                PlatformEvent::Navigate("/".into()),
            ]
        );
    }

    #[test]
    fn native_share_rejected_without_capability() {
        let p = RecordingPlatform::new(false);
        let data = NativeShareData { title: "t".into(), url: "u".into(), files: vec![] };
        assert!(p.native_share(data).is_err());
        assert!(p.events().is_empty());
    }
}

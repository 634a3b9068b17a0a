/// Loading of external resources embedded in a snapshot

use futures::future::{FutureExt, LocalBoxFuture};
use url::Url;

/// Bytes and media type of a fetched resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedResource {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Fetches resources referenced from a capture target (images).
///
/// Errors are reported as a human readable reason; the snapshot producer
/// wraps them into `SnapshotError::ResourceLoad`.
pub trait ResourceLoader {
    fn load<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<LoadedResource, String>>;
}

/// Loader for environments without network access; refuses every request
#[derive(Debug, Default, Clone, Copy)]
pub struct NoResourceLoader;

impl ResourceLoader for NoResourceLoader {
    fn load<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<LoadedResource, String>> {
        let reason = format!("resource loading is disabled ({})", url);
        futures::future::ready(Err(reason)).boxed_local()
    }
}

/// HTTP loader backed by `reqwest`
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpResourceLoader {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpResourceLoader {
    pub fn new(timeout: std::time::Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl ResourceLoader for HttpResourceLoader {
    fn load<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<LoadedResource, String>> {
        async move {
            let res = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| format!("HTTP GET failed: {}", e))?;
            if !res.status().is_success() {
                return Err(format!("HTTP status {}", res.status().as_u16()));
            }
            let mime = res
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let bytes = res
                .bytes()
                .await
                .map_err(|e| format!("Failed to read response body: {}", e))?;
            Ok(LoadedResource { mime, bytes: bytes.to_vec() })
        }
        .boxed_local()
    }
}

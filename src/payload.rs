//! Data URL parsing and the share payload adapter.
//!
//! The adapter turns a finalized raster data URL into a named binary file for
//! the share dispatcher. An empty data URL is the normal "no image" state and
//! yields `Ok(None)`.

use base64::Engine as _;

use crate::config::CaptureConfig;
use crate::error::ConversionError;

/// A decoded `data:` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Lower-cased media type, empty when the URL omits it
    pub mime: String,
    /// `key=value` parameters from the header, in order
    pub params: Vec<(String, String)>,
    /// Decoded body
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Parse `data:<mime>[;key=value]*[;base64],<body>`.
pub fn parse_data_url(input: &str) -> Result<DataUrl, ConversionError> {
    let trimmed = input.trim();
    let rest = match trimmed.get(..5) {
        Some(scheme) if scheme.eq_ignore_ascii_case("data:") => &trimmed[5..],
        _ => return Err(ConversionError::NotDataUrl),
    };
    let (header, body) = rest.split_once(',').ok_or(ConversionError::MissingComma)?;

    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    let mut params = Vec::new();
    let mut is_base64 = false;
    for part in parts {
        let part = part.trim();
        if part.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if let Some((k, v)) = part.split_once('=') {
            params.push((k.trim().to_string(), v.trim().to_string()));
        }
    }

    let bytes = if is_base64 {
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ConversionError::Base64(e.to_string()))?
    } else {
        percent_decode(body)?
    };

    Ok(DataUrl { mime, params, bytes })
}

/// Build a base64 data URL for `bytes`.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn percent_decode(body: &str) -> Result<Vec<u8>, ConversionError> {
    let raw = body.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = raw.get(i + 1..i + 3).ok_or(ConversionError::PercentEncoding(i))?;
            let hex = std::str::from_utf8(hex).map_err(|_| ConversionError::PercentEncoding(i))?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| ConversionError::PercentEncoding(i))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// File extension for the image types a certificate can be exported as
pub fn extension_for(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        _ => None,
    }
}

/// A binary file handed to the native share sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SharePayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Names assigned to payload files
#[derive(Debug, Clone)]
pub struct PayloadNaming {
    pub stem: String,
    pub fallback_filename: String,
    pub fallback_mime: String,
}

impl Default for PayloadNaming {
    fn default() -> Self {
        Self::from(&CaptureConfig::default())
    }
}

impl From<&CaptureConfig> for PayloadNaming {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            stem: cfg.payload_stem.clone(),
            fallback_filename: cfg.fallback_filename.clone(),
            fallback_mime: cfg.fallback_mime.clone(),
        }
    }
}

/// Convert a raster data URL into a share payload.
///
/// Returns `Ok(None)` for an empty input. An unrecognized type marker falls
/// back to the configured default filename and MIME type.
pub fn to_share_payload(
    data_url: &str,
    naming: &PayloadNaming,
) -> Result<Option<SharePayload>, ConversionError> {
    if data_url.trim().is_empty() {
        return Ok(None);
    }

    let parsed = parse_data_url(data_url)?;
    let explicit_name = parsed
        .param("name")
        .filter(|n| !n.is_empty())
        .map(|n| n.to_string());

    let (name, mime) = match extension_for(&parsed.mime) {
        Some(ext) => {
            let name = explicit_name.unwrap_or_else(|| format!("{}.{}", naming.stem, ext));
            (name, parsed.mime.clone())
        }
        None => {
            log::debug!("unrecognized payload type {:?}; using fallback name", parsed.mime);
            (naming.fallback_filename.clone(), naming.fallback_mime.clone())
        }
    };

    Ok(Some(SharePayload { name, mime, bytes: parsed.bytes }))
}

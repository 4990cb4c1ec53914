//! Decoding of the JSON frame manifest.

use serde_json::Value;

use crate::{FrameId, FrameSequence};

/// Error type for manifest retrieval and decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// The manifest request failed or returned a non-success status
    #[error("Failed to fetch manifest: {0}")]
    Fetch(String),
    /// The body is not valid JSON
    #[error("Manifest is not valid JSON: {0}")]
    Decode(String),
    /// The body is JSON but not an array
    #[error("Manifest must be a JSON array of image paths")]
    NotAnArray,
    /// An array entry is not a string
    #[error("Manifest entry {index} is not a string")]
    NonStringEntry { index: usize },
}

/// Parse a manifest body into a frame sequence.
///
/// ## Format
///
/// The manifest is a JSON array of strings, one identifier per frame, in
/// display order. No other fields are read.
///
/// ## Example
///
/// ```rust
/// use satloop_core_view::parse_manifest;
///
/// let seq = parse_manifest(br#"["images/umv/a.webp", "images/umv/b.webp"]"#).unwrap();
/// assert_eq!(seq.len(), 2);
/// assert_eq!(seq.get(1).unwrap().as_str(), "images/umv/b.webp");
/// ```
pub fn parse_manifest(body: &[u8]) -> Result<FrameSequence, ManifestError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ManifestError::Decode(e.to_string()))?;

    let Value::Array(entries) = value else {
        return Err(ManifestError::NotAnArray);
    };

    let ids = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::String(id) => Ok(FrameId::from(id)),
            _ => Err(ManifestError::NonStringEntry { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FrameSequence::new(ids))
}

/// Resolve a frame identifier against the page base URL.
///
/// Absolute identifiers (scheme, protocol-relative, root-relative or `data:`)
/// are returned unchanged. An empty base leaves relative identifiers as-is so
/// the browser resolves them against the document.
pub fn resolve_frame_url(base: &str, id: &FrameId) -> String {
    let id = id.as_str();
    let is_absolute = id.contains("://") || id.starts_with('/') || id.starts_with("data:");
    if is_absolute || base.is_empty() {
        return id.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), id.trim_start_matches("./"))
}

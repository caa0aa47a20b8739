//! Base64 encoding of staged images
//!
//! The hosted model receives images inline as base64 text without any
//! `data:<mime>;base64,` framing.

use super::file::ImageFile;
use crate::error::DescriboError;
use base64::Engine;

/// Encode raw bytes as standard, padded base64
///
/// # Examples
///
/// ```
/// use describo::upload::encode;
///
/// assert_eq!(encode(b"hi"), "aGk=");
/// assert_eq!(encode(b""), "");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Remove a `data:...,` transport prefix, if present
///
/// # Examples
///
/// ```
/// use describo::upload::strip_data_uri_prefix;
///
/// assert_eq!(strip_data_uri_prefix("data:image/png;base64,AAAA"), "AAAA");
/// assert_eq!(strip_data_uri_prefix("AAAA"), "AAAA");
/// ```
pub fn strip_data_uri_prefix(encoded: &str) -> &str {
    if !encoded.starts_with("data:") {
        return encoded;
    }
    match encoded.split_once(',') {
        Some((_, payload)) => payload,
        None => encoded,
    }
}

/// Decode base64 text back to bytes, tolerating a data-URI prefix
///
/// # Errors
///
/// Returns `DescriboError::Encoding` if the payload is not valid base64
pub fn decode(encoded: &str) -> Result<Vec<u8>, DescriboError> {
    base64::engine::general_purpose::STANDARD
        .decode(strip_data_uri_prefix(encoded.trim()))
        .map_err(|e| DescriboError::Encoding(format!("Invalid base64 payload: {}", e)))
}

/// Read an image's bytes and encode them for transmission
///
/// The bytes read are checked against `max_bytes` again, since a file on
/// disk can change between staging and sending.
///
/// # Errors
///
/// Returns `DescriboError::Encoding` if the bytes cannot be read, or
/// `DescriboError::TooLarge` if they exceed `max_bytes`
pub async fn encode_image(file: &ImageFile, max_bytes: u64) -> Result<String, DescriboError> {
    let bytes = file.read_bytes().await.map_err(|e| {
        DescriboError::Encoding(format!("Failed to read {}: {}", file.name(), e))
    })?;

    let size = bytes.len() as u64;
    if size > max_bytes {
        tracing::warn!(
            "{} grew to {} bytes after staging (limit {})",
            file.name(),
            size,
            max_bytes
        );
        return Err(DescriboError::TooLarge {
            size,
            limit: max_bytes,
        });
    }

    tracing::debug!("Encoding {} ({} bytes)", file.name(), bytes.len());
    Ok(encode(&bytes))
}

//! Image payloads carried inside JSON as base64 `data:` URLs.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Largest accepted decoded image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors decoding an uploaded image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,

    #[error("unsupported image type {0}; only jpeg, png, gif and webp are allowed")]
    UnsupportedType(String),

    #[error("image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// Mime type sniffed from the image's magic bytes, falling back to PNG.
#[must_use]
pub fn mime_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

/// Encode stored image bytes as a `data:` URL.
#[must_use]
pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type(bytes), STANDARD.encode(bytes))
}

/// Decode an uploaded image given as a `data:` URL or bare base64.
///
/// # Errors
///
/// Returns an [`ImageError`] if the payload is empty, declares a non-image
/// type, is not base64, or is too large.
pub fn decode(input: &str) -> Result<Vec<u8>, ImageError> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| ImageError::UnsupportedType(rest.chars().take(32).collect()))?;
            let mime = header.trim_end_matches(";base64");
            if !matches!(
                mime,
                "image/jpeg" | "image/jpg" | "image/png" | "image/gif" | "image/webp"
            ) {
                return Err(ImageError::UnsupportedType(mime.to_string()));
            }
            data
        }
        None => input,
    };

    if payload.is_empty() {
        return Err(ImageError::Empty);
    }

    let bytes = STANDARD.decode(payload)?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge {
            max: MAX_IMAGE_BYTES,
        });
    }
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_data_url_roundtrip() {
        let url = to_data_url(PNG_HEADER);
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode(&url).unwrap(), PNG_HEADER);
    }

    #[test]
    fn test_sniffs_jpeg() {
        assert!(to_data_url(&[0xFF, 0xD8, 0xFF, 0xE0]).starts_with("data:image/jpeg;"));
    }

    #[test]
    fn test_accepts_bare_base64() {
        assert_eq!(decode("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(
            decode("data:text/plain;base64,aGVsbG8="),
            Err(ImageError::UnsupportedType(_))
        ));
        assert!(matches!(decode("data:image/png;base64,"), Err(ImageError::Empty)));
        assert!(matches!(decode("not base64!"), Err(ImageError::Base64(_))));
        assert!(matches!(decode("   "), Err(ImageError::Empty)));
    }
}

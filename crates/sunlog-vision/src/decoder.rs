//! Transport decoding for captured images.
//!
//! Only the base64 layer is removed. The raster itself stays compressed; the
//! classifier samples those bytes directly.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use sunlog_types::{Result, SunlogError};
use tracing::debug;

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Raw encoded image bytes recovered from a transport payload.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub media_type: Option<String>,
    pub format: Option<ImageFormat>,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Splits an optional `data:<media>;base64,` header from the encoded body.
pub fn strip_media_header(payload: &str) -> (Option<&str>, &str) {
    let trimmed = payload.trim();
    if !trimmed.starts_with(DATA_URI_PREFIX) {
        return (None, trimmed);
    }
    match trimmed.split_once(',') {
        Some((header, body)) => {
            let media = header[DATA_URI_PREFIX.len()..]
                .trim_end_matches(BASE64_MARKER)
                .trim();
            ((!media.is_empty()).then_some(media), body)
        }
        None => (None, trimmed),
    }
}

/// Exact decoded size for a padded base64 body.
pub fn decoded_len(encoded: &str) -> usize {
    let padding = encoded
        .as_bytes()
        .iter()
        .rev()
        .take(2)
        .take_while(|b| **b == b'=')
        .count();
    (encoded.len() / 4 * 3).saturating_sub(padding)
}

pub fn decode_payload(payload: &str) -> Result<ImagePayload> {
    let (media_type, body) = strip_media_header(payload);
    let body: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if body.is_empty() {
        return Err(decode_error("empty image payload"));
    }
    if body.len() % 4 != 0 {
        return Err(decode_error(format!(
            "truncated payload: {} characters is not a multiple of 4",
            body.len()
        )));
    }

    let mut bytes = vec![0u8; decoded_len(&body)];
    let written = STANDARD
        .decode_slice(body.as_bytes(), &mut bytes)
        .map_err(|err| decode_error(format!("invalid base64 payload: {err}")))?;
    bytes.truncate(written);

    let format = image::guess_format(&bytes).ok();
    debug!(
        "Decoded image payload: {} bytes, media {:?}, format {:?}",
        bytes.len(),
        media_type,
        format
    );
    Ok(ImagePayload {
        media_type: media_type.map(str::to_owned),
        format,
        bytes,
    })
}

pub fn decode_error(message: impl Into<String>) -> SunlogError {
    SunlogError::Decode(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_data_uri_header() {
        let (media, body) = strip_media_header("data:image/jpeg;base64,AAAA");
        assert_eq!(media, Some("image/jpeg"));
        assert_eq!(body, "AAAA");

        let (media, body) = strip_media_header("  QUJD  ");
        assert_eq!(media, None);
        assert_eq!(body, "QUJD");
    }

    #[test]
    fn padding_is_accounted_for() {
        assert_eq!(decoded_len("QUJD"), 3);
        assert_eq!(decoded_len("QUI="), 2);
        assert_eq!(decoded_len("QQ=="), 1);
        assert_eq!(decode_payload("QQ==").unwrap().bytes, b"A");
        assert_eq!(decode_payload("QUI=").unwrap().bytes, b"AB");
        assert_eq!(decode_payload("QUJD").unwrap().bytes, b"ABC");
    }

    #[test]
    fn line_wrapped_body_decodes() {
        let wrapped = "data:image/jpeg;base64,QUJD\r\nREVG\n  R0g=\t\n";
        let decoded = decode_payload(wrapped).unwrap();
        assert_eq!(decoded.media_type.as_deref(), Some("image/jpeg"));
        assert_eq!(decoded.bytes, b"ABCDEFGH");

        assert!(matches!(
            decode_payload("QUJD\nRE"),
            Err(SunlogError::Decode(_))
        ));
    }

    #[test]
    fn rejects_malformed_payloads() {
        assert!(matches!(decode_payload(""), Err(SunlogError::Decode(_))));
        assert!(matches!(
            decode_payload("data:image/png;base64,"),
            Err(SunlogError::Decode(_))
        ));
        assert!(matches!(decode_payload("QUJ"), Err(SunlogError::Decode(_))));
        assert!(matches!(decode_payload("QU*D"), Err(SunlogError::Decode(_))));
    }

    #[test]
    fn sniffs_encoded_format() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let payload = format!("data:image/png;base64,{}", STANDARD.encode(png_magic));
        let decoded = decode_payload(&payload).unwrap();
        assert_eq!(decoded.media_type.as_deref(), Some("image/png"));
        assert_eq!(decoded.format, Some(ImageFormat::Png));
        assert_eq!(decoded.len(), png_magic.len());

        let jpeg_magic = [0xFFu8, 0xD8, 0xFF, 0xE0, 0, 0x10];
        let decoded = decode_payload(&STANDARD.encode(jpeg_magic)).unwrap();
        assert_eq!(decoded.format, Some(ImageFormat::Jpeg));
    }
}

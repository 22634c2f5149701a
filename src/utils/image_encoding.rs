//! JPEG encoding of captured frames and `data:` URI wrapping.

use crate::{constants::JPEG_DATA_URI_PREFIX, Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, ColorType, RgbImage};

/// Encode an RGB frame as JPEG bytes
///
/// # Errors
///
/// Returns an error if the frame is empty, the quality is outside `1..=100`
/// or the encoder fails
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(Error::InvalidInput(format!(
            "Cannot encode empty frame {}x{}",
            frame.width(),
            frame.height()
        )));
    }
    if !(1..=100).contains(&quality) {
        return Err(Error::InvalidInput(format!(
            "JPEG quality {quality} outside 1..=100"
        )));
    }

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder.encode(frame.as_raw(), frame.width(), frame.height(), ColorType::Rgb8)?;
    Ok(bytes)
}

/// Wrap JPEG bytes as a `data:image/jpeg;base64,` URI
pub fn to_data_uri(jpeg: &[u8]) -> String {
    let mut uri = String::with_capacity(JPEG_DATA_URI_PREFIX.len() + jpeg.len() * 4 / 3 + 4);
    uri.push_str(JPEG_DATA_URI_PREFIX);
    STANDARD.encode_string(jpeg, &mut uri);
    uri
}

/// Encode a frame straight to a JPEG data URI
///
/// # Errors
///
/// Same as [`encode_jpeg`]
pub fn frame_to_data_uri(frame: &RgbImage, quality: u8) -> Result<String> {
    encode_jpeg(frame, quality).map(|jpeg| to_data_uri(&jpeg))
}

/// Cheap shape check: JPEG data URI prefix with a non-empty payload
pub fn is_image_data_uri(value: &str) -> bool {
    value
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .is_some_and(|payload| !payload.is_empty())
}

/// Decode the JPEG bytes carried by a data URI
///
/// # Errors
///
/// Returns an error if the prefix is missing or the payload is not valid base64
pub fn decode_data_uri(value: &str) -> Result<Vec<u8>> {
    let payload = value
        .strip_prefix(JPEG_DATA_URI_PREFIX)
        .ok_or_else(|| Error::InvalidInput("Not a JPEG data URI".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| Error::InvalidInput(format!("Invalid base64 payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128]))
    }

    #[test]
    fn test_encode_produces_jpeg_markers() {
        let jpeg = encode_jpeg(&gradient(32, 24), 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_data_uri_decodes_back_to_frame() {
        let uri = frame_to_data_uri(&gradient(16, 16), 85).unwrap();
        assert!(is_image_data_uri(&uri));

        let bytes = decode_data_uri(&uri).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
        assert_eq!(decoded.height(), 16);
    }

    #[test]
    fn test_rejects_empty_frame_and_bad_quality() {
        assert!(encode_jpeg(&RgbImage::new(0, 10), 90).is_err());
        assert!(encode_jpeg(&gradient(4, 4), 0).is_err());
        assert!(encode_jpeg(&gradient(4, 4), 101).is_err());
    }

    #[test]
    fn test_malformed_uris() {
        assert!(!is_image_data_uri(""));
        assert!(!is_image_data_uri(JPEG_DATA_URI_PREFIX));
        assert!(!is_image_data_uri("data:image/png;base64,AAAA"));
        assert!(decode_data_uri("data:image/jpeg;base64,@@@").is_err());
        assert!(decode_data_uri("front.jpg").is_err());
    }
}

//! Photo encoding for the two provider transports.
//!
//! The conversational client forwards the capture untouched as an inline
//! base64 attachment; only its MIME type has to be sniffed. The structured
//! client decodes the capture into an in-memory image first, scales it down
//! to the configured cap and re-encodes it as JPEG, so a 12 MP phone photo
//! never reaches the request body at full size.

use crate::error::AnalysisError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// A base64 payload and its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: String,
}

/// Sniff the MIME type of a captured photo.
pub fn sniff_mime(bytes: &[u8]) -> Result<&'static str, AnalysisError> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Ok("image/jpeg"),
        Ok(ImageFormat::Png) => Ok("image/png"),
        Ok(other) => Err(AnalysisError::invalid(
            "image",
            format!("unsupported image format {:?}; use JPEG or PNG", other),
        )),
        Err(_) => Err(AnalysisError::invalid("image", "not a recognised image")),
    }
}

/// Wrap the capture as inline base64 for a chat-completion attachment.
pub fn encode_inline(bytes: &[u8]) -> Result<ImageData, AnalysisError> {
    let mime = sniff_mime(bytes)?;
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} capture → {} bytes base64", mime, b64.len());

    Ok(ImageData::new(b64, mime))
}

/// Decode the capture into an in-memory image.
pub fn decode_capture(bytes: &[u8]) -> Result<DynamicImage, AnalysisError> {
    sniff_mime(bytes)?;
    image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::invalid("image", format!("could not be decoded: {}", e)))
}

/// Decode, cap the longest edge at `max_dimension`, and re-encode as JPEG.
pub fn encode_decoded(bytes: &[u8], max_dimension: u32) -> Result<EncodedImage, AnalysisError> {
    let img = decode_capture(bytes)?;

    let img = if img.width() > max_dimension || img.height() > max_dimension {
        let scaled = img.resize(max_dimension, max_dimension, FilterType::Triangle);
        debug!(
            "Scaled capture {}x{} → {}x{}",
            img.width(),
            img.height(),
            scaled.width(),
            scaled.height()
        );
        scaled
    } else {
        img
    };

    // The JPEG encoder rejects alpha channels.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| AnalysisError::Internal(format!("JPEG encoding failed: {}", e)))?;

    let data = STANDARD.encode(&buf);
    debug!("Re-encoded capture → {} bytes base64", data.len());

    Ok(EncodedImage {
        mime_type: "image/jpeg",
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("png encode");
        buf
    }

    #[test]
    fn sniff_png() {
        assert_eq!(sniff_mime(&png_bytes(4, 4)).unwrap(), "image/png");
    }

    #[test]
    fn sniff_garbage_is_invalid_parameter() {
        let err = sniff_mime(b"definitely not an image").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn inline_keeps_original_bytes() {
        let bytes = png_bytes(10, 10);
        let data = encode_inline(&bytes).expect("encode should succeed");
        assert_eq!(data.mime_type, "image/png");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decoded_is_capped_and_jpeg() {
        let bytes = png_bytes(400, 100);
        let encoded = encode_decoded(&bytes, 200).expect("encode should succeed");
        assert_eq!(encoded.mime_type, "image/jpeg");
        let jpeg = STANDARD.decode(&encoded.data).expect("valid base64");
        let img = image::load_from_memory(&jpeg).expect("valid jpeg");
        assert_eq!(img.width(), 200);
        assert_eq!(img.height(), 50);
    }

    #[test]
    fn small_capture_not_upscaled() {
        let bytes = png_bytes(32, 16);
        let encoded = encode_decoded(&bytes, 2048).unwrap();
        let img = image::load_from_memory(&STANDARD.decode(&encoded.data).unwrap()).unwrap();
        assert_eq!((img.width(), img.height()), (32, 16));
    }
}

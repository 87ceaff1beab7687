use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;

/// A decoded, validated inbound image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    /// Upper-case format name, e.g. `JPEG`.
    pub format: String,
    pub mime_type: String,
}

/// Decode a base64 image, with or without a `data:<mime>;base64,` prefix.
///
/// The bytes must decode as an image. When the format cannot be sniffed the
/// payload is decoded as JPEG.
pub fn decode_inbound_image(raw: &str) -> Result<ImagePayload> {
    let encoded = match raw.split_once(',') {
        Some((_, payload)) => payload,
        None => raw,
    };

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidImage(format!("base64 decoding failed: {}", e)))?;

    let mut reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| Error::InvalidImage(e.to_string()))?;
    let format = reader.format().unwrap_or(ImageFormat::Jpeg);
    reader.set_format(format);
    reader
        .decode()
        .map_err(|e| Error::InvalidImage(e.to_string()))?;

    Ok(ImagePayload {
        format: format_name(format),
        mime_type: format.to_mime_type().to_string(),
        bytes,
    })
}

/// Wrap raw image bytes in a `data:image/<format>;base64,` URL.
pub fn encode_for_transport(bytes: &[u8], format: &str) -> String {
    format!(
        "data:image/{};base64,{}",
        format.to_ascii_lowercase(),
        STANDARD.encode(bytes)
    )
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Tiff => "TIFF".to_string(),
        other => format!("{:?}", other).to_ascii_uppercase(),
    }
}

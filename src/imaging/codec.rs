//! Decode and encode in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//!
//! The declared media type only gates validation; decoding trusts the bytes.
//! A file named `.png` that is really a JPEG still decodes.

use super::params::{Encoding, Quality};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("image could not be decoded: {0}")]
    Decode(String),
    #[error("image could not be encoded: {0}")]
    Encode(String),
}

/// Decode a byte buffer into a raster, guessing the format from its content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, CodecError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CodecError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Resize to exact dimensions. A no-op when the size already matches.
pub fn resize(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if img.width() == width && img.height() == height {
        return img;
    }
    img.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode a raster to bytes.
///
/// JPEG has no alpha channel, so the raster is flattened to RGB first.
pub fn encode(img: &DynamicImage, encoding: Encoding, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    match encoding {
        Encoding::Png => {
            let encoder = PngEncoder::new(&mut out);
            img.write_with_encoder(encoder)
                .map_err(|e| CodecError::Encode(format!("PNG encode failed: {e}")))?;
        }
        Encoding::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.value() as u8);
            rgb.write_with_encoder(encoder)
                .map_err(|e| CodecError::Encode(format!("JPEG encode failed: {e}")))?;
        }
    }
    Ok(out)
}

/// Sniff the media type of stored bytes, for naming read-back files.
pub fn sniff_encoding(bytes: &[u8]) -> Option<Encoding> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Png => Some(Encoding::Png),
        image::ImageFormat::Jpeg => Some(Encoding::Jpeg),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square(size: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn png_encode_then_decode_keeps_pixels() {
        let bytes = encode(&red_square(8), Encoding::Png, Quality::default()).unwrap();
        let decoded = decode(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn jpeg_output_is_sniffed_as_jpeg() {
        let bytes = encode(&red_square(16), Encoding::Jpeg, Quality::new(80)).unwrap();
        assert_eq!(sniff_encoding(&bytes), Some(Encoding::Jpeg));
        assert_eq!(decode(&bytes).unwrap().width(), 16);
    }

    #[test]
    fn garbage_does_not_decode() {
        let err = decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn truncated_png_does_not_decode() {
        let bytes = encode(&red_square(32), Encoding::Png, Quality::default()).unwrap();
        assert!(decode(&bytes[..bytes.len() / 2]).is_err());
    }

    #[test]
    fn resize_same_size_is_noop() {
        let img = resize(red_square(10), 10, 10);
        assert_eq!((img.width(), img.height()), (10, 10));
        let img = resize(img, 5, 4);
        assert_eq!((img.width(), img.height()), (5, 4));
    }
}

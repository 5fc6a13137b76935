//! The transformer: decode → bound → stylize → encode.
//!
//! Combines the pure dimension math from [`calculations`](super::calculations)
//! with the codec and stylization passes. Fully local: no network, no disk.

use super::calculations::fit_within;
use super::codec::{self, CodecError};
use super::params::TransformParams;
use super::stylize::stylize;
use crate::types::{SelectedFile, TransformedImage};
use crate::validate::AcceptedType;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

impl From<CodecError> for TransformError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Decode(msg) => TransformError::DecodeFailed(msg),
            CodecError::Encode(msg) => TransformError::EncodeFailed(msg),
        }
    }
}

/// Turns accepted selections into upload-ready images.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer {
    params: TransformParams,
}

impl Transformer {
    pub fn new(params: TransformParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }

    /// Run the full transform on an accepted file.
    ///
    /// `input` is the validator's verdict on the declared type; it only
    /// drives the `auto` output format.
    pub fn transform(
        &self,
        file: &SelectedFile,
        input: AcceptedType,
    ) -> Result<TransformedImage, TransformError> {
        let img = codec::decode(&file.bytes)?;
        let original = (img.width(), img.height());
        let (width, height) = fit_within(original, self.params.max_dimension);
        let img = codec::resize(img, width, height);
        let img = stylize(img, self.params.style);

        let encoding = self.params.format.resolve(input);
        let bytes = codec::encode(&img, encoding, self.params.quality)?;
        let out = TransformedImage::new(bytes, encoding, width, height);
        debug!(
            original_width = original.0,
            original_height = original.1,
            width,
            height,
            style = self.params.style.label(),
            encoding = encoding.mime(),
            bytes = out.bytes.len(),
            digest = out.short_digest(),
            "transformed image"
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{Encoding, OutputFormat, Quality, Style};
    use crate::test_helpers::{png_bytes, solid_png};

    fn png_file(bytes: Vec<u8>) -> SelectedFile {
        SelectedFile::new(Some("face.png".into()), "image/png", bytes)
    }

    #[test]
    fn small_red_png_stays_small_png() {
        let file = png_file(solid_png(50, 50, [255, 0, 0, 255]));
        let out = Transformer::default()
            .transform(&file, AcceptedType::Png)
            .unwrap();

        assert_eq!((out.width, out.height), (50, 50));
        assert_eq!(out.encoding, Encoding::Png);
        let decoded = codec::decode(&out.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(25, 25).0, [255, 0, 0, 255]);
    }

    #[test]
    fn large_image_bounded_with_aspect_ratio() {
        let file = png_file(solid_png(1600, 900, [0, 128, 255, 255]));
        let out = Transformer::default()
            .transform(&file, AcceptedType::Png)
            .unwrap();

        assert_eq!((out.width, out.height), (800, 450));
        let decoded = codec::decode(&out.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 450));
    }

    #[test]
    fn portrait_bounded_on_height() {
        let file = png_file(solid_png(300, 1200, [10, 20, 30, 255]));
        let params = TransformParams {
            max_dimension: 400,
            ..TransformParams::default()
        };
        let out = Transformer::new(params)
            .transform(&file, AcceptedType::Png)
            .unwrap();
        assert_eq!((out.width, out.height), (100, 400));
    }

    #[test]
    fn jpeg_input_stays_jpeg_on_auto() {
        let file = SelectedFile::new(None, "image/jpeg", solid_png(20, 20, [1, 2, 3, 255]));
        let out = Transformer::default()
            .transform(&file, AcceptedType::Jpeg)
            .unwrap();
        assert_eq!(out.encoding, Encoding::Jpeg);
        assert_eq!(codec::sniff_encoding(&out.bytes), Some(Encoding::Jpeg));
    }

    #[test]
    fn forced_png_output() {
        let params = TransformParams {
            format: OutputFormat::Png,
            quality: Quality::new(40),
            ..TransformParams::default()
        };
        let file = SelectedFile::new(None, "image/jpeg", solid_png(20, 20, [1, 2, 3, 255]));
        let out = Transformer::new(params)
            .transform(&file, AcceptedType::Jpeg)
            .unwrap();
        assert_eq!(out.encoding, Encoding::Png);
    }

    #[test]
    fn undecodable_bytes_fail_with_decode_error() {
        let file = png_file(b"hello, I am text".to_vec());
        let err = Transformer::default()
            .transform(&file, AcceptedType::Png)
            .unwrap_err();
        assert!(matches!(err, TransformError::DecodeFailed(_)));
    }

    #[test]
    fn stylized_output_is_byte_identical_across_runs() {
        let source = png_bytes(&image::RgbaImage::from_fn(120, 90, |x, y| {
            image::Rgba([(x * 2) as u8, (y * 2) as u8, ((x ^ y) & 0xff) as u8, 255])
        }));
        for style in [Style::Cartoon, Style::Comic, Style::Relief] {
            let t = Transformer::new(TransformParams {
                style,
                ..TransformParams::default()
            });
            let a = t.transform(&png_file(source.clone()), AcceptedType::Png).unwrap();
            let b = t.transform(&png_file(source.clone()), AcceptedType::Png).unwrap();
            assert_eq!(a.digest, b.digest, "style {}", style.label());
        }
    }
}

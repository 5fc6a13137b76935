//! Shared test utilities for the avatar-studio test suite.
//!
//! Builds small encoded images in memory so tests never depend on fixture
//! files on disk.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let red = solid_png(50, 50, [255, 0, 0, 255]);
//! let file = SelectedFile::new(Some("red.png".into()), "image/png", red);
//! ```

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Encode an RGBA buffer as PNG.
pub fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// A single-colour PNG of the given size.
pub fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    png_bytes(&RgbaImage::from_pixel(width, height, Rgba(rgba)))
}

//! Cosmetic stylization passes ("cartoonize").
//!
//! Each pass is a pure function of an RGBA raster and fixed constants. There
//! is nothing adaptive: the same input always produces byte-identical output,
//! which is what makes golden-image comparisons possible. Alpha is never
//! touched.
//!
//! | Style | Passes |
//! |---|---|
//! | `cartoon` | brightness/contrast → posterize(6) → 16-colour palette → depth lighting |
//! | `comic` | strong contrast → posterize(4) → 8-colour palette |
//! | `3d` | gaussian blur → depth lighting |
//!
//! Per-pixel passes run row-parallel on rayon; every output pixel depends
//! only on the input raster, so the split does not affect the result.

use super::params::Style;
use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;

/// A fixed palette used for nearest-colour quantization.
pub type Palette = &'static [[u8; 3]];

pub const CARTOON_PALETTE: Palette = &[
    [0, 0, 0],
    [255, 255, 255],
    [64, 64, 64],
    [160, 160, 160],
    [224, 172, 105],
    [241, 194, 125],
    [255, 219, 172],
    [141, 85, 36],
    [198, 134, 66],
    [220, 50, 47],
    [255, 140, 0],
    [250, 220, 60],
    [80, 170, 70],
    [40, 110, 200],
    [120, 80, 180],
    [130, 200, 230],
];

pub const COMIC_PALETTE: Palette = &[
    [0, 0, 0],
    [255, 255, 255],
    [237, 28, 36],
    [255, 242, 0],
    [0, 114, 188],
    [0, 166, 81],
    [247, 148, 29],
    [245, 200, 160],
];

const CARTOON_BRIGHTNESS: f32 = 10.0;
const CARTOON_CONTRAST: f32 = 1.2;
const CARTOON_LEVELS: u8 = 6;
const CARTOON_DEPTH: f32 = 0.35;

const COMIC_CONTRAST: f32 = 1.5;
const COMIC_LEVELS: u8 = 4;

const RELIEF_BLUR_SIGMA: f32 = 1.5;
const RELIEF_DEPTH: f32 = 0.6;

/// Run the recipe for `style`. [`Style::None`] returns the image untouched.
pub fn stylize(img: DynamicImage, style: Style) -> DynamicImage {
    if style == Style::None {
        return img;
    }
    let mut raster = img.to_rgba8();
    match style {
        Style::None => {}
        Style::Cartoon => {
            brightness_contrast(&mut raster, CARTOON_BRIGHTNESS, CARTOON_CONTRAST);
            posterize(&mut raster, CARTOON_LEVELS);
            quantize(&mut raster, CARTOON_PALETTE);
            raster = depth_lighting(&raster, CARTOON_DEPTH);
        }
        Style::Comic => {
            brightness_contrast(&mut raster, 0.0, COMIC_CONTRAST);
            posterize(&mut raster, COMIC_LEVELS);
            quantize(&mut raster, COMIC_PALETTE);
        }
        Style::Relief => {
            let mut blurred = image::imageops::blur(&raster, RELIEF_BLUR_SIGMA);
            copy_alpha(&mut blurred, &raster);
            raster = depth_lighting(&blurred, RELIEF_DEPTH);
        }
    }
    DynamicImage::ImageRgba8(raster)
}

/// Blur spreads alpha too; put the original mask back.
fn copy_alpha(dst: &mut RgbaImage, src: &RgbaImage) {
    for (d, s) in dst.pixels_mut().zip(src.pixels()) {
        d[3] = s[3];
    }
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// `v' = (v - 128) * contrast + 128 + brightness` per colour channel.
pub fn brightness_contrast(img: &mut RgbaImage, brightness: f32, contrast: f32) {
    let data: &mut [u8] = &mut *img;
    data.par_chunks_mut(4).for_each(|px| {
        for c in &mut px[..3] {
            *c = clamp_u8((*c as f32 - 128.0) * contrast + 128.0 + brightness);
        }
    });
}

/// Snap each channel to one of `levels` evenly spaced values in 0..=255.
///
/// `levels` below 2 is treated as 2 (pure black/white per channel).
pub fn posterize(img: &mut RgbaImage, levels: u8) {
    let steps = levels.max(2) as u32 - 1;
    let data: &mut [u8] = &mut *img;
    data.par_chunks_mut(4).for_each(|px| {
        for c in &mut px[..3] {
            let q = (*c as u32 * steps + 127) / 255;
            *c = (q * 255 / steps) as u8;
        }
    });
}

/// Index of the palette entry closest to `rgb` (squared euclidean, first wins ties).
pub fn nearest(rgb: [u8; 3], palette: Palette) -> usize {
    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (i, p) in palette.iter().enumerate() {
        let dist: u32 = (0..3)
            .map(|k| {
                let d = rgb[k] as i32 - p[k] as i32;
                (d * d) as u32
            })
            .sum();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Replace every colour with its nearest palette entry.
pub fn quantize(img: &mut RgbaImage, palette: Palette) {
    if palette.is_empty() {
        return;
    }
    let data: &mut [u8] = &mut *img;
    data.par_chunks_mut(4).for_each(|px| {
        let p = palette[nearest([px[0], px[1], px[2]], palette)];
        px[..3].copy_from_slice(&p);
    });
}

#[inline]
fn luminance(px: &[u8]) -> f32 {
    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32
}

/// Shade the image as if luminance were height, lit from the top-left.
///
/// The slope at each pixel is the central difference of luminance (edges
/// clamped); brighter-facing slopes are lifted and the others darkened by up
/// to `strength`.
pub fn depth_lighting(img: &RgbaImage, strength: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let (w, h) = (w as usize, h as usize);
    if w == 0 || h == 0 {
        return img.clone();
    }
    let src: &[u8] = img;
    let height: Vec<f32> = src.chunks(4).map(luminance).collect();
    let at = |x: usize, y: usize| height[y * w + x];

    let mut out = img.clone();
    let data: &mut [u8] = &mut out;
    data.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        let up = y.saturating_sub(1);
        let down = (y + 1).min(h - 1);
        for x in 0..w {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(w - 1);
            let dx = (at(right, y) - at(left, y)) / 2.0;
            let dy = (at(x, down) - at(x, up)) / 2.0;
            // Light from the top-left: surfaces sloping up-left face it
            let facing = -(dx + dy) / 255.0;
            let shade = (1.0 + strength * facing).clamp(0.0, 2.0);
            let px = &mut row[x * 4..x * 4 + 3];
            for c in px {
                *c = clamp_u8(*c as f32 * shade);
            }
        }
    });
    out
}

//! Image processing: pure Rust, in memory.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` with guessed format |
//! | **Bound** | `fit_within` + `resize_exact` (Lanczos3) |
//! | **Stylize** | fixed per-pixel passes, row-parallel on rayon |
//! | **Encode** | PNG (lossless) or JPEG at a fixed quality |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing the transform
//! - **Codec**: decode/resize/encode over byte buffers
//! - **Stylize**: the cartoon, comic and 3D recipes
//! - **Transform**: [`Transformer`] combining all of the above

mod calculations;
pub mod codec;
mod params;
pub mod stylize;
mod transform;

pub use calculations::fit_within;
pub use codec::{CodecError, sniff_encoding};
pub use params::{Encoding, OutputFormat, Quality, Style, TransformParams};
pub use transform::{TransformError, Transformer};

//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (declared type, or sniffed via `infer`) |
//! | **Fit** | [`target_dimensions`], aspect-preserving, never upscaling |
//! | **Redraw** | Lanczos3 resize onto a white [`Surface`] |
//! | **Finalize** | [`finalize_quality`] trims quality from the pass input and output size |
//! | **Encode** | JPEG with quality, lossless PNG / WebP |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and quality math (unit testable)
//! - **Parameters**: What one encode pass should produce
//! - **Surface**: Scoped rendering buffers with guaranteed release
//! - **Codec**: [`Codec`] trait + [`RustCodec`]

mod calculations;
pub mod codec;
mod params;
pub mod rust_codec;
pub mod surface;

pub use calculations::{estimate_rgb_kb, estimate_surface_bytes, finalize_quality, target_dimensions};
pub use codec::{Codec, CodecError, EncodedImage, derive_output_name};
pub use params::{PassParams, Quality};
pub use rust_codec::RustCodec;
pub use surface::{Surface, SurfaceTracker};

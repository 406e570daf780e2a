//! Tessellation and sampling engine.
//!
//! Turns pixel buffers into stylized tessellated compositions: hex/triangle
//! lattices, Voronoi mosaics, and darkness-weighted stipple fields. Every cell
//! is colored by sampling one of several source buffers, picked by a
//! positional alternation rule, optionally after palette quantization.
//!
//! The engine emits plain geometry and colors. Decoding, drawing and saving
//! are left to the caller.

mod buffer;
mod lattice;
mod point;
mod quantize;
mod relax;
mod render;
mod sampler;
mod select;
mod subdivision;

pub use buffer::PixelBuffer;
pub use lattice::{hex_centers, tri_centers, HexCenter, HexCenters, TriCenter, TriCenters};
pub use point::{Point, PointField, PointSet};
pub use quantize::{build_palette, quantize, remap, Palette};
pub use relax::{relax, Relaxer, WeightField};
pub use render::{render, render_with, LatticeShape, Mode, RenderParams, Shape, Tile};
pub use sampler::{luminance, sample};
pub use select::{pick, AlternationPattern};
pub use subdivision::{Cell, PlanarSubdivision, Polygon, Subdivision};

/// RGB color tuple
pub type Rgb = [u8; 3];

/// RGBA color tuple
pub type Rgba = [u8; 4];

/// Error type for tessellation operations
#[derive(Debug, thiserror::Error)]
pub enum TesseraError {
    #[error("pixel buffer dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch { len: usize, width: u32, height: u32 },

    #[error("source {index} is {actual_width}x{actual_height}, expected {width}x{height}")]
    SourceSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("No sources provided")]
    NoSources,
}

pub type Result<T> = std::result::Result<T, TesseraError>;

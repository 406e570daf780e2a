//! Nearest-pixel sampling with edge clamping.

use crate::{PixelBuffer, Rgb};

/// Color of the pixel nearest to `(x, y)`, clamped to the buffer edges.
pub fn sample(buffer: &PixelBuffer<'_>, x: f64, y: f64) -> Rgb {
    let px = clamp_index(x, buffer.width());
    let py = clamp_index(y, buffer.height());
    let [r, g, b, _] = buffer.pixel(px, py);
    [r, g, b]
}

#[inline]
fn clamp_index(v: f64, extent: u32) -> u32 {
    let v = if v.is_finite() { v } else { 0.0 };
    v.clamp(0.0, (extent - 1) as f64).floor() as u32
}

/// Mean channel intensity in `[0, 1]`.
#[inline]
pub fn luminance(rgb: Rgb) -> f64 {
    (rgb[0] as f64 + rgb[1] as f64 + rgb[2] as f64) / (3.0 * 255.0)
}

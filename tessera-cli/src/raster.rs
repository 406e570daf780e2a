//! Scanline rasterization of emitted tiles.

use tessera_core::{Point, Rgb, Tile};

/// Fill `vertices` (implicitly closed) with `color`.
///
/// A pixel is painted when its center lies inside the polygon under the
/// even-odd rule.
pub fn fill_polygon(image: &mut image::RgbaImage, vertices: &[Point], color: Rgb) {
    if vertices.len() < 3 {
        return;
    }
    let (w, h) = (image.width() as i64, image.height() as i64);
    let (min_y, max_y) = vertices
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }
    let y_start = ((min_y - 0.5).ceil() as i64).max(0);
    let y_end = ((max_y - 0.5).floor() as i64).min(h - 1);

    let mut crossings: Vec<f64> = Vec::with_capacity(8);
    for py in y_start..=y_end {
        let sy = py as f64 + 0.5;
        crossings.clear();
        for i in 0..vertices.len() {
            let a = vertices[i];
            let b = vertices[(i + 1) % vertices.len()];
            // Half-open rule so shared vertices are counted once
            if (a.y <= sy) != (b.y <= sy) {
                crossings.push(a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            let x_start = ((span[0] - 0.5).ceil() as i64).max(0);
            let x_end = ((span[1] - 0.5).floor() as i64).min(w - 1);
            for px in x_start..=x_end {
                image.put_pixel(px as u32, py as u32, image::Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }
}

/// Paint every tile, in order, onto `image`.
pub fn draw_tiles(image: &mut image::RgbaImage, tiles: &[Tile]) {
    for tile in tiles {
        fill_polygon(image, &tile.shape.outline(), tile.color);
    }
}

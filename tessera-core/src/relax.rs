//! Weighted Lloyd relaxation.
//!
//! Each pass moves every site to the weighted centroid of the pixels in its
//! cell. With darkness weights this concentrates sites in dark regions,
//! which is what produces the stipple look.

use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::subdivision::PlanarSubdivision;
use crate::{luminance, PixelBuffer, Point, PointSet, Subdivision};

/// Per-pixel relaxation weight.
#[derive(Debug, Clone, Copy)]
pub enum WeightField<'a> {
    /// `1 - luminance`: dark pixels pull sites toward them
    Darkness(PixelBuffer<'a>),
    /// Every pixel weighs 1 (plain Lloyd)
    Uniform,
}

impl WeightField<'_> {
    /// Weight at integer pixel `(x, y)`. Pixels outside a buffer weigh 0.
    #[inline]
    pub fn weight(&self, x: u32, y: u32) -> f64 {
        match self {
            WeightField::Darkness(buffer) => {
                if x >= buffer.width() || y >= buffer.height() {
                    return 0.0;
                }
                let [r, g, b, _] = buffer.pixel(x, y);
                1.0 - luminance([r, g, b])
            }
            WeightField::Uniform => 1.0,
        }
    }
}

/// Weighted sums over one cell
#[derive(Debug, Clone, Copy, Default)]
struct CellAccum {
    weight: f64,
    x_sum: f64,
    y_sum: f64,
}

impl CellAccum {
    fn centroid_or(&self, fallback: Point) -> Point {
        if self.weight > 0.0 {
            Point::new(self.x_sum / self.weight, self.y_sum / self.weight)
        } else {
            fallback
        }
    }
}

/// Integer pixel range `[lo, hi]` covering `[min, max]`, clamped to `[0, extent - 1]`.
fn pixel_span(min: f64, max: f64, extent: u32) -> Option<(u32, u32)> {
    if extent == 0 || max < 0.0 {
        return None;
    }
    let last = (extent - 1) as f64;
    let lo = min.ceil().clamp(0.0, last);
    let hi = max.floor().min(last);
    if hi < lo {
        return None;
    }
    Some((lo as u32, hi as u32))
}

fn accumulate<S: PlanarSubdivision + ?Sized>(
    subdivision: &S,
    weights: &WeightField<'_>,
    width: u32,
    height: u32,
    i: usize,
) -> CellAccum {
    let mut acc = CellAccum::default();
    let Some((lo, hi)) = subdivision.cell_polygon(i).and_then(|p| p.bounds()) else {
        return acc;
    };
    let (Some((x0, x1)), Some((y0, y1))) = (
        pixel_span(lo.x, hi.x, width),
        pixel_span(lo.y, hi.y, height),
    ) else {
        return acc;
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            if !subdivision.contains(i, x as f64, y as f64) {
                continue;
            }
            let w = weights.weight(x, y);
            acc.weight += w;
            acc.x_sum += w * x as f64;
            acc.y_sum += w * y as f64;
        }
    }
    acc
}

/// One relaxation pass: the weighted centroid of every site's cell.
///
/// Only integer pixels inside `[0, width) x [0, height)` and inside a cell's
/// bounding box are scanned. A cell with zero total weight keeps its site.
pub fn relax<S>(subdivision: &S, weights: &WeightField<'_>, width: u32, height: u32) -> PointSet
where
    S: PlanarSubdivision + Sync + ?Sized,
{
    let relax_site = |i: usize| {
        let site = subdivision.site(i).unwrap_or_default();
        accumulate(subdivision, weights, width, height, i).centroid_or(site)
    };

    #[cfg(feature = "parallel")]
    {
        (0..subdivision.len()).into_par_iter().map(relax_site).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..subdivision.len()).map(relax_site).collect()
    }
}

/// Drives repeated relaxation passes over a point set.
///
/// Each pass rebuilds the subdivision from scratch and replaces the point
/// set wholesale. Callers that need cancellation stop calling [`step`].
///
/// [`step`]: Relaxer::step
pub struct Relaxer<'a> {
    points: PointSet,
    weights: WeightField<'a>,
    width: u32,
    height: u32,
    iterations: u32,
}

impl<'a> Relaxer<'a> {
    pub fn new(points: PointSet, weights: WeightField<'a>, width: u32, height: u32) -> Self {
        Self {
            points,
            weights,
            width,
            height,
            iterations: 0,
        }
    }

    /// Run one pass. Returns the largest distance any site moved.
    pub fn step(&mut self) -> f64 {
        let subdivision = Subdivision::build(&self.points, self.width as f64, self.height as f64);
        let relaxed = relax(&subdivision, &self.weights, self.width, self.height);

        let max_displacement = self
            .points
            .iter()
            .zip(&relaxed)
            .map(|(old, new)| old.dist(new))
            .filter(|d| d.is_finite())
            .fold(0.0f64, f64::max);

        self.points = relaxed;
        self.iterations += 1;
        debug!(
            "relax pass {}: {} sites, max displacement {:.3}",
            self.iterations,
            self.points.len(),
            max_displacement
        );
        max_displacement
    }

    /// Run `iterations` passes and return the final points.
    pub fn run(mut self, iterations: u32) -> PointSet {
        for _ in 0..iterations {
            if self.points.is_empty() {
                break;
            }
            self.step();
        }
        self.points
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> PointSet {
        self.points
    }

    /// Passes completed so far
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

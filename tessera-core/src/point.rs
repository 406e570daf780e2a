//! Point and point-set types.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::lattice::hex_centers;

/// 2D position in canvas pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point
    pub fn dist_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance to another point
    pub fn dist(&self, other: &Point) -> f64 {
        self.dist_sq(other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Ordered sites; the index is the site identifier.
pub type PointSet = Vec<Point>;

/// A set of sample points generated inside a canvas.
#[derive(Debug, Clone, Default)]
pub struct PointField {
    points: PointSet,
}

impl PointField {
    pub fn new(points: PointSet) -> Self {
        Self { points }
    }

    /// Uniform random points in `[0, width) x [0, height)`.
    ///
    /// Seeded with ChaCha8 so the same seed always produces the same field.
    /// A canvas with no area yields an empty field.
    pub fn random(width: f64, height: f64, count: usize, seed: u64) -> Self {
        let has_area = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
        if count == 0 || !has_area {
            return Self::default();
        }
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = (0..count)
            .map(|_| Point::new(rng.gen_range(0.0..width), rng.gen_range(0.0..height)))
            .collect();
        Self { points }
    }

    /// Hex lattice centers that fall inside the canvas.
    pub fn from_hex_lattice(width: f64, height: f64, size: f64) -> Self {
        let points = hex_centers(width, height, size)
            .filter(|c| c.x >= 0.0 && c.x < width && c.y >= 0.0 && c.y < height)
            .map(|c| Point::new(c.x, c.y))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> PointSet {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_within_bounds() {
        let field = PointField::random(64.0, 32.0, 500, 7);
        assert_eq!(field.len(), 500);
        for p in field.points() {
            assert!(p.x >= 0.0 && p.x < 64.0, "x out of range: {:?}", p);
            assert!(p.y >= 0.0 && p.y < 32.0, "y out of range: {:?}", p);
        }
    }

    #[test]
    fn test_random_is_seeded() {
        let a = PointField::random(100.0, 100.0, 50, 42);
        let b = PointField::random(100.0, 100.0, 50, 42);
        let c = PointField::random(100.0, 100.0, 50, 43);
        assert_eq!(a.points(), b.points());
        assert_ne!(a.points(), c.points());
    }

    #[test]
    fn test_zero_count_is_empty() {
        assert!(PointField::random(100.0, 100.0, 0, 0).is_empty());
        assert!(PointField::random(0.0, 100.0, 10, 0).is_empty());
    }

    #[test]
    fn test_hex_lattice_points_inside_canvas() {
        let field = PointField::from_hex_lattice(100.0, 80.0, 10.0);
        assert!(!field.is_empty());
        for p in field.points() {
            assert!(p.x >= 0.0 && p.x < 100.0 && p.y >= 0.0 && p.y < 80.0);
        }
    }

    #[test]
    fn test_dist() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.dist_sq(&b), 25.0);
        assert_eq!(a.dist(&b), 5.0);
    }
}

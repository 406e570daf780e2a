//! Voronoi subdivision of a rectangular canvas.
//!
//! Sites are triangulated with spade's Delaunay triangulation. Each site's
//! cell is the canvas rectangle clipped by the perpendicular bisectors it
//! shares with its Delaunay neighbors, which is exactly its Voronoi cell.

use log::warn;
use spade::handles::FixedVertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::Point;

/// Convex polygon, implicitly closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle `[0, width] x [0, height]`.
    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(vec![
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    fn signed_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let n = self.vertices.len();
        let mut sum = 0.0;
        for i in 0..n {
            let p1 = self.vertices[i];
            let p2 = self.vertices[(i + 1) % n];
            sum += p1.x * p2.y - p2.x * p1.y;
        }
        0.5 * sum
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Area centroid, or the vertex mean for a degenerate polygon.
    pub fn centroid(&self) -> Option<Point> {
        if self.vertices.is_empty() {
            return None;
        }
        let area = self.signed_area();
        if area.abs() < 1e-12 {
            let n = self.vertices.len() as f64;
            let (sx, sy) = self
                .vertices
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            return Some(Point::new(sx / n, sy / n));
        }
        let n = self.vertices.len();
        let (mut cx, mut cy) = (0.0, 0.0);
        for i in 0..n {
            let p1 = self.vertices[i];
            let p2 = self.vertices[(i + 1) % n];
            let cross = p1.x * p2.y - p2.x * p1.y;
            cx += (p1.x + p2.x) * cross;
            cy += (p1.y + p2.y) * cross;
        }
        Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
    }

    /// Bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), p| {
            (
                Point::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Pull every vertex toward the centroid by at most `distance`.
    pub fn inset(&self, distance: f64) -> Polygon {
        let Some(center) = self.centroid() else {
            return self.clone();
        };
        if distance <= 0.0 {
            return self.clone();
        }
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let d = v.dist(&center);
                if d <= distance {
                    center
                } else {
                    let t = distance / d;
                    Point::new(v.x + (center.x - v.x) * t, v.y + (center.y - v.y) * t)
                }
            })
            .collect();
        Polygon::new(vertices)
    }

    /// Keep the part where `a.x * x + a.y * y <= c` (Sutherland-Hodgman, one edge).
    fn clip(&self, a: Point, c: f64) -> Polygon {
        let n = self.vertices.len();
        let mut out = Vec::with_capacity(n + 1);
        let side = |p: &Point| a.x * p.x + a.y * p.y - c;

        for i in 0..n {
            let cur = self.vertices[i];
            let next = self.vertices[(i + 1) % n];
            let (fc, fn_) = (side(&cur), side(&next));

            if fc <= 0.0 {
                out.push(cur);
            }
            if (fc <= 0.0) != (fn_ <= 0.0) {
                let t = fc / (fc - fn_);
                out.push(Point::new(
                    cur.x + (next.x - cur.x) * t,
                    cur.y + (next.y - cur.y) * t,
                ));
            }
        }

        out.dedup();
        if out.len() > 1 && out.first() == out.last() {
            out.pop();
        }
        if out.len() < 3 {
            out.clear();
        }
        Polygon::new(out)
    }
}

/// Cell queries a relaxation pass needs from a subdivision.
pub trait PlanarSubdivision {
    /// Number of sites
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn site(&self, i: usize) -> Option<Point>;

    fn cell_polygon(&self, i: usize) -> Option<&Polygon>;

    fn contains(&self, i: usize, x: f64, y: f64) -> bool;
}

/// A site index paired with its cell polygon.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub site: usize,
    pub polygon: &'a Polygon,
}

/// Voronoi cells of a point set, clipped to `[0, width] x [0, height]`.
#[derive(Debug, Clone)]
pub struct Subdivision {
    sites: Vec<Point>,
    /// Site owns its cell: finite and not a duplicate of a lower index
    owns_cell: Vec<bool>,
    neighbors: Vec<Vec<usize>>,
    cells: Vec<Polygon>,
    width: f64,
    height: f64,
}

impl Subdivision {
    /// Triangulate `points` and derive their clipped Voronoi cells.
    ///
    /// Never fails: an empty set gives zero cells, a single point gets the
    /// whole rectangle, and coincident points leave every copy after the
    /// first with an empty cell.
    pub fn build(points: &[Point], width: f64, height: f64) -> Self {
        let n = points.len();
        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        let mut handles: Vec<Option<FixedVertexHandle>> = Vec::with_capacity(n);
        // Triangulation vertex index -> first site inserted there
        let mut site_of_vertex: Vec<usize> = Vec::with_capacity(n);
        let mut owns_cell = vec![false; n];

        for (i, p) in points.iter().enumerate() {
            if !p.is_finite() {
                warn!("skipping non-finite site {} at ({}, {})", i, p.x, p.y);
                handles.push(None);
                continue;
            }
            match triangulation.insert(Point2::new(p.x, p.y)) {
                Ok(handle) => {
                    let v = handle.index();
                    if v >= site_of_vertex.len() {
                        site_of_vertex.resize(v + 1, usize::MAX);
                    }
                    if site_of_vertex[v] == usize::MAX {
                        site_of_vertex[v] = i;
                        owns_cell[i] = true;
                    }
                    handles.push(Some(handle));
                }
                Err(e) => {
                    warn!("skipping site {} at ({}, {}): {:?}", i, p.x, p.y, e);
                    handles.push(None);
                }
            }
        }

        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        if triangulation.num_vertices() > 1 {
            for (i, handle) in handles.iter().enumerate() {
                let Some(handle) = *handle else { continue };
                if !owns_cell[i] {
                    continue;
                }
                neighbors[i] = triangulation
                    .vertex(handle)
                    .out_edges()
                    .map(|edge| site_of_vertex[edge.to().fix().index()])
                    .filter(|&j| j != i && j != usize::MAX)
                    .collect();
            }
        }

        let bounds = Polygon::rect(width.max(0.0), height.max(0.0));
        let cells = (0..n)
            .map(|i| {
                if !owns_cell[i] {
                    return Polygon::default();
                }
                let p = points[i];
                neighbors[i].iter().fold(bounds.clone(), |poly, &j| {
                    if poly.is_empty() {
                        return poly;
                    }
                    let q = points[j];
                    // |x - p|^2 <= |x - q|^2  <=>  2 x.(q - p) <= |q|^2 - |p|^2
                    let a = Point::new(q.x - p.x, q.y - p.y);
                    let c = (q.x * q.x + q.y * q.y - p.x * p.x - p.y * p.y) / 2.0;
                    poly.clip(a, c)
                })
            })
            .collect();

        Self {
            sites: points.to_vec(),
            owns_cell,
            neighbors,
            cells,
            width,
            height,
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn sites(&self) -> &[Point] {
        &self.sites
    }

    /// Clipped cell polygon of site `i`; `None` only when `i` is out of range.
    pub fn cell_polygon(&self, i: usize) -> Option<&Polygon> {
        self.cells.get(i)
    }

    /// Sites whose cells share an edge with site `i`.
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.neighbors.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        self.cells
            .iter()
            .enumerate()
            .map(|(site, polygon)| Cell { site, polygon })
    }

    /// Whether `(x, y)` belongs to site `i`'s cell.
    ///
    /// Points equidistant from several sites belong to the lowest index, so
    /// every point of the canvas is claimed by exactly one cell.
    pub fn contains(&self, i: usize, x: f64, y: f64) -> bool {
        if i >= self.sites.len() || !self.owns_cell[i] {
            return false;
        }
        if !(x >= 0.0 && y >= 0.0 && x <= self.width && y <= self.height) {
            return false;
        }
        let q = Point::new(x, y);
        let d = self.sites[i].dist_sq(&q);

        let mut tied = false;
        for &j in &self.neighbors[i] {
            let dj = self.sites[j].dist_sq(&q);
            if dj < d {
                return false;
            }
            if dj == d {
                tied = true;
            }
        }
        if !tied {
            return true;
        }

        // On a boundary: settle against every site, lower index wins
        self.sites.iter().enumerate().all(|(j, site)| {
            if j == i || !self.owns_cell[j] {
                return true;
            }
            let dj = site.dist_sq(&q);
            dj > d || (dj == d && j > i)
        })
    }
}

impl PlanarSubdivision for Subdivision {
    fn len(&self) -> usize {
        self.sites.len()
    }

    fn site(&self, i: usize) -> Option<Point> {
        self.sites.get(i).copied()
    }

    fn cell_polygon(&self, i: usize) -> Option<&Polygon> {
        Subdivision::cell_polygon(self, i)
    }

    fn contains(&self, i: usize, x: f64, y: f64) -> bool {
        Subdivision::contains(self, i, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointField;
    use approx::assert_relative_eq;

    fn total_area(sub: &Subdivision) -> f64 {
        sub.cells().map(|c| c.polygon.area()).sum()
    }

    #[test]
    fn test_empty_input() {
        let sub = Subdivision::build(&[], 100.0, 100.0);
        assert!(sub.is_empty());
        assert_eq!(sub.cells().count(), 0);
        assert!(sub.cell_polygon(0).is_none());
        assert!(!sub.contains(0, 1.0, 1.0));
    }

    #[test]
    fn test_single_point_covers_rectangle() {
        let sub = Subdivision::build(&[Point::new(30.0, 40.0)], 100.0, 80.0);
        assert_eq!(sub.len(), 1);
        let poly = sub.cell_polygon(0).unwrap();
        assert_eq!(poly, &Polygon::rect(100.0, 80.0));
        assert_relative_eq!(poly.area(), 8000.0);
        assert!(sub.contains(0, 0.0, 0.0));
        assert!(sub.contains(0, 100.0, 80.0));
        assert!(!sub.contains(0, 100.5, 10.0));
    }

    #[test]
    fn test_two_points_split_in_half() {
        let sub = Subdivision::build(
            &[Point::new(25.0, 50.0), Point::new(75.0, 50.0)],
            100.0,
            100.0,
        );
        assert_relative_eq!(sub.cell_polygon(0).unwrap().area(), 5000.0, epsilon = 1e-6);
        assert_relative_eq!(sub.cell_polygon(1).unwrap().area(), 5000.0, epsilon = 1e-6);
        assert_eq!(sub.neighbors(0), &[1]);
        // Bisector x = 50 goes to the lower index
        assert!(sub.contains(0, 50.0, 10.0));
        assert!(!sub.contains(1, 50.0, 10.0));
        assert!(sub.contains(1, 50.5, 10.0));
    }

    #[test]
    fn test_partition_property_random() {
        for seed in 0..5 {
            let points = PointField::random(200.0, 150.0, 60, seed).into_points();
            let sub = Subdivision::build(&points, 200.0, 150.0);
            assert_eq!(sub.len(), 60);
            assert_relative_eq!(total_area(&sub), 200.0 * 150.0, epsilon = 1e-6);

            for cell in sub.cells() {
                let (lo, hi) = cell.polygon.bounds().unwrap();
                assert!(lo.x >= -1e-9 && lo.y >= -1e-9);
                assert!(hi.x <= 200.0 + 1e-9 && hi.y <= 150.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_every_pixel_claimed_once() {
        let points = PointField::random(60.0, 40.0, 25, 3).into_points();
        let sub = Subdivision::build(&points, 60.0, 40.0);
        for y in 0..=40 {
            for x in 0..=60 {
                let owners = (0..sub.len())
                    .filter(|&i| sub.contains(i, x as f64, y as f64))
                    .count();
                assert_eq!(owners, 1, "pixel ({}, {}) claimed {} times", x, y, owners);
            }
        }
    }

    #[test]
    fn test_grid_sites_with_ties() {
        // Cocircular sites: many pixels sit exactly on bisectors
        let points: Vec<Point> = (0..4)
            .flat_map(|r| (0..4).map(move |c| Point::new(5.0 + c as f64 * 10.0, 5.0 + r as f64 * 10.0)))
            .collect();
        let sub = Subdivision::build(&points, 40.0, 40.0);
        assert_relative_eq!(total_area(&sub), 1600.0, epsilon = 1e-6);
        for cell in sub.cells() {
            assert_relative_eq!(cell.polygon.area(), 100.0, epsilon = 1e-6);
        }
        for y in 0..=40 {
            for x in 0..=40 {
                let owners = (0..sub.len())
                    .filter(|&i| sub.contains(i, x as f64, y as f64))
                    .count();
                assert_eq!(owners, 1, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_collinear_points() {
        let points = vec![
            Point::new(10.0, 50.0),
            Point::new(30.0, 50.0),
            Point::new(50.0, 50.0),
            Point::new(70.0, 50.0),
        ];
        let sub = Subdivision::build(&points, 100.0, 100.0);
        assert_relative_eq!(total_area(&sub), 10000.0, epsilon = 1e-6);
        assert_relative_eq!(sub.cell_polygon(0).unwrap().area(), 2000.0, epsilon = 1e-6);
        assert_relative_eq!(sub.cell_polygon(3).unwrap().area(), 4000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_coincident_points() {
        let points = vec![
            Point::new(20.0, 20.0),
            Point::new(80.0, 80.0),
            Point::new(20.0, 20.0),
        ];
        let sub = Subdivision::build(&points, 100.0, 100.0);
        assert_eq!(sub.len(), 3);
        assert!(sub.cell_polygon(2).unwrap().is_empty());
        assert_eq!(sub.cell_polygon(2).unwrap().area(), 0.0);
        assert_relative_eq!(total_area(&sub), 10000.0, epsilon = 1e-6);
        assert!(sub.contains(0, 20.0, 20.0));
        assert!(!sub.contains(2, 20.0, 20.0));
    }

    #[test]
    fn test_non_finite_point_is_skipped() {
        let points = vec![Point::new(f64::NAN, 1.0), Point::new(10.0, 10.0)];
        let sub = Subdivision::build(&points, 50.0, 50.0);
        assert!(sub.cell_polygon(0).unwrap().is_empty());
        assert_relative_eq!(sub.cell_polygon(1).unwrap().area(), 2500.0);
    }

    #[test]
    fn test_polygon_centroid_and_inset() {
        let square = Polygon::rect(10.0, 10.0);
        let c = square.centroid().unwrap();
        assert_relative_eq!(c.x, 5.0);
        assert_relative_eq!(c.y, 5.0);

        let inset = square.inset(1.0);
        assert!(inset.area() < square.area());
        let collapsed = square.inset(100.0);
        assert_eq!(collapsed.area(), 0.0);
    }
}

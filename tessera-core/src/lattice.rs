//! Regular hex and triangle lattices.
//!
//! Both generators are pure functions of `(width, height, size)`. They
//! enumerate centers row-major with one row and column of padding around the
//! canvas so that edge cells are never cut short.

const MIN_SIZE: f64 = 1e-3;
const SQRT_3: f64 = 1.732_050_807_568_877_2;

fn sanitize_size(size: f64) -> f64 {
    if size.is_finite() && size > MIN_SIZE {
        size
    } else {
        MIN_SIZE
    }
}

/// Last index needed to cover `extent` with the given `stride`.
fn last_index(extent: f64, stride: f64) -> i64 {
    if extent > 0.0 {
        (extent / stride).ceil() as i64
    } else {
        0
    }
}

/// Center of a pointy-top hexagon with circumradius `size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexCenter {
    pub col: i64,
    pub row: i64,
    pub x: f64,
    pub y: f64,
}

/// Row-major iterator over hex lattice centers.
#[derive(Debug, Clone)]
pub struct HexCenters {
    dx: f64,
    dy: f64,
    first: i64,
    last_col: i64,
    last_row: i64,
    col: i64,
    row: i64,
}

/// Hex centers covering `[0, width] x [0, height]`.
///
/// Horizontal spacing is `size * sqrt(3)`, vertical spacing `size * 1.5`, and
/// odd rows shift right by half a column.
pub fn hex_centers(width: f64, height: f64, size: f64) -> HexCenters {
    let size = sanitize_size(size);
    let dx = size * SQRT_3;
    let dy = size * 1.5;
    HexCenters {
        dx,
        dy,
        first: -1,
        last_col: last_index(width, dx),
        last_row: last_index(height, dy),
        col: -1,
        row: -1,
    }
}

impl Iterator for HexCenters {
    type Item = HexCenter;

    fn next(&mut self) -> Option<HexCenter> {
        if self.row > self.last_row {
            return None;
        }
        let (col, row) = (self.col, self.row);
        let offset = if row.rem_euclid(2) == 1 { self.dx / 2.0 } else { 0.0 };
        let center = HexCenter {
            col,
            row,
            x: col as f64 * self.dx + offset,
            y: row as f64 * self.dy,
        };

        self.col += 1;
        if self.col > self.last_col {
            self.col = self.first;
            self.row += 1;
        }
        Some(center)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let cols = (self.last_col - self.first + 1) as usize;
        let remaining = if self.row > self.last_row {
            0
        } else {
            let rows_after = (self.last_row - self.row) as usize;
            rows_after * cols + (self.last_col - self.col + 1) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HexCenters {}

/// Centroid of an equilateral triangle with side `size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriCenter {
    pub col: i64,
    pub row: i64,
    pub x: f64,
    pub y: f64,
    /// Apex points down
    pub inverted: bool,
}

/// Row-major iterator over triangle lattice centroids.
#[derive(Debug, Clone)]
pub struct TriCenters {
    stride: f64,
    row_height: f64,
    first: i64,
    last_col: i64,
    last_row: i64,
    col: i64,
    row: i64,
}

/// Triangle centroids covering `[0, width] x [0, height]`.
///
/// Rows are `size * sin(60°)` tall and scanned at half the base width, so
/// up and down triangles alternate along each row.
pub fn tri_centers(width: f64, height: f64, size: f64) -> TriCenters {
    let size = sanitize_size(size);
    let stride = size / 2.0;
    let row_height = size * SQRT_3 / 2.0;
    TriCenters {
        stride,
        row_height,
        first: -1,
        last_col: last_index(width, stride) + 1,
        last_row: last_index(height, row_height),
        col: -1,
        row: -1,
    }
}

impl Iterator for TriCenters {
    type Item = TriCenter;

    fn next(&mut self) -> Option<TriCenter> {
        if self.row > self.last_row {
            return None;
        }
        let (col, row) = (self.col, self.row);
        let inverted = (row + col).rem_euclid(2) == 1;
        let top = row as f64 * self.row_height;
        // Centroid sits a third of the height from the flat side
        let y = if inverted {
            top + self.row_height / 3.0
        } else {
            top + self.row_height * 2.0 / 3.0
        };
        let center = TriCenter {
            col,
            row,
            x: col as f64 * self.stride,
            y,
            inverted,
        };

        self.col += 1;
        if self.col > self.last_col {
            self.col = self.first;
            self.row += 1;
        }
        Some(center)
    }
}

//! End-to-end render pipeline: geometry, source selection, sampling.

use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use log::{debug, info};

use crate::{
    hex_centers, pick, quantize, sample, tri_centers, AlternationPattern, PixelBuffer, Point,
    PointField, Polygon, Relaxer, Result, Rgb, Subdivision, TesseraError, WeightField,
};

const MIN_SIZE: f64 = 1e-3;
const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Tessellation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Regular hex or triangle grid
    #[default]
    Lattice,
    /// Polygons around random (optionally relaxed) sites
    Voronoi,
    /// Dots at darkness-relaxed sites
    Stipple,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lattice" | "grid" => Ok(Self::Lattice),
            "voronoi" | "mosaic" => Ok(Self::Voronoi),
            "stipple" | "dots" => Ok(Self::Stipple),
            _ => Err(format!(
                "unknown mode '{}' (expected lattice, voronoi or stipple)",
                s
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lattice => "lattice",
            Self::Voronoi => "voronoi",
            Self::Stipple => "stipple",
        })
    }
}

/// Cell shape in [`Mode::Lattice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LatticeShape {
    #[default]
    Hexagon,
    Triangle,
}

impl FromStr for LatticeShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" | "hexagon" => Ok(Self::Hexagon),
            "tri" | "triangle" => Ok(Self::Triangle),
            _ => Err(format!("unknown lattice '{}' (expected hex or triangle)", s)),
        }
    }
}

impl fmt::Display for LatticeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hexagon => "hex",
            Self::Triangle => "triangle",
        })
    }
}

/// Parameters of one render request.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub mode: Mode,
    pub lattice: LatticeShape,
    /// Cell size in pixels (hex circumradius, triangle side, site spacing)
    pub size: f64,
    /// Spacing left between neighboring shapes
    pub gap: f64,
    pub pattern: AlternationPattern,
    pub relax_iterations: u32,
    /// Palette size applied to every source before sampling
    pub quantize_colors: Option<u32>,
    /// Site count for Voronoi/Stipple; derived from `size` when absent
    pub points: Option<usize>,
    pub seed: u64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            mode: Mode::Lattice,
            lattice: LatticeShape::Hexagon,
            size: 12.0,
            gap: 0.0,
            pattern: AlternationPattern::Checkerboard,
            relax_iterations: 0,
            quantize_colors: None,
            points: None,
            seed: 0,
        }
    }
}

/// Geometry of one emitted cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Pointy-top hexagon
    Hexagon { center: Point, radius: f64 },
    /// Equilateral triangle; `inverted` points its apex down
    Triangle {
        center: Point,
        radius: f64,
        inverted: bool,
    },
    Polygon(Polygon),
    Dot { center: Point, radius: f64 },
}

impl Shape {
    /// Drawable outline. Dots are approximated with a 24-gon.
    pub fn outline(&self) -> Vec<Point> {
        let ring = |center: &Point, radius: f64, sides: usize, start_deg: f64| {
            (0..sides)
                .map(|k| {
                    let angle = (start_deg + 360.0 * k as f64 / sides as f64).to_radians();
                    Point::new(
                        center.x + radius * angle.cos(),
                        center.y + radius * angle.sin(),
                    )
                })
                .collect::<Vec<_>>()
        };
        match self {
            Shape::Hexagon { center, radius } => ring(center, *radius, 6, -90.0),
            Shape::Triangle {
                center,
                radius,
                inverted,
            } => {
                // y grows downward: -90 degrees is the top apex
                let start = if *inverted { 90.0 } else { -90.0 };
                ring(center, *radius, 3, start)
            }
            Shape::Polygon(polygon) => polygon.vertices.clone(),
            Shape::Dot { center, radius } => ring(center, *radius, 24, 0.0),
        }
    }

    pub fn center(&self) -> Option<Point> {
        match self {
            Shape::Hexagon { center, .. }
            | Shape::Triangle { center, .. }
            | Shape::Dot { center, .. } => Some(*center),
            Shape::Polygon(polygon) => polygon.centroid(),
        }
    }
}

/// A shape and the color sampled for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub shape: Shape,
    pub color: Rgb,
}

/// Render `sources` into tiles.
pub fn render(sources: &[PixelBuffer<'_>], params: &RenderParams) -> Result<Vec<Tile>> {
    render_with(sources, params, |_, _| ControlFlow::Continue(()))
}

/// Render `sources`, reporting each relaxation pass as `(done, total)`.
///
/// Returning [`ControlFlow::Break`] stops relaxing; the tiles are built from
/// the points reached so far.
pub fn render_with<F>(
    sources: &[PixelBuffer<'_>],
    params: &RenderParams,
    mut on_iteration: F,
) -> Result<Vec<Tile>>
where
    F: FnMut(u32, u32) -> ControlFlow<()>,
{
    let (width, height) = check_sources(sources)?;
    let size = if params.size.is_finite() && params.size > MIN_SIZE {
        params.size
    } else {
        MIN_SIZE
    };
    let gap = if params.gap.is_finite() { params.gap.max(0.0) } else { 0.0 };

    // Quantized copies must outlive the views sampled below
    let quantized: Option<Vec<image::RgbaImage>> = params.quantize_colors.map(|colors| {
        debug!("quantizing {} sources to {} colors", sources.len(), colors);
        sources.iter().map(|s| quantize(s, colors)).collect()
    });
    let views: Vec<PixelBuffer<'_>> = match &quantized {
        Some(images) => images
            .iter()
            .map(PixelBuffer::from_image)
            .collect::<Result<_>>()?,
        None => sources.to_vec(),
    };

    let tiles = match params.mode {
        Mode::Lattice => lattice_tiles(&views, params, size, gap, width, height),
        Mode::Voronoi | Mode::Stipple => {
            let weights = match params.mode {
                Mode::Stipple => WeightField::Darkness(sources[0]),
                _ => WeightField::Uniform,
            };
            let points = relaxed_points(params, size, weights, width, height, &mut on_iteration);
            site_tiles(&views, params, &points, size, gap, width, height)
        }
    };
    info!(
        "rendered {} tiles ({}, {}x{}, {} sources)",
        tiles.len(),
        params.mode,
        width,
        height,
        sources.len()
    );
    Ok(tiles)
}

fn check_sources(sources: &[PixelBuffer<'_>]) -> Result<(u32, u32)> {
    let first = sources.first().ok_or(TesseraError::NoSources)?;
    let (width, height) = first.dimensions();
    for (index, source) in sources.iter().enumerate().skip(1) {
        let (actual_width, actual_height) = source.dimensions();
        if (actual_width, actual_height) != (width, height) {
            return Err(TesseraError::SourceSizeMismatch {
                index,
                width,
                height,
                actual_width,
                actual_height,
            });
        }
    }
    Ok((width, height))
}

fn lattice_tiles(
    sources: &[PixelBuffer<'_>],
    params: &RenderParams,
    size: f64,
    gap: f64,
    width: u32,
    height: u32,
) -> Vec<Tile> {
    let (w, h) = (width as f64, height as f64);
    let color_at = |col: i64, row: i64, x: f64, y: f64| {
        let index = pick(col, row, params.pattern, sources.len());
        sample(&sources[index], x, y)
    };

    match params.lattice {
        LatticeShape::Hexagon => {
            let radius = (size - gap / 2.0).max(0.0);
            hex_centers(w, h, size)
                .map(|c| Tile {
                    shape: Shape::Hexagon {
                        center: Point::new(c.x, c.y),
                        radius,
                    },
                    color: color_at(c.col, c.row, c.x, c.y),
                })
                .collect()
        }
        LatticeShape::Triangle => {
            let radius = (size / SQRT_3 - gap / 2.0).max(0.0);
            tri_centers(w, h, size)
                .map(|c| Tile {
                    shape: Shape::Triangle {
                        center: Point::new(c.x, c.y),
                        radius,
                        inverted: c.inverted,
                    },
                    color: color_at(c.col, c.row, c.x, c.y),
                })
                .collect()
        }
    }
}

fn relaxed_points<F>(
    params: &RenderParams,
    size: f64,
    weights: WeightField<'_>,
    width: u32,
    height: u32,
    on_iteration: &mut F,
) -> Vec<Point>
where
    F: FnMut(u32, u32) -> ControlFlow<()>,
{
    let (w, h) = (width as f64, height as f64);
    let count = params
        .points
        .unwrap_or_else(|| ((w * h) / (size * size)).round().max(1.0) as usize);
    let field = PointField::random(w, h, count, params.seed);

    let total = params.relax_iterations;
    let mut relaxer = Relaxer::new(field.into_points(), weights, width, height);
    for done in 1..=total {
        if relaxer.points().is_empty() {
            break;
        }
        relaxer.step();
        if on_iteration(done, total).is_break() {
            info!("relaxation stopped after {} of {} passes", done, total);
            break;
        }
    }
    relaxer.into_points()
}

fn site_tiles(
    sources: &[PixelBuffer<'_>],
    params: &RenderParams,
    points: &[Point],
    size: f64,
    gap: f64,
    width: u32,
    height: u32,
) -> Vec<Tile> {
    let subdivision = Subdivision::build(points, width as f64, height as f64);
    subdivision
        .cells()
        .filter(|cell| !cell.polygon.is_empty())
        .map(|cell| {
            let site = points[cell.site];
            let col = (site.x / size).floor() as i64;
            let row = (site.y / size).floor() as i64;
            let index = pick(col, row, params.pattern, sources.len());
            let color = sample(&sources[index], site.x, site.y);
            let shape = match params.mode {
                Mode::Stipple => Shape::Dot {
                    center: site,
                    radius: ((size - gap) / 2.0).max(0.0),
                },
                _ => Shape::Polygon(cell.polygon.inset(gap / 2.0)),
            };
            Tile { shape, color }
        })
        .collect()
}

//! Tessera CLI
//!
//! Renders one or more images as a hex/triangle lattice, a Voronoi mosaic,
//! or a stipple field.
//!
//! ## YAML spec file
//!
//! ```yaml
//! inputs: [a.jpg, b.jpg]
//! mode: voronoi
//! size: 14
//! gap: 1
//! pattern: checkerboard
//! relax: 4
//! colors: 16
//! seed: 7
//! width: 1200
//! ```
//!
//! Run with: `tessera -o out.png --spec mosaic.yaml`
//!
//! Explicit flags override the spec file:
//!
//!   tessera -i a.jpg -i b.jpg -o out.png --mode lattice --lattice tri --size 10
//!
//! ## Graceful interruption
//!
//! Relaxation can take a while on large canvases. Press Ctrl+C to stop
//! relaxing; the image is still rendered from the points reached so far.

mod raster;

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;

use tessera_core::{AlternationPattern, LatticeShape, Mode, PixelBuffer, RenderParams};

/// YAML spec file format
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TessSpec {
    #[serde(default)]
    inputs: Vec<PathBuf>,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    lattice: Option<String>,
    #[serde(default)]
    size: Option<f64>,
    #[serde(default)]
    gap: Option<f64>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    relax: Option<u32>,
    #[serde(default)]
    colors: Option<u32>,
    #[serde(default)]
    points: Option<usize>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    background: Option<String>,
}

fn load_spec(path: &PathBuf) -> anyhow::Result<TessSpec> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read spec file: {:?}", path))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse spec file: {:?}", path))
}

/// Resolve target dimensions from spec and CLI overrides.
/// CLI args take precedence over spec values.
/// If only one dimension is given, the other is computed to preserve aspect ratio.
fn resolve_dimensions(
    orig_w: u32,
    orig_h: u32,
    spec_w: Option<u32>,
    spec_h: Option<u32>,
    cli_w: Option<u32>,
    cli_h: Option<u32>,
) -> (u32, u32) {
    let w = cli_w.or(spec_w);
    let h = cli_h.or(spec_h);
    let (rw, rh) = match (w, h) {
        (Some(tw), Some(th)) => (tw, th),
        (Some(tw), None) => {
            let th = (orig_h as f64 * tw as f64 / orig_w as f64).round() as u32;
            (tw, th)
        }
        (None, Some(th)) => {
            let tw = (orig_w as f64 * th as f64 / orig_h as f64).round() as u32;
            (tw, th)
        }
        (None, None) => (orig_w, orig_h),
    };
    (rw.max(1), rh.max(1))
}

/// Parse `#rrggbb` / `rrggbb` into an RGBA pixel
fn parse_color(s: &str) -> anyhow::Result<image::Rgba<u8>> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        anyhow::bail!("invalid color '{}' (expected #rrggbb)", s);
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("invalid color '{}'", s))
    };
    Ok(image::Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

#[derive(Parser, Debug)]
#[command(name = "tessera")]
#[command(about = "Render images as tessellated compositions", long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Input image path (repeat for multiple sources)
    #[arg(short, long)]
    input: Vec<PathBuf>,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,

    /// Tessellation mode: lattice | voronoi | stipple
    #[arg(short, long)]
    mode: Option<String>,

    /// Lattice cell shape: hex | triangle
    #[arg(long)]
    lattice: Option<String>,

    /// Cell size in pixels
    #[arg(short, long)]
    size: Option<f64>,

    /// Gap between cells in pixels
    #[arg(long)]
    gap: Option<f64>,

    /// Source alternation: checkerboard | rows | cols | random
    #[arg(short, long)]
    pattern: Option<String>,

    /// Relaxation passes (voronoi/stipple)
    #[arg(long)]
    relax: Option<u32>,

    /// Quantize sources to this many colors (2-256)
    #[arg(long)]
    colors: Option<u32>,

    /// Number of sites (voronoi/stipple); derived from size by default
    #[arg(long)]
    points: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// YAML spec file with render parameters
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Output image width (scales input; preserves aspect ratio if only one dim given)
    #[arg(long)]
    width: Option<u32>,

    /// Output image height (scales input; preserves aspect ratio if only one dim given)
    #[arg(long)]
    height: Option<u32>,

    /// Background color behind gaps, as #rrggbb
    #[arg(long)]
    background: Option<String>,
}

/// Merge CLI flags over spec values over defaults.
fn build_params(args: &Args, spec: &TessSpec) -> anyhow::Result<RenderParams> {
    let defaults = RenderParams::default();
    let parse = |cli: &Option<String>, spec: &Option<String>| cli.clone().or_else(|| spec.clone());

    let mode = parse(&args.mode, &spec.mode)
        .map(|s| s.parse::<Mode>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?
        .unwrap_or(defaults.mode);
    let lattice = parse(&args.lattice, &spec.lattice)
        .map(|s| s.parse::<LatticeShape>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?
        .unwrap_or(defaults.lattice);
    let pattern = parse(&args.pattern, &spec.pattern)
        .map(|s| s.parse::<AlternationPattern>())
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?
        .unwrap_or(defaults.pattern);

    let size = args.size.or(spec.size).unwrap_or(defaults.size);
    if !(size > 0.0) {
        anyhow::bail!("size must be positive, got {}", size);
    }
    let gap = args.gap.or(spec.gap).unwrap_or(defaults.gap);
    if gap < 0.0 {
        anyhow::bail!("gap must not be negative, got {}", gap);
    }
    let quantize_colors = args.colors.or(spec.colors);
    if let Some(colors) = quantize_colors {
        if !(2..=256).contains(&colors) {
            eprintln!("Warning: --colors {} outside 2-256; keeping original colors", colors);
        }
    }

    Ok(RenderParams {
        mode,
        lattice,
        size,
        gap,
        pattern,
        relax_iterations: args.relax.or(spec.relax).unwrap_or(defaults.relax_iterations),
        quantize_colors,
        points: args.points.or(spec.points),
        seed: args.seed.or(spec.seed).unwrap_or(defaults.seed),
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Set up SIGINT handler
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::SeqCst);
        })
        .context("failed to set Ctrl-C handler")?;
    }

    let spec = args.spec.as_ref().map(load_spec).transpose()?.unwrap_or_default();
    let params = build_params(&args, &spec)?;
    log::debug!("render params: {:?}", params);

    let inputs = if args.input.is_empty() { &spec.inputs } else { &args.input };
    if inputs.is_empty() {
        anyhow::bail!("no input images (use -i/--input or `inputs:` in the spec file)");
    }

    // Load input images; the first one fixes the canvas size
    let mut images = Vec::with_capacity(inputs.len());
    for path in inputs {
        println!("Loading image: {:?}", path);
        let image = image::open(path)
            .with_context(|| format!("failed to open image: {:?}", path))?
            .to_rgba8();
        images.push(image);
    }
    let (orig_w, orig_h) = images[0].dimensions();
    let (width, height) =
        resolve_dimensions(orig_w, orig_h, spec.width, spec.height, args.width, args.height);

    for image in &mut images {
        if image.dimensions() != (width, height) {
            println!("Resizing {}x{} -> {}x{}", image.width(), image.height(), width, height);
            *image = image::imageops::resize(
                &*image,
                width,
                height,
                image::imageops::FilterType::Lanczos3,
            );
        }
    }
    println!("Canvas size: {}x{}", width, height);

    let sources = images
        .iter()
        .map(PixelBuffer::from_image)
        .collect::<Result<Vec<_>, _>>()?;

    println!(
        "Rendering {} (size {}, gap {}, pattern {}, {} source{})",
        if params.mode == Mode::Lattice {
            format!("{} lattice", params.lattice)
        } else {
            params.mode.to_string()
        },
        params.size,
        params.gap,
        params.pattern,
        sources.len(),
        if sources.len() == 1 { "" } else { "s" }
    );

    let relaxing = params.mode != Mode::Lattice && params.relax_iterations > 0;
    let progress = if relaxing {
        let bar = ProgressBar::new(params.relax_iterations as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} passes ({eta})")?
                .progress_chars("#>-"),
        );
        Some(bar)
    } else {
        None
    };

    let tiles = tessera_core::render_with(&sources, &params, |_, _| {
        if let Some(bar) = &progress {
            bar.inc(1);
        }
        if interrupted.load(Ordering::Relaxed) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    if let Some(bar) = progress {
        if interrupted.load(Ordering::Relaxed) {
            bar.abandon_with_message("Interrupted");
            eprintln!("Interrupted, rendering from the points relaxed so far...");
        } else {
            bar.finish_with_message("Relaxation complete");
        }
    }

    let background = args
        .background
        .as_ref()
        .or(spec.background.as_ref())
        .map(|s| parse_color(s))
        .transpose()?
        .unwrap_or(image::Rgba([0, 0, 0, 255]));

    let mut canvas = image::RgbaImage::from_pixel(width, height, background);
    raster::draw_tiles(&mut canvas, &tiles);
    canvas
        .save(&args.output)
        .with_context(|| format!("failed to save output: {:?}", args.output))?;

    println!("Output saved to: {:?} ({} tiles)", args.output, tiles.len());
    Ok(())
}

//! Median-cut palette quantization in RGB.

use log::trace;

use crate::{PixelBuffer, Rgb};

/// Pixels with lower alpha do not contribute to the palette.
const MIN_OPAQUE_ALPHA: u8 = 128;

/// Upper bound on candidate pixels used to build a palette.
const MAX_CANDIDATES: usize = 5000;

/// Reduced color set, at most 256 entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Index of the closest entry by squared RGB distance; first minimum wins.
    pub fn nearest(&self, rgb: Rgb) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;
        for (i, c) in self.colors.iter().enumerate() {
            let d = distance_sq(*c, rgb);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }
}

#[inline]
fn distance_sq(a: Rgb, b: Rgb) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// A box of colors for median cut subdivision.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<Rgb>,
}

impl ColorBox {
    /// Range (max - min) per channel.
    fn ranges(&self) -> [u8; 3] {
        let mut lo = [u8::MAX; 3];
        let mut hi = [u8::MIN; 3];
        for c in &self.colors {
            for ch in 0..3 {
                lo[ch] = lo[ch].min(c[ch]);
                hi[ch] = hi[ch].max(c[ch]);
            }
        }
        [
            hi[0].saturating_sub(lo[0]),
            hi[1].saturating_sub(lo[1]),
            hi[2].saturating_sub(lo[2]),
        ]
    }

    fn widest_channel(&self) -> (usize, u8) {
        let ranges = self.ranges();
        // Ties prefer the earlier channel
        let mut axis = 0;
        for ch in 1..3 {
            if ranges[ch] > ranges[axis] {
                axis = ch;
            }
        }
        (axis, ranges[axis])
    }

    fn can_split(&self) -> bool {
        self.colors.len() >= 2 && self.widest_channel().1 > 0
    }

    /// Split priority: populous boxes with wide color spread split first.
    fn priority(&self) -> u64 {
        self.colors.len() as u64 * self.widest_channel().1 as u64
    }

    fn mean(&self) -> Rgb {
        let n = self.colors.len().max(1) as u64;
        let mut sums = [0u64; 3];
        for c in &self.colors {
            for ch in 0..3 {
                sums[ch] += c[ch] as u64;
            }
        }
        [
            ((sums[0] + n / 2) / n) as u8,
            ((sums[1] + n / 2) / n) as u8,
            ((sums[2] + n / 2) / n) as u8,
        ]
    }

    /// Split along the widest channel at the median.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (axis, _) = self.widest_channel();
        self.colors.sort_by_key(|c| c[axis]);

        // Median, nudged so equal values stay on one side when possible
        let mut split_idx = self.colors.len() / 2;
        let pivot = self.colors[split_idx][axis];
        let first_equal = self.colors.partition_point(|c| c[axis] < pivot);
        if first_equal > 0 {
            split_idx = first_equal;
        } else {
            split_idx = self.colors.partition_point(|c| c[axis] <= pivot);
        }
        split_idx = split_idx.clamp(1, self.colors.len() - 1);

        let right = self.colors.split_off(split_idx);
        (ColorBox { colors: self.colors }, ColorBox { colors: right })
    }
}

/// Opaque pixels, stride-sampled down to at most [`MAX_CANDIDATES`].
fn candidates(buffer: &PixelBuffer<'_>) -> Vec<Rgb> {
    let opaque: Vec<Rgb> = buffer
        .pixels()
        .filter(|px| px[3] >= MIN_OPAQUE_ALPHA)
        .map(|[r, g, b, _]| [r, g, b])
        .collect();
    if opaque.len() <= MAX_CANDIDATES {
        return opaque;
    }
    let stride = opaque.len().div_ceil(MAX_CANDIDATES);
    opaque.into_iter().step_by(stride).collect()
}

/// Build a palette of at most `color_count` colors.
///
/// `color_count` outside `[2, 256]` yields an empty palette, which [`remap`]
/// treats as "keep the original colors". Pixels with alpha below 128 are
/// ignored.
pub fn build_palette(buffer: &PixelBuffer<'_>, color_count: u32) -> Palette {
    if !(2..=256).contains(&color_count) {
        return Palette::default();
    }
    let colors = candidates(buffer);
    if colors.is_empty() {
        return Palette::default();
    }
    let max_colors = color_count as usize;

    let mut boxes = Vec::with_capacity(max_colors);
    boxes.push(ColorBox { colors });

    while boxes.len() < max_colors {
        let best_idx = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.can_split())
            .max_by_key(|(i, b)| (b.priority(), std::cmp::Reverse(*i)))
            .map(|(i, _)| i);

        let Some(idx) = best_idx else {
            break; // Every box holds a single color
        };

        let to_split = boxes.remove(idx);
        let (left, right) = to_split.split();
        boxes.insert(idx, right);
        boxes.insert(idx, left);
    }

    let palette = Palette::new(boxes.iter().map(ColorBox::mean).collect());
    trace!("built palette of {} colors (requested {})", palette.len(), color_count);
    palette
}

/// Replace every pixel with its nearest palette color in a new buffer.
///
/// Alpha is kept; fully transparent pixels become `[0, 0, 0, 0]`. An empty
/// palette returns an identical copy.
pub fn remap(buffer: &PixelBuffer<'_>, palette: &Palette) -> image::RgbaImage {
    let (width, height) = buffer.dimensions();
    if palette.is_empty() {
        return image::RgbaImage::from_raw(width, height, buffer.as_raw().to_vec())
            .unwrap_or_else(|| image::RgbaImage::new(width, height));
    }

    let mut out = image::RgbaImage::new(width, height);
    for (dst, [r, g, b, a]) in out.pixels_mut().zip(buffer.pixels()) {
        if a == 0 {
            *dst = image::Rgba([0, 0, 0, 0]);
            continue;
        }
        let rgb = palette
            .nearest([r, g, b])
            .map_or([r, g, b], |i| palette.colors[i]);
        *dst = image::Rgba([rgb[0], rgb[1], rgb[2], a]);
    }
    out
}

/// Build a palette from `buffer` and remap it.
pub fn quantize(buffer: &PixelBuffer<'_>, color_count: u32) -> image::RgbaImage {
    let palette = build_palette(buffer, color_count);
    remap(buffer, &palette)
}

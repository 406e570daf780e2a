//! Borrowed RGBA pixel buffers.

use crate::{Result, Rgba, TesseraError};

/// Read-only view over `width * height` RGBA8 samples, row-major.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TesseraError::ZeroDimension);
        }
        if data.len() != width as usize * height as usize * 4 {
            return Err(TesseraError::DimensionMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self { data, width, height })
    }

    /// View an `image::RgbaImage`.
    pub fn from_image(image: &'a image::RgbaImage) -> Result<Self> {
        Self::new(image.as_raw(), image.width(), image.height())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &'a [u8] {
        self.data
    }

    /// Pixel at integer coordinates. Caller guarantees they are in range.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    pub fn pixels(&self) -> impl Iterator<Item = Rgba> + 'a {
        self.data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }
}

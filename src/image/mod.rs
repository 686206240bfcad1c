//! Packed RGB565 images.
//!
//! An [`Image`] owns a row-major buffer of big-endian RGB565 pixels, the same
//! layout the panel expects on the wire, so a whole image can be streamed to
//! the display without conversion.

pub mod color;
mod dither;
pub mod resize;
pub mod yuv;

use crate::image::color::{Rgb565, Rgb8};
use thiserror::Error;

pub const BYTES_PER_PIXEL: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
    #[error("unable to allocate a {width}x{height} image")]
    AllocationFailed { width: i16, height: i16 },
    #[error("pixel buffer too small: need {required} bytes, have {actual}")]
    BufferTooSmall { required: usize, actual: usize },
}

/// How colours are written into an image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate each channel straight to 5-6-5.
    Direct,
    /// Add an 8x8 ordered-dither offset before truncating.
    Dithered,
}

impl WriteMode {
    pub fn from_dither(dither: bool) -> Self {
        if dither {
            WriteMode::Dithered
        } else {
            WriteMode::Direct
        }
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    width: i16,
    height: i16,
    mode: WriteMode,
    buffer: Vec<u8>,
}

impl Image {
    /// Allocate a zeroed (black) image.
    pub fn new(width: i16, height: i16, mode: WriteMode) -> Result<Image, ImageError> {
        if width <= 0 || height <= 0 {
            return Err(ImageError::InvalidDimensions {
                width: width.into(),
                height: height.into(),
            });
        }

        let size = width as usize * height as usize * BYTES_PER_PIXEL;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(size)
            .map_err(|_| ImageError::AllocationFailed { width, height })?;
        buffer.resize(size, 0);

        Ok(Image {
            width,
            height,
            mode,
            buffer,
        })
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width.max(0) as usize * BYTES_PER_PIXEL
    }

    /// The pixel buffer in wire order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    fn offset(&self, x: i16, y: i16) -> Option<usize> {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return None;
        }
        Some((x as usize + y as usize * self.width as usize) * BYTES_PER_PIXEL)
    }

    fn store(&mut self, offset: usize, packed: Rgb565) {
        self.buffer[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&packed.to_be_bytes());
    }

    /// Fill the image with `colour`.
    ///
    /// A dithered image is cleared pixel by pixel through the dither pattern,
    /// so the result is textured rather than flat.
    pub fn clear(&mut self, colour: &Rgb8) {
        match self.mode {
            WriteMode::Direct => self.clear_rgb565(colour.pack()),
            WriteMode::Dithered => {
                for y in 0..self.height {
                    for x in 0..self.width {
                        self.set_pixel(x, y, colour);
                    }
                }
            }
        }
    }

    /// Fill the image with an already packed colour, ignoring the write mode.
    pub fn clear_rgb565(&mut self, packed: Rgb565) {
        let bytes = packed.to_be_bytes();
        for pixel in self.buffer.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&bytes);
        }
    }

    /// Returns `false`, leaving the image untouched, when `(x, y)` is outside it.
    pub fn set_pixel(&mut self, x: i16, y: i16, colour: &Rgb8) -> bool {
        let Some(offset) = self.offset(x, y) else {
            return false;
        };

        let colour = match self.mode {
            WriteMode::Direct => *colour,
            WriteMode::Dithered => dither::dither(x, y, colour),
        };
        self.store(offset, colour.pack());
        true
    }

    pub fn set_pixel_rgb565(&mut self, x: i16, y: i16, packed: Rgb565) -> bool {
        let Some(offset) = self.offset(x, y) else {
            return false;
        };
        self.store(offset, packed);
        true
    }

    /// Read back the stored colour. Dithered images are not un-dithered.
    pub fn get_pixel(&self, x: i16, y: i16) -> Option<Rgb8> {
        self.get_pixel_rgb565(x, y).map(Rgb565::unpack)
    }

    pub fn get_pixel_rgb565(&self, x: i16, y: i16) -> Option<Rgb565> {
        let offset = self.offset(x, y)?;
        Some(Rgb565::from_be_bytes([
            self.buffer[offset],
            self.buffer[offset + 1],
        ]))
    }

    /// Release the buffer. Every later access is out of bounds; calling this
    /// twice is harmless.
    pub fn destroy(&mut self) {
        self.buffer = Vec::new();
        self.width = 0;
        self.height = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn distinct_pixels(image: &Image) -> HashSet<[u8; 2]> {
        image
            .as_bytes()
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|p| [p[0], p[1]])
            .collect()
    }

    #[test]
    fn new_image_is_black() {
        let image = Image::new(3, 2, WriteMode::Direct).unwrap();
        assert_eq!(image.as_bytes().len(), 3 * 2 * BYTES_PER_PIXEL);
        assert!(image.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(image.pitch(), 6);
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert_eq!(
            Image::new(0, 10, WriteMode::Direct).unwrap_err(),
            ImageError::InvalidDimensions { width: 0, height: 10 }
        );
        assert!(Image::new(10, -1, WriteMode::Dithered).is_err());
    }

    #[test]
    fn pixels_round_trip() {
        let mut image = Image::new(4, 4, WriteMode::Direct).unwrap();
        assert!(image.set_pixel(0, 0, &Rgb8::new(255, 0, 0)));
        assert!(image.set_pixel(3, 3, &Rgb8::new(0, 0, 255)));

        assert_eq!(image.get_pixel(0, 0), Some(Rgb8::new(255, 0, 0)));
        assert_eq!(image.get_pixel(3, 3), Some(Rgb8::new(0, 0, 255)));
        assert_eq!(image.get_pixel(1, 1), Some(Rgb8::BLACK));
    }

    #[test]
    fn stores_big_endian() {
        let mut image = Image::new(2, 1, WriteMode::Direct).unwrap();
        image.set_pixel(1, 0, &Rgb8::new(0, 255, 0));
        assert_eq!(image.as_bytes(), &[0x00, 0x00, 0x07, 0xE0]);
    }

    #[test]
    fn out_of_bounds_is_a_no_op() {
        let mut image = Image::new(5, 4, WriteMode::Direct).unwrap();
        let before = image.as_bytes().to_vec();

        for (x, y) in [(-1, 0), (5, 0), (0, -1), (0, 4)] {
            assert!(!image.set_pixel(x, y, &Rgb8::WHITE));
            assert!(!image.set_pixel_rgb565(x, y, Rgb565(0xFFFF)));
            assert_eq!(image.get_pixel(x, y), None);
        }
        assert_eq!(image.as_bytes(), before.as_slice());
    }

    #[test]
    fn dithered_clear_is_textured() {
        let colour = Rgb8::new(100, 150, 200);

        let mut dithered = Image::new(16, 16, WriteMode::Dithered).unwrap();
        dithered.clear(&colour);
        assert!(distinct_pixels(&dithered).len() > 1);

        let mut direct = Image::new(16, 16, WriteMode::Direct).unwrap();
        direct.clear(&colour);
        assert_eq!(distinct_pixels(&direct).len(), 1);
    }

    #[test]
    fn dithered_read_returns_stored_value() {
        let mut image = Image::new(8, 8, WriteMode::Dithered).unwrap();
        let grey = Rgb8::new(100, 100, 100);
        image.set_pixel(1, 0, &grey);
        // 106, 103, 106 truncated to 5-6-5 then expanded
        assert_eq!(image.get_pixel(1, 0), Some(Rgb8::new(107, 101, 107)));
    }

    #[test]
    fn clear_rgb565_is_flat_even_when_dithered() {
        let mut image = Image::new(8, 8, WriteMode::Dithered).unwrap();
        image.clear_rgb565(Rgb565(0x1234));
        assert_eq!(distinct_pixels(&image).len(), 1);
        assert_eq!(image.get_pixel_rgb565(7, 7), Some(Rgb565(0x1234)));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut image = Image::new(4, 4, WriteMode::Direct).unwrap();
        image.destroy();
        image.destroy();
        assert_eq!(image.width(), 0);
        assert_eq!(image.height(), 0);
        assert!(image.as_bytes().is_empty());
        assert!(!image.set_pixel(0, 0, &Rgb8::WHITE));
    }
}

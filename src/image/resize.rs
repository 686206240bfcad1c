//! Nearest-neighbour scaling between packed 16-bit pixel buffers.
//!
//! Scale factors are 16.16 fixed point and carry a +1 bias so that the last
//! destination row and column never map past the end of the source.

use crate::image::{Image, ImageError, WriteMode, BYTES_PER_PIXEL};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NearestNeighbour {
    destination_width: i16,
    destination_height: i16,
    source_width: i16,
    source_height: i16,
    x_ratio: i32,
    y_ratio: i32,
}

impl NearestNeighbour {
    /// Plan a resize of a `source_width` x `source_height` buffer into at most
    /// `destination_width` x `destination_height` pixels.
    ///
    /// With `keep_aspect_ratio` the larger of the two ratios is used for both
    /// axes and the other destination extent shrinks to match. Returns
    /// [`ImageError::InvalidDimensions`] unless every dimension is positive.
    pub fn new(
        destination_width: i16,
        destination_height: i16,
        source_width: i16,
        source_height: i16,
        keep_aspect_ratio: bool,
    ) -> Result<Self, ImageError> {
        for (width, height) in [
            (destination_width, destination_height),
            (source_width, source_height),
        ] {
            if width <= 0 || height <= 0 {
                return Err(ImageError::InvalidDimensions {
                    width: i32::from(width),
                    height: i32::from(height),
                });
            }
        }

        let mut x_ratio = (i32::from(source_width) << 16) / i32::from(destination_width) + 1;
        let mut y_ratio = (i32::from(source_height) << 16) / i32::from(destination_height) + 1;

        let mut width = destination_width;
        let mut height = destination_height;

        if keep_aspect_ratio {
            if x_ratio < y_ratio {
                x_ratio = y_ratio;
                width = (i32::from(source_width) * i32::from(destination_height)
                    / i32::from(source_height)) as i16;
            } else {
                y_ratio = x_ratio;
                height = (i32::from(destination_width) * i32::from(source_height)
                    / i32::from(source_width)) as i16;
            }
        }

        Ok(NearestNeighbour {
            destination_width: width,
            destination_height: height,
            source_width,
            source_height,
            x_ratio,
            y_ratio,
        })
    }

    pub fn destination_width(&self) -> i16 {
        self.destination_width
    }

    pub fn destination_height(&self) -> i16 {
        self.destination_height
    }

    pub fn source_width(&self) -> i16 {
        self.source_width
    }

    pub fn source_height(&self) -> i16 {
        self.source_height
    }

    pub fn x_ratio(&self) -> i32 {
        self.x_ratio
    }

    pub fn y_ratio(&self) -> i32 {
        self.y_ratio
    }

    fn source_index(i: i16, ratio: i32) -> usize {
        ((i64::from(i) * i64::from(ratio)) >> 16) as usize
    }

    /// Copy pixels from `source` to `destination`. Pitches are in bytes and
    /// may include row padding.
    pub fn resize(
        &self,
        destination: &mut [u8],
        destination_pitch: usize,
        source: &[u8],
        source_pitch: usize,
    ) -> Result<(), ImageError> {
        if self.destination_width <= 0 || self.destination_height <= 0 {
            return Ok(());
        }

        let last_row = self.destination_height - 1;
        let last_column = self.destination_width - 1;

        let required = last_row as usize * destination_pitch
            + self.destination_width as usize * BYTES_PER_PIXEL;
        if destination.len() < required {
            return Err(ImageError::BufferTooSmall {
                required,
                actual: destination.len(),
            });
        }

        let required = Self::source_index(last_row, self.y_ratio) * source_pitch
            + (Self::source_index(last_column, self.x_ratio) + 1) * BYTES_PER_PIXEL;
        if source.len() < required {
            return Err(ImageError::BufferTooSmall {
                required,
                actual: source.len(),
            });
        }

        for j in 0..self.destination_height {
            let source_row = Self::source_index(j, self.y_ratio) * source_pitch;
            let destination_row = j as usize * destination_pitch;

            for i in 0..self.destination_width {
                let from = source_row + Self::source_index(i, self.x_ratio) * BYTES_PER_PIXEL;
                let to = destination_row + i as usize * BYTES_PER_PIXEL;
                destination[to..to + BYTES_PER_PIXEL]
                    .copy_from_slice(&source[from..from + BYTES_PER_PIXEL]);
            }
        }

        Ok(())
    }

    /// Resize `source` into a newly allocated direct-mode image of the planned
    /// destination size.
    pub fn resize_image(&self, source: &Image) -> Result<Image, ImageError> {
        let mut destination = Image::new(
            self.destination_width,
            self.destination_height,
            WriteMode::Direct,
        )?;
        let pitch = destination.pitch();
        self.resize(
            destination.as_bytes_mut(),
            pitch,
            source.as_bytes(),
            source.pitch(),
        )?;
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::color::Rgb565;

    #[test]
    fn ratios_carry_bias() {
        let nn = NearestNeighbour::new(100, 50, 200, 50, false).unwrap();
        assert_eq!(nn.x_ratio(), (2 << 16) + 1);
        assert_eq!(nn.y_ratio(), (1 << 16) + 1);
    }

    #[test]
    fn keeps_aspect_ratio_when_width_limits() {
        let nn = NearestNeighbour::new(400, 300, 800, 450, true).unwrap();
        assert_eq!(nn.destination_width(), 400);
        assert_eq!(nn.destination_height(), 225);
        assert_eq!(nn.x_ratio(), nn.y_ratio());
    }

    #[test]
    fn keeps_aspect_ratio_when_height_limits() {
        let nn = NearestNeighbour::new(320, 240, 480, 480, true).unwrap();
        assert_eq!(nn.destination_width(), 240);
        assert_eq!(nn.destination_height(), 240);
    }

    #[test]
    fn halves_through_padded_pitch() {
        // 4x2 source with 2 bytes of padding per row
        let source_pitch = 10;
        let mut source = vec![0xEE; source_pitch * 2];
        for y in 0..2 {
            for x in 0..4 {
                let offset = y * source_pitch + x * 2;
                source[offset..offset + 2].copy_from_slice(&Rgb565((y * 4 + x) as u16).to_be_bytes());
            }
        }

        let nn = NearestNeighbour::new(2, 1, 4, 2, false).unwrap();
        let mut destination = vec![0; 4];
        nn.resize(&mut destination, 4, &source, source_pitch).unwrap();

        assert_eq!(destination, vec![0, 0, 0, 2]);
    }

    #[test]
    fn rejects_short_buffers() {
        let nn = NearestNeighbour::new(4, 4, 4, 4, false).unwrap();
        let source = vec![0; 4 * 4 * 2];
        let mut destination = vec![0; 10];
        assert_eq!(
            nn.resize(&mut destination, 8, &source, 8),
            Err(ImageError::BufferTooSmall {
                required: 32,
                actual: 10
            })
        );
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            NearestNeighbour::new(0, 240, 640, 480, true),
            Err(ImageError::InvalidDimensions { width: 0, height: 240 })
        );
        assert_eq!(
            NearestNeighbour::new(320, 240, 640, -1, true),
            Err(ImageError::InvalidDimensions { width: 640, height: -1 })
        );
    }
}

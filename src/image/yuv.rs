//! YUV (BT.601, studio swing) to RGB conversion for camera frames.

use crate::image::color::{Rgb565, Rgb8};
use crate::image::{Image, ImageError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Yuv8 {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl Yuv8 {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

fn clip(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

pub fn yuv_to_rgb(yuv: &Yuv8) -> Rgb8 {
    let c = i32::from(yuv.y) - 16;
    let d = i32::from(yuv.u) - 128;
    let e = i32::from(yuv.v) - 128;

    Rgb8 {
        red: clip((298 * c + 409 * e + 128) >> 8),
        green: clip((298 * c - 100 * d - 208 * e + 128) >> 8),
        blue: clip((298 * c + 516 * d + 128) >> 8),
    }
}

/// Keep the top five bits of each component: `y` in bits 10-14, `u` in 5-9,
/// `v` in 0-4.
pub const fn pack_yuv555(y: u8, u: u8, v: u8) -> u16 {
    ((y as u16 >> 3) << 10) | ((u as u16 >> 3) << 5) | (v as u16 >> 3)
}

const LOOKUP_SIZE: usize = 1 << 15;

/// Precomputed YUV555 to RGB565 conversion, one entry per packed YUV555 code.
pub struct Yuv555Lookup {
    table: Box<[Rgb565]>,
}

impl Yuv555Lookup {
    pub fn new() -> Self {
        let mut table = vec![Rgb565::BLACK; LOOKUP_SIZE].into_boxed_slice();

        for v in 0..32u8 {
            for u in 0..32u8 {
                for y in 0..32u8 {
                    let yuv = Yuv8 {
                        y: (y << 3) | (y >> 2),
                        u: (u << 3) | (u >> 2),
                        v: (v << 3) | (v >> 2),
                    };
                    table[pack_yuv555(yuv.y, yuv.u, yuv.v) as usize] = yuv_to_rgb(&yuv).pack();
                }
            }
        }

        Yuv555Lookup { table }
    }

    pub fn lookup_yuv(&self, yuv: &Yuv8) -> Rgb565 {
        self.table[pack_yuv555(yuv.y, yuv.u, yuv.v) as usize]
    }

    /// Bit 15 of `yuv` is ignored.
    pub fn lookup_yuv555(&self, yuv: u16) -> Rgb565 {
        self.table[(yuv & 0x7FFF) as usize]
    }
}

impl Default for Yuv555Lookup {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Yuv555Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Yuv555Lookup")
            .field("entries", &self.table.len())
            .finish()
    }
}

/// Convert a packed YUYV (4:2:2) frame of `width` x `height` pixels into
/// `image`. Pixels that fall outside `image` are dropped.
pub fn yuyv_to_image(
    frame: &[u8],
    width: usize,
    height: usize,
    image: &mut Image,
) -> Result<(), ImageError> {
    let required = width * height * 2;
    if frame.len() < required {
        return Err(ImageError::BufferTooSmall {
            required,
            actual: frame.len(),
        });
    }

    let rows = height.min(image.height().max(0) as usize);
    let columns = width.min(image.width().max(0) as usize);

    for y in 0..rows {
        for x in 0..columns {
            let offset = 2 * (x + y * width);

            // each four byte group is Y0 U Y1 V
            let (u, v) = if offset % 4 != 0 {
                (frame[offset - 1], frame[offset + 1])
            } else {
                // a trailing odd pixel has no V of its own
                (frame[offset + 1], frame.get(offset + 3).copied().unwrap_or(128))
            };

            let rgb = yuv_to_rgb(&Yuv8::new(frame[offset], u, v));
            image.set_pixel(x as i16, y as i16, &rgb);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::WriteMode;

    #[test]
    fn converts_reference_levels() {
        assert_eq!(yuv_to_rgb(&Yuv8::new(16, 128, 128)), Rgb8::BLACK);
        assert_eq!(yuv_to_rgb(&Yuv8::new(235, 128, 128)), Rgb8::WHITE);
        // c = 65, e = 112: (19370 + 45808 + 128) >> 8 = 255
        assert_eq!(yuv_to_rgb(&Yuv8::new(81, 90, 240)).red, 255);
    }

    #[test]
    fn clips_out_of_range() {
        let rgb = yuv_to_rgb(&Yuv8::new(0, 0, 0));
        assert_eq!(rgb.red, 0);
        assert_eq!(rgb.blue, 0);
        // 298 * -16 + 100 * 128 + 208 * 128 + 128 = 34784, >> 8 = 135
        assert_eq!(rgb.green, 135);
    }

    #[test]
    fn packs_yuv555() {
        assert_eq!(pack_yuv555(255, 255, 255), 0x7FFF);
        assert_eq!(pack_yuv555(0x08, 0x10, 0x18), (1 << 10) | (2 << 5) | 3);
    }

    #[test]
    fn lookup_matches_direct_conversion_for_expanded_codes() {
        let lookup = Yuv555Lookup::new();
        let yuv = Yuv8::new(0xFF, 0x84, 0x7B);
        assert_eq!(lookup.lookup_yuv(&yuv), yuv_to_rgb(&yuv).pack());
        assert_eq!(
            lookup.lookup_yuv555(pack_yuv555(yuv.y, yuv.u, yuv.v)),
            lookup.lookup_yuv(&yuv)
        );
        assert_eq!(lookup.lookup_yuv555(0x8000), lookup.lookup_yuv555(0));
    }

    #[test]
    fn yuyv_frame_shares_chroma_between_pairs() {
        // Y0 U Y1 V, one pair of black then white luma with neutral chroma
        let frame = [16, 128, 235, 128];
        let mut image = Image::new(2, 1, WriteMode::Direct).unwrap();
        yuyv_to_image(&frame, 2, 1, &mut image).unwrap();

        assert_eq!(image.get_pixel(0, 0), Some(Rgb8::BLACK));
        assert_eq!(image.get_pixel(1, 0), Some(Rgb8::WHITE));
    }

    #[test]
    fn yuyv_rejects_short_frame() {
        let mut image = Image::new(2, 2, WriteMode::Direct).unwrap();
        assert_eq!(
            yuyv_to_image(&[0; 4], 2, 2, &mut image),
            Err(ImageError::BufferTooSmall {
                required: 8,
                actual: 4
            })
        );
    }
}

//! The RGB colour triangle used to check the panel.

use crate::image::color::Rgb8;
use crate::image::{Image, ImageError, WriteMode};

pub const TRIANGLE_SIZE: i16 = 128;

/// Colour of the triangle at `(x, y)` inside a 128x128 square: red at the
/// top-left, green at the top-right, blue at the bottom. `None` outside.
pub fn triangle_colour(x: i16, y: i16) -> Option<Rgb8> {
    let red = 127 - x - y / 2;
    let green = x - y / 2;
    let blue = 127 - red - green;

    if red < 0 || green < 0 {
        return None;
    }

    let scale = |c: i16| (i32::from(c) * 255 / 127).clamp(0, 255) as u8;
    Some(Rgb8::new(scale(red), scale(green), scale(blue)))
}

/// The triangle on a white background.
pub fn triangle_image(mode: WriteMode) -> Result<Image, ImageError> {
    let mut image = Image::new(TRIANGLE_SIZE, TRIANGLE_SIZE, mode)?;
    image.clear(&Rgb8::WHITE);

    for y in 0..TRIANGLE_SIZE {
        for x in 0..TRIANGLE_SIZE {
            if let Some(colour) = triangle_colour(x, y) {
                image.set_pixel(x, y, &colour);
            }
        }
    }
    Ok(image)
}

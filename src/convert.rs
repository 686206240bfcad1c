//! Decoded pictures to panel images.

use crate::image::color::{blend, Rgb8};
use crate::image::resize::NearestNeighbour;
use crate::image::{Image, ImageError, WriteMode};
use image::RgbaImage;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("{width}x{height} is too large to convert")]
    TooLarge { width: u32, height: u32 },
}

/// Decode any format the `image` crate understands. Transparent pixels are
/// composited over white.
pub fn load<P: AsRef<Path>>(path: P, mode: WriteMode) -> Result<Image, ConvertError> {
    let path = path.as_ref();
    let decoded = image::open(path)?.into_rgba8();
    info!(
        "Decoded {} ({}x{})",
        path.display(),
        decoded.width(),
        decoded.height()
    );
    from_rgba(&decoded, mode)
}

pub fn from_rgba(decoded: &RgbaImage, mode: WriteMode) -> Result<Image, ConvertError> {
    let (width, height) = decoded.dimensions();
    let (Ok(w), Ok(h)) = (i16::try_from(width), i16::try_from(height)) else {
        return Err(ConvertError::TooLarge { width, height });
    };

    let mut image = Image::new(w, h, mode)?;
    for (x, y, pixel) in decoded.enumerate_pixels() {
        let [red, green, blue, alpha] = pixel.0;
        let colour = blend(alpha, &Rgb8::new(red, green, blue), &Rgb8::WHITE);
        image.set_pixel(x as i16, y as i16, &colour);
    }
    Ok(image)
}

/// Shrink `image` to fit a `panel_width` x `panel_height` panel, keeping its
/// aspect ratio. Images that already fit are returned as they are.
pub fn fit(image: Image, panel_width: i16, panel_height: i16) -> Result<Image, ConvertError> {
    if image.width() <= panel_width && image.height() <= panel_height {
        return Ok(image);
    }

    let resize = NearestNeighbour::new(panel_width, panel_height, image.width(), image.height(), true)?;
    debug!(
        "Resizing {}x{} to {}x{}",
        image.width(),
        image.height(),
        resize.destination_width(),
        resize.destination_height()
    );
    Ok(resize.resize_image(&image)?)
}

/// Top-left corner that centres a `width` x `height` image on the panel.
pub fn centre(width: i16, height: i16, panel_width: i16, panel_height: i16) -> (i16, i16) {
    ((panel_width - width) / 2, (panel_height - height) / 2)
}

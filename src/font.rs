//! 8x16 bitmap text.
//!
//! Glyph data comes from outside the program, either a raw 4096 byte table
//! (256 glyphs, 16 rows each, most significant bit leftmost) or a PSF1
//! console font such as the ones shipped in `/usr/share/consolefonts`.

use crate::image::color::{Rgb565, Rgb8};
use crate::image::Image;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const GLYPH_WIDTH: i16 = 8;
pub const GLYPH_HEIGHT: i16 = 16;
pub const GLYPH_COUNT: usize = 256;

const GLYPH_BYTES: usize = GLYPH_HEIGHT as usize;
const TABLE_BYTES: usize = GLYPH_COUNT * GLYPH_BYTES;

const PSF1_MAGIC: [u8; 2] = [0x36, 0x04];
const PSF1_HEADER_BYTES: usize = 4;

#[derive(Debug, Error)]
pub enum FontError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("glyph table must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("not a PSF1 font")]
    BadMagic,
    #[error("PSF1 glyphs are {0} pixels high, expected 16")]
    UnsupportedGlyphHeight(u8),
}

/// Where the next character goes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FontPosition {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone)]
pub struct Font {
    glyphs: Box<[[u8; GLYPH_BYTES]; GLYPH_COUNT]>,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("glyphs", &GLYPH_COUNT).finish()
    }
}

impl Font {
    pub fn from_raw(data: &[u8]) -> Result<Font, FontError> {
        if data.len() != TABLE_BYTES {
            return Err(FontError::InvalidLength {
                expected: TABLE_BYTES,
                actual: data.len(),
            });
        }

        let mut glyphs = Box::new([[0u8; GLYPH_BYTES]; GLYPH_COUNT]);
        for (glyph, rows) in glyphs.iter_mut().zip(data.chunks_exact(GLYPH_BYTES)) {
            glyph.copy_from_slice(rows);
        }

        Ok(Font { glyphs })
    }

    /// Parse a PSF1 font. Fonts with 512 glyphs contribute their first 256.
    pub fn from_psf(data: &[u8]) -> Result<Font, FontError> {
        if data.len() < PSF1_HEADER_BYTES || data[..2] != PSF1_MAGIC {
            return Err(FontError::BadMagic);
        }

        let charsize = data[3];
        if charsize as usize != GLYPH_BYTES {
            return Err(FontError::UnsupportedGlyphHeight(charsize));
        }

        let body = &data[PSF1_HEADER_BYTES..];
        if body.len() < TABLE_BYTES {
            return Err(FontError::InvalidLength {
                expected: TABLE_BYTES,
                actual: body.len(),
            });
        }

        Self::from_raw(&body[..TABLE_BYTES])
    }

    /// Load a font file, PSF1 when it carries the magic and a raw table otherwise.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Font, FontError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let font = if data.starts_with(&PSF1_MAGIC) {
            Self::from_psf(&data)?
        } else {
            Self::from_raw(&data)?
        };
        info!("Loaded font {}", path.display());
        Ok(font)
    }

    pub fn glyph(&self, c: u8) -> &[u8; GLYPH_BYTES] {
        &self.glyphs[c as usize]
    }

    fn draw_glyph<F>(&self, x: i16, y: i16, c: u8, mut plot: F) -> FontPosition
    where
        F: FnMut(i16, i16),
    {
        for (row, bits) in self.glyph(c).iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (0x80 >> column) != 0 {
                    plot(x + column, y + row as i16);
                }
            }
        }

        FontPosition {
            x: x + GLYPH_WIDTH,
            y,
        }
    }

    /// Draw one glyph with its top-left corner at `(x, y)`. Unset bits leave
    /// the image alone.
    pub fn draw_char(&self, x: i16, y: i16, c: u8, colour: &Rgb8, image: &mut Image) -> FontPosition {
        self.draw_glyph(x, y, c, |px, py| {
            image.set_pixel(px, py, colour);
        })
    }

    pub fn draw_char_rgb565(
        &self,
        x: i16,
        y: i16,
        c: u8,
        colour: Rgb565,
        image: &mut Image,
    ) -> FontPosition {
        self.draw_glyph(x, y, c, |px, py| {
            image.set_pixel_rgb565(px, py, colour);
        })
    }

    /// Draw `text` byte by byte along one line. Nothing wraps.
    pub fn draw_string(&self, x: i16, y: i16, text: &str, colour: &Rgb8, image: &mut Image) -> FontPosition {
        text.bytes().fold(FontPosition { x, y }, |position, c| {
            self.draw_char(position.x, position.y, c, colour, image)
        })
    }

    pub fn draw_string_rgb565(
        &self,
        x: i16,
        y: i16,
        text: &str,
        colour: Rgb565,
        image: &mut Image,
    ) -> FontPosition {
        text.bytes().fold(FontPosition { x, y }, |position, c| {
            self.draw_char_rgb565(position.x, position.y, c, colour, image)
        })
    }
}

//! Scrolling CPU and memory usage graphs.
//!
//! Each trace owns an image one pixel column per sample. A column is a stack
//! of three coloured segments drawn upwards from the baseline, with the rest
//! of the column blank. Every 20th row and every column sampled on a whole
//! minute is tinted with the grid colour so the grid shows through the bars.

pub mod cpu;
pub mod memory;

use crate::font::{Font, FontPosition, GLYPH_HEIGHT};
use crate::image::color::{Rgb565, Rgb8};
use crate::image::{Image, ImageError, WriteMode};
use crate::lcd::interface::Interface;
use crate::lcd::{Lcd, LcdError};
use std::io;
use thiserror::Error;

pub use cpu::{CpuStats, CpuTrace};
pub use memory::{MemoryStats, MemoryTrace};

pub const GRID_COLOUR: Rgb8 = Rgb8::new(48, 48, 48);
pub const GRID_SPACING: i16 = 20;
/// How strongly the grid shows through a bar.
pub const GRID_ALPHA: u8 = 63;
/// Legend swatch: a small filled square in the usual console code page.
pub const SWATCH: u8 = 0xFE;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unable to parse {0}")]
    Parse(&'static str),
    #[error(transparent)]
    Image(#[from] ImageError),
}

/// How a colour is put into the trace image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Ink {
    /// Through the image's write mode, dithered if the image is.
    Rgb(Rgb8),
    /// Already packed, never dithered.
    Packed(Rgb565),
}

impl Ink {
    fn plot(self, image: &mut Image, x: i16, y: i16) {
        match self {
            Ink::Rgb(colour) => image.set_pixel(x, y, &colour),
            Ink::Packed(colour) => image.set_pixel_rgb565(x, y, colour),
        };
    }

    fn draw_string(self, font: &Font, position: FontPosition, text: &str, image: &mut Image) -> FontPosition {
        match self {
            Ink::Rgb(colour) => font.draw_string(position.x, position.y, text, &colour, image),
            Ink::Packed(colour) => font.draw_string_rgb565(position.x, position.y, text, colour, image),
        }
    }

    fn draw_char(self, font: &Font, position: FontPosition, c: u8, image: &mut Image) -> FontPosition {
        match self {
            Ink::Rgb(colour) => font.draw_char(position.x, position.y, c, &colour, image),
            Ink::Packed(colour) => font.draw_char_rgb565(position.x, position.y, c, colour, image),
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct Palette {
    foreground: Ink,
    background: Ink,
    grid: Ink,
}

#[derive(Debug, Copy, Clone)]
struct Series {
    label: &'static str,
    ink: Ink,
    grid_ink: Ink,
}

/// One sample: the three segment heights and the second within the minute
/// it was taken.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
struct Sample {
    values: [i16; 3],
    second: u8,
}

#[derive(Debug)]
struct StackedTrace {
    trace_height: i16,
    y_position: i16,
    image: Image,
    samples: Vec<Sample>,
    series: [Series; 3],
    palette: Palette,
}

impl StackedTrace {
    fn new(
        width: i16,
        trace_height: i16,
        y_position: i16,
        title: &str,
        series: [Series; 3],
        palette: Palette,
        font: Option<&Font>,
    ) -> Result<StackedTrace, TraceError> {
        let height = trace_height + GLYPH_HEIGHT + 4;
        let mut image = Image::new(width, height, WriteMode::Dithered)?;

        match palette.background {
            Ink::Rgb(colour) => image.clear(&colour),
            Ink::Packed(colour) => image.clear_rgb565(colour),
        }

        // "Title (a:# b:# c:#)" with a swatch of each series colour
        if let Some(font) = font {
            let foreground = palette.foreground;
            let mut position = FontPosition {
                x: 0,
                y: height - 2 - GLYPH_HEIGHT,
            };
            position = foreground.draw_string(font, position, title, &mut image);
            for (index, s) in series.iter().enumerate() {
                let separator = if index == 0 { " (" } else { " " };
                position = foreground.draw_string(font, position, separator, &mut image);
                position = foreground.draw_string(font, position, s.label, &mut image);
                position = foreground.draw_string(font, position, ":", &mut image);
                position = s.ink.draw_char(font, position, SWATCH, &mut image);
            }
            foreground.draw_string(font, position, ")", &mut image);
        }

        for j in (0..=trace_height).step_by(GRID_SPACING as usize) {
            for i in 0..width {
                palette.grid.plot(&mut image, i, j);
            }
        }

        Ok(StackedTrace {
            trace_height,
            y_position,
            image,
            samples: Vec::with_capacity(width as usize),
            series,
            palette,
        })
    }

    fn next_y(&self) -> i16 {
        self.y_position + self.image.height()
    }

    fn push(&mut self, now_secs: u64, values: [i16; 3]) {
        let capacity = self.image.width().max(0) as usize;
        if self.samples.len() == capacity {
            self.samples.remove(0);
        }
        self.samples.push(Sample {
            values,
            second: (now_secs % 60) as u8,
        });
        self.redraw();
    }

    fn redraw(&mut self) {
        for (i, sample) in self.samples.iter().enumerate() {
            let x = i as i16;
            let on_minute = sample.second == 0;
            let gridded = |j: i16| j % GRID_SPACING == 0 || on_minute;

            let mut j = self.trace_height;
            for (series, &value) in self.series.iter().zip(sample.values.iter()) {
                for _ in 0..value {
                    let ink = if gridded(j) { series.grid_ink } else { series.ink };
                    ink.plot(&mut self.image, x, j);
                    j -= 1;
                }
            }

            while j >= 0 {
                let ink = if gridded(j) {
                    self.palette.grid
                } else {
                    self.palette.background
                };
                ink.plot(&mut self.image, x, j);
                j -= 1;
            }
        }
    }

    fn render<I: Interface>(&self, lcd: &mut Lcd<I>) -> Result<bool, LcdError> {
        lcd.blit_image(0, self.y_position, &self.image)
    }
}

/// `part` of `total` scaled to `trace_height` rows, zero when `total` is.
fn scale(part: u64, total: u64, trace_height: i16) -> i16 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(part.min(total)) * trace_height.max(0) as u128 / u128::from(total);
    scaled as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_series() -> [Series; 3] {
        let a = Rgb565(0x1111);
        let b = Rgb565(0x2222);
        let c = Rgb565(0x3333);
        [
            Series {
                label: "a",
                ink: Ink::Packed(a),
                grid_ink: Ink::Packed(Rgb565(0xA000)),
            },
            Series {
                label: "b",
                ink: Ink::Packed(b),
                grid_ink: Ink::Packed(Rgb565(0xB000)),
            },
            Series {
                label: "c",
                ink: Ink::Packed(c),
                grid_ink: Ink::Packed(Rgb565(0xC000)),
            },
        ]
    }

    fn trace(width: i16) -> StackedTrace {
        StackedTrace::new(
            width,
            40,
            10,
            "T",
            test_series(),
            Palette {
                foreground: Ink::Packed(Rgb565(0xFFFF)),
                background: Ink::Packed(Rgb565::BLACK),
                grid: Ink::Packed(Rgb565(0x0841)),
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn reserves_legend_rows() {
        let trace = trace(8);
        assert_eq!(trace.image.height(), 40 + 16 + 4);
        assert_eq!(trace.next_y(), 10 + 60);
        assert_eq!(trace.image.get_pixel_rgb565(3, 20), Some(Rgb565(0x0841)));
        assert_eq!(trace.image.get_pixel_rgb565(3, 21), Some(Rgb565::BLACK));
    }

    #[test]
    fn stacks_segments_from_baseline() {
        let mut trace = trace(8);
        trace.push(1, [2, 1, 3]);

        let column: Vec<u16> = (34..=40)
            .rev()
            .map(|j| trace.image.get_pixel_rgb565(0, j).unwrap().0)
            .collect();
        // row 40 is a grid row
        assert_eq!(column, vec![0xA000, 0x1111, 0x2222, 0x3333, 0x3333, 0x3333, 0x0000]);
        assert_eq!(trace.image.get_pixel_rgb565(0, 0), Some(Rgb565(0x0841)));
    }

    #[test]
    fn minute_columns_are_gridded() {
        let mut trace = trace(8);
        trace.push(120, [1, 0, 0]);
        assert_eq!(trace.image.get_pixel_rgb565(0, 40), Some(Rgb565(0xA000)));
        assert_eq!(trace.image.get_pixel_rgb565(0, 33), Some(Rgb565(0x0841)));
    }

    #[test]
    fn scrolls_when_full() {
        let mut trace = trace(2);
        trace.push(1, [1, 0, 0]);
        trace.push(2, [0, 1, 0]);
        trace.push(3, [0, 0, 1]);

        assert_eq!(trace.samples.len(), 2);
        assert_eq!(trace.samples[0].values, [0, 1, 0]);
        assert_eq!(trace.image.get_pixel_rgb565(0, 40), Some(Rgb565(0xB000)));
        assert_eq!(trace.image.get_pixel_rgb565(1, 40), Some(Rgb565(0xC000)));
    }

    #[test]
    fn scales_against_total() {
        assert_eq!(scale(50, 100, 80), 40);
        assert_eq!(scale(1, 3, 80), 26);
        assert_eq!(scale(5, 0, 80), 0);
        assert_eq!(scale(200, 100, 80), 80);
    }

    #[test]
    fn scales_counters_near_the_top_of_the_range() {
        assert_eq!(scale(u64::MAX, u64::MAX, 80), 80);
        assert_eq!(scale(u64::MAX / 2, u64::MAX, 80), 39);
    }
}

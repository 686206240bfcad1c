//! Drive a 2.8" 320x240 SPI colour LCD from a Raspberry Pi.
//!
//! Pictures are held as big-endian RGB565 [`image::Image`]s, optionally
//! dithered, scaled with [`image::resize::NearestNeighbour`] and sent to the
//! panel through an [`lcd::Lcd`] session.

pub mod config;
pub mod convert;
pub mod font;
pub mod framebuffer;
pub mod image;
pub mod lcd;
pub mod shutdown;
pub mod status;
pub mod test_pattern;
pub mod trace;

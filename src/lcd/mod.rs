//! Display session for the 2.8" 320x240 controller.
//!
//! Everything drawn goes through a window: the four window registers bound
//! the area, the cursor registers are reset to the window's top-left corner,
//! [`register::GRAM_WRITE`] switches the bus to data, and the pixels follow
//! as one stream. These steps are strictly ordered and must not interleave.

pub mod gpio_pin;
pub mod interface;
pub mod register;

use crate::image::color::Rgb565;
use crate::image::{Image, ImageError, BYTES_PER_PIXEL};
use crate::lcd::interface::{Interface, BACKLIGHT_RANGE};
use crate::lcd::register::{InitStep, RegisterMap};
use std::io;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LcdError {
    #[error("SPI transfer failed: {0:?}")]
    Spi(embedded_hal::spi::ErrorKind),
    #[error("GPIO write failed: {0:?}")]
    Gpio(embedded_hal::digital::ErrorKind),
    #[error(transparent)]
    Spidev(#[from] linux_embedded_hal::SPIError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    GpioSetup(#[from] rppal::gpio::Error),
    #[error(transparent)]
    Pwm(#[from] rppal::pwm::Error),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("the display session has been closed")]
    Closed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Ready,
    Closed,
}

/// The visible part of a `width` x `height` source placed at `(x, y)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Clip {
    /// Panel position of the visible part.
    pub x: i16,
    pub y: i16,
    /// First visible source column and row.
    pub source_x: i16,
    pub source_y: i16,
    pub width: i16,
    pub height: i16,
}

impl Clip {
    /// `None` when nothing of the source lands on a `panel_width` x
    /// `panel_height` panel.
    pub fn new(x: i16, y: i16, width: i16, height: i16, panel_width: i16, panel_height: i16) -> Option<Clip> {
        let (x, source_x, width) = Self::axis(x, width, panel_width)?;
        let (y, source_y, height) = Self::axis(y, height, panel_height)?;
        Some(Clip {
            x,
            y,
            source_x,
            source_y,
            width,
            height,
        })
    }

    fn axis(position: i16, length: i16, panel: i16) -> Option<(i16, i16, i16)> {
        let position = i32::from(position);
        let length = i32::from(length);
        let panel = i32::from(panel);

        let mut start = 0;
        let mut end = length - 1;
        let mut origin = position;

        if origin < 0 {
            start = -origin;
            origin = 0;
        }

        if origin - start + length > panel {
            end = panel - 1 - (origin - start);
        }

        let visible = end - start + 1;
        if visible <= 0 {
            return None;
        }

        Some((origin as i16, start as i16, visible as i16))
    }

    fn fits(&self, width: i16, height: i16) -> bool {
        self.source_x == 0 && self.source_y == 0 && self.width == width && self.height == height
    }
}

#[derive(Debug)]
pub struct Lcd<I: Interface> {
    interface: I,
    registers: RegisterMap,
    width: i16,
    height: i16,
    rotated: bool,
    state: State,
}

impl<I: Interface> Lcd<I> {
    /// Reset and initialise the controller, clear the panel to black and turn
    /// the backlight fully on.
    pub fn open(interface: I, rotate: bool) -> Result<Lcd<I>, LcdError> {
        let (width, height) = register::panel_size(rotate);
        let mut lcd = Lcd {
            interface,
            registers: RegisterMap::for_rotation(rotate),
            width,
            height,
            rotated: rotate,
            state: State::Uninitialized,
        };

        info!("LCD init {}x{}...", width, height);
        lcd.interface.reset()?;
        for step in register::init_sequence(rotate) {
            match step {
                InitStep::Write(index, value) => lcd.interface.write_command(index, value)?,
                InitStep::DelayMs(ms) => lcd.interface.delay_ms(ms),
            }
        }
        lcd.state = State::Ready;

        lcd.clear(Rgb565::BLACK)?;
        lcd.set_backlight(0)?;
        info!("LCD ready");
        Ok(lcd)
    }

    pub fn width(&self) -> i16 {
        self.width
    }

    pub fn height(&self) -> i16 {
        self.height
    }

    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn interface(&self) -> &I {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut I {
        &mut self.interface
    }

    pub fn into_interface(self) -> I {
        self.interface
    }

    fn ensure_ready(&self) -> Result<(), LcdError> {
        match self.state {
            State::Ready => Ok(()),
            State::Uninitialized | State::Closed => Err(LcdError::Closed),
        }
    }

    /// Bound the next pixel stream to `(x0, y0)..=(x1, y1)` and put the
    /// cursor on the window's top-left corner.
    pub fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), LcdError> {
        self.ensure_ready()?;
        let registers = self.registers;
        self.interface.write_command(registers.x_start, x0)?;
        self.interface.write_command(registers.y_start, y0)?;
        self.interface.write_command(registers.x_end, x1)?;
        self.interface.write_command(registers.y_end, y1)?;
        self.interface.write_command(registers.x_position, 0)?;
        self.interface.write_command(registers.y_position, 0)?;
        Ok(())
    }

    pub fn select_write_mode(&mut self) -> Result<(), LcdError> {
        self.ensure_ready()?;
        self.interface.write_register(register::GRAM_WRITE)
    }

    fn window(&mut self, x: i16, y: i16, width: i16, height: i16) -> Result<(), LcdError> {
        self.set_window(
            x as u16,
            y as u16,
            (x + width - 1) as u16,
            (y + height - 1) as u16,
        )?;
        self.select_write_mode()
    }

    fn stream_solid(&mut self, width: i16, height: i16, colour: Rgb565) -> Result<(), LcdError> {
        let row: Vec<u8> = colour
            .to_be_bytes()
            .iter()
            .copied()
            .cycle()
            .take(width as usize * BYTES_PER_PIXEL)
            .collect();

        self.interface.begin_pixels()?;
        for _ in 0..height {
            self.interface.write_pixels(&row)?;
        }
        self.interface.end_pixels()
    }

    pub fn clear(&mut self, colour: Rgb565) -> Result<(), LcdError> {
        let (width, height) = (self.width, self.height);
        self.window(0, 0, width, height)?;
        self.stream_solid(width, height, colour)
    }

    /// Returns `Ok(false)` when the rectangle is empty or entirely off the panel.
    pub fn fill_rect(
        &mut self,
        mut x: i16,
        mut y: i16,
        mut width: i16,
        mut height: i16,
        colour: Rgb565,
    ) -> Result<bool, LcdError> {
        self.ensure_ready()?;

        if width < 1 || height < 1 || x >= self.width || y >= self.height {
            return Ok(false);
        }

        if x < 0 {
            width = width.saturating_add(x);
            x = 0;
        }
        if y < 0 {
            height = height.saturating_add(y);
            y = 0;
        }

        if i32::from(x) + i32::from(width) > i32::from(self.width) {
            width = self.width - x;
        }
        if i32::from(y) + i32::from(height) > i32::from(self.height) {
            height = self.height - y;
        }

        if width < 1 || height < 1 {
            return Ok(false);
        }

        debug!("fill {}x{} at ({}, {})", width, height, x, y);
        self.window(x, y, width, height)?;
        self.stream_solid(width, height, colour)?;
        Ok(true)
    }

    pub fn set_pixel(&mut self, x: i16, y: i16, colour: Rgb565) -> Result<bool, LcdError> {
        self.ensure_ready()?;

        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return Ok(false);
        }

        let (x, y) = (x as u16, y as u16);
        let registers = self.registers;
        self.interface.write_command(registers.x_start, x)?;
        self.interface.write_command(registers.y_start, y)?;
        self.interface.write_command(registers.x_end, x)?;
        self.interface.write_command(registers.y_end, y)?;
        self.interface.write_command(registers.x_position, x)?;
        self.interface.write_command(registers.y_position, y)?;
        self.interface.write_command(register::GRAM_WRITE, colour.0)?;
        Ok(true)
    }

    /// Draw `image` with its top-left corner at `(x, y)`, clipping whatever
    /// falls off the panel. Returns `Ok(false)` when none of it is visible.
    pub fn blit_image(&mut self, x: i16, y: i16, image: &Image) -> Result<bool, LcdError> {
        self.ensure_ready()?;

        let Some(clip) = Clip::new(x, y, image.width(), image.height(), self.width, self.height) else {
            return Ok(false);
        };

        self.window(clip.x, clip.y, clip.width, clip.height)?;
        self.interface.begin_pixels()?;

        if clip.fits(image.width(), image.height()) {
            self.interface.write_pixels(image.as_bytes())?;
        } else {
            debug!("partial blit {:?}", clip);
            let pitch = image.pitch();
            let row_bytes = clip.width as usize * BYTES_PER_PIXEL;
            for row in clip.source_y..clip.source_y + clip.height {
                let start = row as usize * pitch + clip.source_x as usize * BYTES_PER_PIXEL;
                self.interface
                    .write_pixels(&image.as_bytes()[start..start + row_bytes])?;
            }
        }

        self.interface.end_pixels()?;
        Ok(true)
    }

    /// Draw a caller-owned buffer of host-order RGB565 pixels, `pitch` bytes
    /// per row. The visible pixels are swapped to wire order in place, so
    /// `data` is modified.
    pub fn blit_raw(
        &mut self,
        x: i16,
        y: i16,
        width: i16,
        height: i16,
        pitch: usize,
        data: &mut [u8],
    ) -> Result<bool, LcdError> {
        self.ensure_ready()?;

        let Some(clip) = Clip::new(x, y, width, height, self.width, self.height) else {
            return Ok(false);
        };

        let row_bytes = clip.width as usize * BYTES_PER_PIXEL;
        let first = clip.source_x as usize * BYTES_PER_PIXEL;
        let last_row = (clip.source_y + clip.height - 1) as usize;
        let required = last_row * pitch + first + row_bytes;
        if data.len() < required {
            return Err(ImageError::BufferTooSmall {
                required,
                actual: data.len(),
            }
            .into());
        }

        self.window(clip.x, clip.y, clip.width, clip.height)?;
        self.interface.begin_pixels()?;

        for row in clip.source_y as usize..=last_row {
            let start = row * pitch + first;
            let pixels = &mut data[start..start + row_bytes];
            for pixel in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
                let value = u16::from_ne_bytes([pixel[0], pixel[1]]);
                pixel.copy_from_slice(&value.to_be_bytes());
            }
            self.interface.write_pixels(pixels)?;
        }

        self.interface.end_pixels()?;
        Ok(true)
    }

    /// Raw PWM level, `0` (brightest) to `1024` (off).
    pub fn set_backlight(&mut self, level: u16) -> Result<(), LcdError> {
        self.ensure_ready()?;
        self.interface.set_backlight(level.min(BACKLIGHT_RANGE))
    }

    /// Turn the display and backlight off and release the bus. Every later
    /// operation fails with [`LcdError::Closed`].
    pub fn close(&mut self) -> Result<(), LcdError> {
        self.ensure_ready()?;
        info!("LCD close");
        self.interface
            .write_command(register::DISPLAY_CONTROL, register::DISPLAY_OFF)?;
        self.interface.set_backlight(BACKLIGHT_RANGE)?;
        self.state = State::Closed;
        self.interface.release()
    }

    /// Run `f` on the session and close it afterwards, also when `f` fails.
    /// An error from `f` is reported in preference to one from closing.
    pub fn run_then_close<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<LcdError>,
    {
        let result = f(self);
        let closed = self.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

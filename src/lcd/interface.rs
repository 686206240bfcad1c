//! The register/data bus between the session and the controller.
//!
//! Every transfer is framed by chip select. The register select line is low
//! while a 16-bit register index is clocked out and high for register values
//! and pixel data. All words go out big-endian.

use crate::lcd::LcdError;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

/// spidev rejects writes larger than its buffer (4096 bytes by default).
pub const MAX_TRANSFER: usize = 4096;

/// Full scale of the backlight PWM. The backlight driver is active low, so
/// this level turns it off and `0` is full brightness.
pub const BACKLIGHT_RANGE: u16 = 1024;

pub trait Interface {
    /// Pulse the reset line and wait for the controller to come back.
    fn reset(&mut self) -> Result<(), LcdError>;

    /// Send a register index with no value.
    fn write_register(&mut self, index: u16) -> Result<(), LcdError>;

    fn write_command(&mut self, index: u16, value: u16) -> Result<(), LcdError>;

    /// Open a pixel stream: chip select stays asserted with register select
    /// high until [`Interface::end_pixels`].
    fn begin_pixels(&mut self) -> Result<(), LcdError>;

    /// Bytes already in wire order.
    fn write_pixels(&mut self, data: &[u8]) -> Result<(), LcdError>;

    fn end_pixels(&mut self) -> Result<(), LcdError>;

    /// Raw PWM level in `0..=BACKLIGHT_RANGE`.
    fn set_backlight(&mut self, level: u16) -> Result<(), LcdError>;

    fn delay_ms(&mut self, ms: u32);

    /// Leave the bus idle once the session is over.
    fn release(&mut self) -> Result<(), LcdError>;
}

pub trait Backlight {
    fn set_level(&mut self, level: u16) -> Result<(), LcdError>;
}

impl Backlight for rppal::pwm::Pwm {
    fn set_level(&mut self, level: u16) -> Result<(), LcdError> {
        let level = level.min(BACKLIGHT_RANGE);
        self.set_duty_cycle(f64::from(level) / f64::from(BACKLIGHT_RANGE))?;
        Ok(())
    }
}

/// A panel wired without backlight control.
impl<B: Backlight> Backlight for Option<B> {
    fn set_level(&mut self, level: u16) -> Result<(), LcdError> {
        match self {
            Some(backlight) => backlight.set_level(level),
            None => Ok(()),
        }
    }
}

fn spi_error<E: embedded_hal::spi::Error>(e: E) -> LcdError {
    LcdError::Spi(e.kind())
}

fn pin_error<E: embedded_hal::digital::Error>(e: E) -> LcdError {
    LcdError::Gpio(e.kind())
}

#[derive(Debug)]
pub struct SpiInterface<SPI, CS, RS, RST, BL, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RS: OutputPin,
    RST: OutputPin,
    BL: Backlight,
    D: DelayNs,
{
    spi: SPI,
    chip_select_pin: CS,
    register_select_pin: RS,
    reset_pin: RST,
    backlight: BL,
    delay: D,
}

impl<SPI, CS, RS, RST, BL, D> SpiInterface<SPI, CS, RS, RST, BL, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RS: OutputPin,
    RST: OutputPin,
    BL: Backlight,
    D: DelayNs,
{
    pub fn new(
        spi: SPI,
        chip_select_pin: CS,
        register_select_pin: RS,
        reset_pin: RST,
        backlight: BL,
        delay: D,
    ) -> Self {
        SpiInterface {
            spi,
            chip_select_pin,
            register_select_pin,
            reset_pin,
            backlight,
            delay,
        }
    }

    fn select(&mut self) -> Result<(), LcdError> {
        self.chip_select_pin.set_low().map_err(pin_error)
    }

    fn deselect(&mut self) -> Result<(), LcdError> {
        self.spi.flush().map_err(spi_error)?;
        self.chip_select_pin.set_high().map_err(pin_error)
    }

    fn write_word(&mut self, word: u16) -> Result<(), LcdError> {
        self.spi.write(&word.to_be_bytes()).map_err(spi_error)
    }
}

impl<SPI, CS, RS, RST, BL, D> Interface for SpiInterface<SPI, CS, RS, RST, BL, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RS: OutputPin,
    RST: OutputPin,
    BL: Backlight,
    D: DelayNs,
{
    fn reset(&mut self) -> Result<(), LcdError> {
        self.reset_pin.set_low().map_err(pin_error)?;
        self.delay.delay_ms(100);
        self.reset_pin.set_high().map_err(pin_error)?;
        self.delay.delay_ms(100);
        Ok(())
    }

    fn write_register(&mut self, index: u16) -> Result<(), LcdError> {
        self.select()?;
        self.register_select_pin.set_low().map_err(pin_error)?;
        self.write_word(index)?;
        self.deselect()
    }

    fn write_command(&mut self, index: u16, value: u16) -> Result<(), LcdError> {
        self.select()?;
        self.register_select_pin.set_low().map_err(pin_error)?;
        self.write_word(index)?;
        self.spi.flush().map_err(spi_error)?;
        self.register_select_pin.set_high().map_err(pin_error)?;
        self.write_word(value)?;
        self.deselect()
    }

    fn begin_pixels(&mut self) -> Result<(), LcdError> {
        self.select()?;
        self.register_select_pin.set_high().map_err(pin_error)
    }

    fn write_pixels(&mut self, data: &[u8]) -> Result<(), LcdError> {
        for chunk in data.chunks(MAX_TRANSFER) {
            self.spi.write(chunk).map_err(spi_error)?;
        }
        Ok(())
    }

    fn end_pixels(&mut self) -> Result<(), LcdError> {
        self.deselect()
    }

    fn set_backlight(&mut self, level: u16) -> Result<(), LcdError> {
        self.backlight.set_level(level)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn release(&mut self) -> Result<(), LcdError> {
        self.chip_select_pin.set_high().map_err(pin_error)?;
        self.register_select_pin.set_low().map_err(pin_error)
    }
}

impl<SPI, CS, RS, RST, BL, D> Drop for SpiInterface<SPI, CS, RS, RST, BL, D>
where
    SPI: SpiBus,
    CS: OutputPin,
    RS: OutputPin,
    RST: OutputPin,
    BL: Backlight,
    D: DelayNs,
{
    fn drop(&mut self) {
        // we're going to ignore errors here...
        let _ = self.chip_select_pin.set_high();
        let _ = self.register_select_pin.set_low();
    }
}

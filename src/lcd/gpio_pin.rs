use crate::config::PanelConfig;
use crate::lcd::interface::SpiInterface;
use crate::lcd::LcdError;
use linux_embedded_hal::spidev::{SpiModeFlags, SpidevOptions};
use linux_embedded_hal::{Delay, SpidevBus};
use rppal::gpio::{Gpio, OutputPin};
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::{debug, info};

/// BCM numbering. The header pins are the ones the panel plugs onto.
#[derive(Debug, Copy, Clone)]
#[repr(u8)]
pub enum GpioPin {
    /// Chip select (header pin 24, CE0), driven by hand so it can stay
    /// asserted across a whole pixel stream
    ChipSelectPin = 8,

    /// Register select: low while a register index is sent, high for values
    /// and pixel data (header pin 22)
    RegisterSelectPin = 25,

    /// Reset, active low (header pin 16)
    ResetPin = 23,

    /// Backlight, hardware PWM0 (header pin 12)
    BacklightPin = 18,
}

impl From<GpioPin> for u8 {
    fn from(pin: GpioPin) -> Self {
        pin as u8
    }
}

/// 19.2 MHz oscillator / 16 / 1024 steps.
pub const BACKLIGHT_FREQUENCY_HZ: f64 = 1_171.875;

pub type HardwareInterface = SpiInterface<SpidevBus, OutputPin, OutputPin, OutputPin, Option<Pwm>, Delay>;

/// Claim the SPI bus, the control pins and (optionally) the backlight PWM.
pub fn open(config: &PanelConfig) -> Result<HardwareInterface, LcdError> {
    info!("Opening {}", config.spi_device.display());
    let mut spi = SpidevBus::open(&config.spi_device)?;
    let options = SpidevOptions::new()
        .bits_per_word(8)
        .max_speed_hz(config.spi_speed_hz)
        .lsb_first(false)
        .mode(SpiModeFlags::SPI_MODE_3 | SpiModeFlags::SPI_NO_CS)
        .build();
    spi.configure(&options)?;

    let gpio = Gpio::new()?;
    let mut chip_select_pin = gpio.get(config.chip_select_pin)?.into_output();
    let mut register_select_pin = gpio.get(config.register_select_pin)?.into_output();
    let mut reset_pin = gpio.get(config.reset_pin)?.into_output();

    debug!("GPIO{} high (chip select)", config.chip_select_pin);
    chip_select_pin.set_high();
    debug!("GPIO{} low (register select)", config.register_select_pin);
    register_select_pin.set_low();
    debug!("GPIO{} high (reset)", config.reset_pin);
    reset_pin.set_high();

    let backlight = if config.backlight {
        debug!("PWM0 on GPIO{}", u8::from(GpioPin::BacklightPin));
        Some(Pwm::with_frequency(
            Channel::Pwm0,
            BACKLIGHT_FREQUENCY_HZ,
            0.0,
            Polarity::Normal,
            true,
        )?)
    } else {
        None
    };

    Ok(SpiInterface::new(
        spi,
        chip_select_pin,
        register_select_pin,
        reset_pin,
        backlight,
        Delay,
    ))
}

//! Two lines of system status drawn above the telemetry graphs: the first
//! IPv4 address with its interface, the GPU/ARM memory split, the clock and
//! the SoC temperature.

use crate::font::{Font, FontPosition, GLYPH_HEIGHT};
use crate::image::color::{Rgb565, Rgb8};
use crate::image::{Image, ImageError, WriteMode};
use crate::lcd::interface::Interface;
use crate::lcd::{Lcd, LcdError};
use chrono::Local;
use std::ffi::CStr;
use std::net::Ipv4Addr;
use std::process::Command;
use std::{fs, ptr};
use tracing::debug;

pub const HEADING_COLOUR: Rgb8 = Rgb8::new(255, 255, 0);
pub const VALUE_COLOUR: Rgb8 = Rgb8::WHITE;
/// Degree sign in the PC code page fonts.
pub const DEGREE: u8 = 0xF8;
pub const LINE_HEIGHT: i16 = GLYPH_HEIGHT + 4;

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";
const NO_ADDRESS: &str = "   .   .   .   ";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemorySplit {
    pub gpu_mb: u32,
    pub arm_mb: u32,
}

impl MemorySplit {
    /// Parse `vcgencmd get_mem` replies such as `arm=948M` and `gpu=76M`.
    pub fn parse(arm: &str, gpu: &str) -> Option<MemorySplit> {
        fn megabytes(reply: &str, key: &str) -> Option<u32> {
            reply
                .trim()
                .strip_prefix(key)?
                .strip_prefix('=')?
                .strip_suffix('M')?
                .parse()
                .ok()
        }

        Some(MemorySplit {
            gpu_mb: megabytes(gpu, "gpu")?,
            arm_mb: megabytes(arm, "arm")?,
        })
    }

    pub fn read() -> Option<MemorySplit> {
        let get_mem = |which: &str| -> Option<String> {
            let output = Command::new("vcgencmd").args(["get_mem", which]).output();
            match output {
                Ok(output) if output.status.success() => {
                    Some(String::from_utf8_lossy(&output.stdout).into_owned())
                }
                Ok(output) => {
                    debug!("vcgencmd get_mem {} failed: {}", which, output.status);
                    None
                }
                Err(e) => {
                    debug!("vcgencmd unavailable: {}", e);
                    None
                }
            }
        };
        MemorySplit::parse(&get_mem("arm")?, &get_mem("gpu")?)
    }
}

/// Degrees Celsius from a thermal zone reading in millidegrees.
pub fn parse_temperature(millidegrees: &str) -> Option<f64> {
    let value: i64 = millidegrees.trim().parse().ok()?;
    Some(value as f64 / 1000.0)
}

pub fn read_temperature() -> Option<f64> {
    match fs::read_to_string(THERMAL_ZONE) {
        Ok(contents) => parse_temperature(&contents),
        Err(e) => {
            debug!("{}: {}", THERMAL_ZONE, e);
            None
        }
    }
}

/// Name and address of the first IPv4 interface that is not loopback.
pub fn first_ipv4() -> Option<(String, Ipv4Addr)> {
    let mut addresses: *mut libc::ifaddrs = ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut addresses) } != 0 {
        debug!("getifaddrs: {}", std::io::Error::last_os_error());
        return None;
    }

    let mut found = None;
    let mut cursor = addresses;
    while !cursor.is_null() {
        let entry = unsafe { &*cursor };
        cursor = entry.ifa_next;

        if entry.ifa_addr.is_null()
            || i32::from(unsafe { (*entry.ifa_addr).sa_family }) != libc::AF_INET
        {
            continue;
        }
        let name = unsafe { CStr::from_ptr(entry.ifa_name) }.to_string_lossy();
        if name == "lo" {
            continue;
        }
        let address = unsafe { &*(entry.ifa_addr as *const libc::sockaddr_in) };
        found = Some((
            name.into_owned(),
            Ipv4Addr::from(u32::from_be(address.sin_addr.s_addr)),
        ));
        break;
    }

    unsafe { libc::freeifaddrs(addresses) };
    found
}

/// One run of text on a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Heading(String),
    Value(String),
    /// A single glyph outside ASCII, such as [`DEGREE`].
    Glyph(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    /// First letter of the interface name, `X` without one.
    pub interface: char,
    pub address: Option<Ipv4Addr>,
    pub memory_split: Option<MemorySplit>,
    /// Local time as `HH:MM:SS`.
    pub time: String,
    pub temperature: Option<f64>,
}

impl Status {
    pub fn read() -> Status {
        let (interface, address) = match first_ipv4() {
            Some((name, address)) => (name.chars().next().unwrap_or('X'), Some(address)),
            None => ('X', None),
        };
        Status {
            interface,
            address,
            memory_split: MemorySplit::read(),
            time: Local::now().format("%T").to_string(),
            temperature: read_temperature(),
        }
    }

    pub fn lines(&self) -> [Vec<Span>; 2] {
        let address = self
            .address
            .map_or_else(|| NO_ADDRESS.to_string(), |address| address.to_string());
        let memory = self.memory_split.map_or_else(
            || " / ".to_string(),
            |split| format!("{}/{}", split.gpu_mb, split.arm_mb),
        );
        let temperature = match self.temperature {
            Some(celsius) => format!("{celsius:2.0}"),
            None => "--".to_string(),
        };

        [
            vec![
                Span::Heading("ip(".to_string()),
                Span::Value(self.interface.to_string()),
                Span::Heading(") ".to_string()),
                Span::Value(address),
                Span::Heading(" memory ".to_string()),
                Span::Value(memory),
                Span::Value(" MB".to_string()),
            ],
            vec![
                Span::Heading("time ".to_string()),
                Span::Value(self.time.clone()),
                Span::Heading(" temperature ".to_string()),
                Span::Value(temperature),
                Span::Glyph(DEGREE),
                Span::Value("C".to_string()),
            ],
        ]
    }
}

/// The status lines rendered into an image the width of the panel.
#[derive(Debug)]
pub struct StatusText {
    image: Image,
    y_position: i16,
}

impl StatusText {
    pub fn new(width: i16, y_position: i16) -> Result<StatusText, ImageError> {
        Ok(StatusText {
            image: Image::new(width, 2 * LINE_HEIGHT, WriteMode::Direct)?,
            y_position,
        })
    }

    pub fn next_y(&self) -> i16 {
        self.y_position + self.image.height()
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn draw(&mut self, font: &Font, status: &Status) {
        let heading = HEADING_COLOUR.pack();
        let value = VALUE_COLOUR.pack();

        self.image.clear_rgb565(Rgb565::BLACK);
        for (line, spans) in status.lines().iter().enumerate() {
            let start = FontPosition {
                x: 0,
                y: line as i16 * LINE_HEIGHT,
            };
            spans.iter().fold(start, |position, span| match span {
                Span::Heading(text) => {
                    font.draw_string_rgb565(position.x, position.y, text, heading, &mut self.image)
                }
                Span::Value(text) => {
                    font.draw_string_rgb565(position.x, position.y, text, value, &mut self.image)
                }
                Span::Glyph(c) => {
                    font.draw_char_rgb565(position.x, position.y, *c, value, &mut self.image)
                }
            });
        }
    }

    pub fn render<I: Interface>(&self, lcd: &mut Lcd<I>) -> Result<bool, LcdError> {
        lcd.blit_image(0, self.y_position, &self.image)
    }
}

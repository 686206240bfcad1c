//! Controller register addresses and the power-on sequence.

/// Start of oscillation.
pub const OSCILLATION: u16 = 0x0000;
/// Driver output control (source scan direction).
pub const DRIVER_OUTPUT: u16 = 0x0001;
/// Entry mode (address update direction, colour order).
pub const ENTRY_MODE: u16 = 0x0003;
/// Display control 1: gate output and display on/off.
pub const DISPLAY_CONTROL: u16 = 0x0007;

pub const HORIZONTAL_ADDRESS: u16 = 0x0200;
pub const VERTICAL_ADDRESS: u16 = 0x0201;
/// Writing this index switches the bus to pixel data.
pub const GRAM_WRITE: u16 = 0x0202;

pub const HORIZONTAL_START: u16 = 0x0210;
pub const HORIZONTAL_END: u16 = 0x0211;
pub const VERTICAL_START: u16 = 0x0212;
pub const VERTICAL_END: u16 = 0x0213;

pub const DISPLAY_OFF: u16 = 0x0000;

/// Panel size with the long edge vertical.
pub const NATIVE_WIDTH: i16 = 240;
pub const NATIVE_HEIGHT: i16 = 320;

/// The six registers that address a window and its write cursor, in the
/// panel's logical (possibly rotated) orientation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterMap {
    pub x_start: u16,
    pub y_start: u16,
    pub x_end: u16,
    pub y_end: u16,
    pub x_position: u16,
    pub y_position: u16,
}

impl RegisterMap {
    /// Landscape, 320x240. The controller's horizontal and vertical axes
    /// are swapped.
    pub const ROTATED: RegisterMap = RegisterMap {
        x_start: VERTICAL_START,
        y_start: HORIZONTAL_START,
        x_end: VERTICAL_END,
        y_end: HORIZONTAL_END,
        x_position: VERTICAL_ADDRESS,
        y_position: HORIZONTAL_ADDRESS,
    };

    /// Portrait, 240x320.
    pub const UPRIGHT: RegisterMap = RegisterMap {
        x_start: HORIZONTAL_START,
        y_start: VERTICAL_START,
        x_end: HORIZONTAL_END,
        y_end: VERTICAL_END,
        x_position: HORIZONTAL_ADDRESS,
        y_position: VERTICAL_ADDRESS,
    };

    pub fn for_rotation(rotate: bool) -> RegisterMap {
        if rotate {
            Self::ROTATED
        } else {
            Self::UPRIGHT
        }
    }
}

/// Logical `(width, height)` for the chosen orientation.
pub fn panel_size(rotate: bool) -> (i16, i16) {
    if rotate {
        (NATIVE_HEIGHT, NATIVE_WIDTH)
    } else {
        (NATIVE_WIDTH, NATIVE_HEIGHT)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InitStep {
    Write(u16, u16),
    DelayMs(u32),
}

use InitStep::{DelayMs, Write};

const POWER_ON: [InitStep; 12] = [
    Write(OSCILLATION, 0x0001),
    DelayMs(1),
    Write(0x0100, 0x0000),
    Write(0x0101, 0x0000),
    Write(0x0102, 0x3110),
    Write(0x0103, 0xE200),
    Write(0x0110, 0x009D),
    Write(0x0111, 0x0022),
    Write(0x0100, 0x0120),
    DelayMs(2),
    Write(0x0100, 0x3120),
    DelayMs(8),
];

const PANEL_SETUP: [InitStep; 42] = [
    Write(0x0006, 0x0000),
    Write(DISPLAY_CONTROL, 0x0101),
    Write(0x0008, 0x0808),
    Write(0x0009, 0x0000),
    Write(0x000b, 0x0000),
    Write(0x000c, 0x0000),
    Write(0x000d, 0x0018),
    Write(0x0012, 0x0000),
    Write(0x0013, 0x0000),
    Write(0x0018, 0x0000),
    Write(0x0019, 0x0000),
    Write(0x0203, 0x0000),
    Write(0x0204, 0x0000),
    // full-panel window
    Write(HORIZONTAL_START, 0x0000),
    Write(HORIZONTAL_END, 0x00EF),
    Write(VERTICAL_START, 0x0000),
    Write(VERTICAL_END, 0x013F),
    Write(0x0214, 0x0000),
    Write(0x0215, 0x0000),
    Write(0x0216, 0x0000),
    Write(0x0217, 0x0000),
    // gamma
    Write(0x0300, 0x5343),
    Write(0x0301, 0x1021),
    Write(0x0302, 0x0003),
    Write(0x0303, 0x0011),
    Write(0x0304, 0x050A),
    Write(0x0305, 0x4342),
    Write(0x0306, 0x1100),
    Write(0x0307, 0x0003),
    Write(0x0308, 0x1201),
    Write(0x0309, 0x050A),
    Write(0x0400, 0x4027),
    Write(0x0401, 0x0000),
    Write(0x0402, 0x0000),
    Write(0x0403, 0x013F),
    Write(0x0404, 0x0000),
    Write(HORIZONTAL_ADDRESS, 0x0000),
    Write(VERTICAL_ADDRESS, 0x0000),
    Write(0x0100, 0x7120),
    Write(DISPLAY_CONTROL, 0x0103),
    DelayMs(1),
    Write(DISPLAY_CONTROL, 0x0113),
];

/// Register writes and pauses that follow the hardware reset, in order.
pub fn init_sequence(rotate: bool) -> Vec<InitStep> {
    let (driver_output, entry_mode) = if rotate {
        (0x0000, 0x12B8)
    } else {
        (0x0100, 0x12B0)
    };

    let mut steps = Vec::with_capacity(POWER_ON.len() + 3 + PANEL_SETUP.len());
    steps.extend_from_slice(&POWER_ON);
    steps.push(Write(DRIVER_OUTPUT, driver_output));
    steps.push(Write(0x0002, 0x0000));
    steps.push(Write(ENTRY_MODE, entry_mode));
    steps.extend_from_slice(&PANEL_SETUP);
    steps
}

//! An [`Interface`] that records what the session sends instead of driving
//! hardware.

#![allow(dead_code)]

use mztx::lcd::interface::Interface;
use mztx::lcd::LcdError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Reset,
    Register(u16),
    Command(u16, u16),
    BeginPixels,
    Pixels(Vec<u8>),
    EndPixels,
    Backlight(u16),
    Delay(u32),
    Release,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub ops: Vec<Op>,
}

impl Recorder {
    pub fn take(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    pub fn commands(&self) -> Vec<(u16, u16)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Command(index, value) => Some((*index, *value)),
                _ => None,
            })
            .collect()
    }

    /// Every pixel byte sent, concatenated.
    pub fn pixel_bytes(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Pixels(data) => Some(data.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }
}

impl Interface for Recorder {
    fn reset(&mut self) -> Result<(), LcdError> {
        self.ops.push(Op::Reset);
        Ok(())
    }

    fn write_register(&mut self, index: u16) -> Result<(), LcdError> {
        self.ops.push(Op::Register(index));
        Ok(())
    }

    fn write_command(&mut self, index: u16, value: u16) -> Result<(), LcdError> {
        self.ops.push(Op::Command(index, value));
        Ok(())
    }

    fn begin_pixels(&mut self) -> Result<(), LcdError> {
        self.ops.push(Op::BeginPixels);
        Ok(())
    }

    fn write_pixels(&mut self, data: &[u8]) -> Result<(), LcdError> {
        self.ops.push(Op::Pixels(data.to_vec()));
        Ok(())
    }

    fn end_pixels(&mut self) -> Result<(), LcdError> {
        self.ops.push(Op::EndPixels);
        Ok(())
    }

    fn set_backlight(&mut self, level: u16) -> Result<(), LcdError> {
        self.ops.push(Op::Backlight(level));
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.ops.push(Op::Delay(ms));
    }

    fn release(&mut self) -> Result<(), LcdError> {
        self.ops.push(Op::Release);
        Ok(())
    }
}

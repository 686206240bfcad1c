use crate::font::Font;
use crate::image::color::{blend_rgb565, Rgb565, Rgb8};
use crate::lcd::interface::Interface;
use crate::lcd::{Lcd, LcdError};
use crate::trace::{scale, Ink, Palette, Series, StackedTrace, TraceError, GRID_ALPHA, GRID_COLOUR};
use std::fs;

pub const USED_COLOUR: Rgb8 = Rgb8::new(0, 109, 44);
pub const BUFFERS_COLOUR: Rgb8 = Rgb8::new(102, 194, 164);
pub const CACHED_COLOUR: Rgb8 = Rgb8::new(237, 248, 251);

/// Kilobyte figures from `/proc/meminfo`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
    pub buffers: u64,
    pub cached: u64,
}

impl MemoryStats {
    pub fn read() -> Result<MemoryStats, TraceError> {
        Self::parse(&fs::read_to_string("/proc/meminfo")?)
    }

    pub fn parse(meminfo: &str) -> Result<MemoryStats, TraceError> {
        let mut stats = MemoryStats::default();

        for line in meminfo.lines() {
            let Some((name, rest)) = line.split_once(':') else {
                continue;
            };
            let field = match name {
                "MemTotal" => &mut stats.total,
                "MemFree" => &mut stats.free,
                "Buffers" => &mut stats.buffers,
                "Cached" => &mut stats.cached,
                _ => continue,
            };
            let value = rest.split_whitespace().next().unwrap_or_default();
            *field = value.parse().map_err(|_| TraceError::Parse("/proc/meminfo"))?;
        }

        if stats.total == 0 {
            return Err(TraceError::Parse("/proc/meminfo"));
        }
        Ok(stats)
    }

    /// Memory held by processes: what is neither free nor page cache.
    pub fn used(&self) -> u64 {
        self.total
            .saturating_sub(self.free)
            .saturating_sub(self.buffers)
            .saturating_sub(self.cached)
    }
}

/// Used, buffer and cache memory as a share of the total.
#[derive(Debug)]
pub struct MemoryTrace {
    trace: StackedTrace,
}

impl MemoryTrace {
    pub fn new(
        width: i16,
        trace_height: i16,
        y_position: i16,
        font: Option<&Font>,
    ) -> Result<MemoryTrace, TraceError> {
        let grid = GRID_COLOUR.pack();
        let series = |label, colour: Rgb8| {
            let colour = colour.pack();
            Series {
                label,
                ink: Ink::Packed(colour),
                grid_ink: Ink::Packed(blend_rgb565(GRID_ALPHA, grid, colour)),
            }
        };

        let trace = StackedTrace::new(
            width,
            trace_height,
            y_position,
            "Memory",
            [
                series("used", USED_COLOUR),
                series("buffers", BUFFERS_COLOUR),
                series("cached", CACHED_COLOUR),
            ],
            Palette {
                foreground: Ink::Packed(Rgb8::WHITE.pack()),
                background: Ink::Packed(Rgb565::BLACK),
                grid: Ink::Packed(grid),
            },
            font,
        )?;

        Ok(MemoryTrace { trace })
    }

    pub fn next_y(&self) -> i16 {
        self.trace.next_y()
    }

    pub fn update(&mut self, now_secs: u64, stats: MemoryStats) {
        let height = self.trace.trace_height;
        self.trace.push(
            now_secs,
            [
                scale(stats.used(), stats.total, height),
                scale(stats.buffers, stats.total, height),
                scale(stats.cached, stats.total, height),
            ],
        );
    }

    pub fn render<I: Interface>(&self, lcd: &mut Lcd<I>) -> Result<bool, LcdError> {
        self.trace.render(lcd)
    }
}

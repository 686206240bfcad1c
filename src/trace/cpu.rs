use crate::font::Font;
use crate::image::color::{blend, Rgb8};
use crate::lcd::interface::Interface;
use crate::lcd::{Lcd, LcdError};
use crate::trace::{scale, Ink, Palette, Series, StackedTrace, TraceError, GRID_ALPHA, GRID_COLOUR};
use std::fs;
use std::ops::Sub;

pub const USER_COLOUR: Rgb8 = Rgb8::new(4, 90, 141);
pub const NICE_COLOUR: Rgb8 = Rgb8::new(116, 169, 207);
pub const SYSTEM_COLOUR: Rgb8 = Rgb8::new(241, 238, 246);

/// Cumulative jiffies from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CpuStats {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuStats {
    pub fn read() -> Result<CpuStats, TraceError> {
        Self::parse(&fs::read_to_string("/proc/stat")?)
    }

    /// Parse the first line of `/proc/stat`. Counters missing on older
    /// kernels are zero.
    pub fn parse(stat: &str) -> Result<CpuStats, TraceError> {
        let line = stat.lines().next().ok_or(TraceError::Parse("/proc/stat"))?;
        let mut fields = line.split_whitespace();
        if fields.next() != Some("cpu") {
            return Err(TraceError::Parse("/proc/stat"));
        }

        let mut counters = [0u64; 10];
        for (counter, field) in counters.iter_mut().zip(fields) {
            *counter = field.parse().map_err(|_| TraceError::Parse("/proc/stat"))?;
        }

        let [user, nice, system, idle, iowait, irq, softirq, steal, guest, guest_nice] = counters;
        Ok(CpuStats {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
            steal,
            guest,
            guest_nice,
        })
    }

    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .iter()
        .fold(0, |total, counter| total.saturating_add(*counter))
    }
}

impl Sub for CpuStats {
    type Output = CpuStats;

    // Counters that went backwards (iowait can) count as zero.
    fn sub(self, previous: CpuStats) -> CpuStats {
        CpuStats {
            user: self.user.saturating_sub(previous.user),
            nice: self.nice.saturating_sub(previous.nice),
            system: self.system.saturating_sub(previous.system),
            idle: self.idle.saturating_sub(previous.idle),
            iowait: self.iowait.saturating_sub(previous.iowait),
            irq: self.irq.saturating_sub(previous.irq),
            softirq: self.softirq.saturating_sub(previous.softirq),
            steal: self.steal.saturating_sub(previous.steal),
            guest: self.guest.saturating_sub(previous.guest),
            guest_nice: self.guest_nice.saturating_sub(previous.guest_nice),
        }
    }
}

/// User, nice and system time as a share of all CPU time since the
/// previous sample.
#[derive(Debug)]
pub struct CpuTrace {
    trace: StackedTrace,
    previous: CpuStats,
}

impl CpuTrace {
    /// `initial` is the baseline the first update is measured against.
    pub fn new(
        width: i16,
        trace_height: i16,
        y_position: i16,
        font: Option<&Font>,
        initial: CpuStats,
    ) -> Result<CpuTrace, TraceError> {
        let series = |label, colour: Rgb8| Series {
            label,
            ink: Ink::Rgb(colour),
            grid_ink: Ink::Rgb(blend(GRID_ALPHA, &GRID_COLOUR, &colour)),
        };

        let trace = StackedTrace::new(
            width,
            trace_height,
            y_position,
            "CPU",
            [
                series("user", USER_COLOUR),
                series("nice", NICE_COLOUR),
                series("system", SYSTEM_COLOUR),
            ],
            Palette {
                foreground: Ink::Rgb(Rgb8::WHITE),
                background: Ink::Rgb(Rgb8::BLACK),
                grid: Ink::Rgb(GRID_COLOUR),
            },
            font,
        )?;

        Ok(CpuTrace {
            trace,
            previous: initial,
        })
    }

    /// First row below the trace.
    pub fn next_y(&self) -> i16 {
        self.trace.next_y()
    }

    pub fn update(&mut self, now_secs: u64, stats: CpuStats) {
        let diff = stats - self.previous;
        self.previous = stats;

        let total = diff.total();
        let height = self.trace.trace_height;
        self.trace.push(
            now_secs,
            [
                scale(diff.user, total, height),
                scale(diff.nice, total, height),
                scale(diff.system, total, height),
            ],
        );
    }

    pub fn render<I: Interface>(&self, lcd: &mut Lcd<I>) -> Result<bool, LcdError> {
        self.trace.render(lcd)
    }
}

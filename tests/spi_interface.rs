//! Bus framing of [`SpiInterface`] against mocked SPI and GPIO.
//!
//! Dropping the interface deselects the panel (CS high, RS low), so every
//! pin mock ends with those two transitions.

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{
    Mock as PinMock, State as PinState, Transaction as PinTransaction,
};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
use mztx::lcd::interface::{Backlight, Interface, SpiInterface, MAX_TRANSFER};
use mztx::lcd::LcdError;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
struct Levels(Rc<RefCell<Vec<u16>>>);

impl Backlight for Levels {
    fn set_level(&mut self, level: u16) -> Result<(), LcdError> {
        self.0.borrow_mut().push(level);
        Ok(())
    }
}

fn set(state: PinState) -> PinTransaction {
    PinTransaction::set(state)
}

struct Bus {
    spi: SpiMock<u8>,
    cs: PinMock,
    rs: PinMock,
    rst: PinMock,
    levels: Levels,
}

impl Bus {
    fn new(
        spi: &[SpiTransaction<u8>],
        cs: &[PinTransaction],
        rs: &[PinTransaction],
        rst: &[PinTransaction],
    ) -> Bus {
        let with_release = |pin: &[PinTransaction], state| {
            let mut expected = pin.to_vec();
            expected.push(set(state));
            PinMock::new(&expected)
        };

        Bus {
            spi: SpiMock::new(spi),
            cs: with_release(cs, PinState::High),
            rs: with_release(rs, PinState::Low),
            rst: PinMock::new(rst),
            levels: Levels::default(),
        }
    }

    fn interface(&self) -> SpiInterface<SpiMock<u8>, PinMock, PinMock, PinMock, Levels, NoopDelay> {
        SpiInterface::new(
            self.spi.clone(),
            self.cs.clone(),
            self.rs.clone(),
            self.rst.clone(),
            self.levels.clone(),
            NoopDelay,
        )
    }

    fn done(mut self) {
        self.spi.done();
        self.cs.done();
        self.rs.done();
        self.rst.done();
    }
}

#[test]
fn register_index_is_sent_with_register_select_low() {
    let bus = Bus::new(
        &[
            SpiTransaction::write_vec(vec![0x02, 0x02]),
            SpiTransaction::flush(),
        ],
        &[set(PinState::Low), set(PinState::High)],
        &[set(PinState::Low)],
        &[],
    );

    let mut interface = bus.interface();
    interface.write_register(0x0202).unwrap();
    drop(interface);
    bus.done();
}

#[test]
fn command_switches_register_select_between_index_and_value() {
    let bus = Bus::new(
        &[
            SpiTransaction::write_vec(vec![0x00, 0x07]),
            SpiTransaction::flush(),
            SpiTransaction::write_vec(vec![0x01, 0x13]),
            SpiTransaction::flush(),
        ],
        &[set(PinState::Low), set(PinState::High)],
        &[set(PinState::Low), set(PinState::High)],
        &[],
    );

    let mut interface = bus.interface();
    interface.write_command(0x0007, 0x0113).unwrap();
    drop(interface);
    bus.done();
}

#[test]
fn pixel_stream_keeps_the_panel_selected_and_splits_large_writes() {
    let data: Vec<u8> = (0..MAX_TRANSFER + 100).map(|i| i as u8).collect();

    let bus = Bus::new(
        &[
            SpiTransaction::write_vec(data[..MAX_TRANSFER].to_vec()),
            SpiTransaction::write_vec(data[MAX_TRANSFER..].to_vec()),
            SpiTransaction::write_vec(vec![0xAA, 0x55]),
            SpiTransaction::flush(),
        ],
        &[set(PinState::Low), set(PinState::High)],
        &[set(PinState::High)],
        &[],
    );

    let mut interface = bus.interface();
    interface.begin_pixels().unwrap();
    interface.write_pixels(&data).unwrap();
    interface.write_pixels(&[0xAA, 0x55]).unwrap();
    interface.end_pixels().unwrap();
    drop(interface);
    bus.done();
}

#[test]
fn reset_pulses_the_reset_line() {
    let bus = Bus::new(
        &[],
        &[],
        &[],
        &[set(PinState::Low), set(PinState::High)],
    );

    let mut interface = bus.interface();
    interface.reset().unwrap();
    drop(interface);
    bus.done();
}

#[test]
fn backlight_levels_reach_the_driver() {
    let bus = Bus::new(&[], &[], &[], &[]);
    let levels = bus.levels.clone();

    let mut interface = bus.interface();
    interface.set_backlight(0).unwrap();
    interface.set_backlight(1024).unwrap();
    drop(interface);
    bus.done();

    assert_eq!(*levels.0.borrow(), vec![0, 1024]);
}

#[test]
fn release_leaves_the_bus_idle() {
    let bus = Bus::new(
        &[],
        &[set(PinState::High)],
        &[set(PinState::Low)],
        &[],
    );

    let mut interface = bus.interface();
    interface.release().unwrap();
    drop(interface);
    bus.done();
}

#[test]
fn missing_backlight_is_ignored() {
    let mut backlight: Option<Levels> = None;
    backlight.set_level(512).unwrap();

    let levels = Levels::default();
    let mut backlight = Some(levels.clone());
    backlight.set_level(512).unwrap();
    assert_eq!(*levels.0.borrow(), vec![512]);
}

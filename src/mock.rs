//! Test doubles: a recording [`Bus`], a controller model that replays what was sent, and
//! fake `embedded-hal` SPI/pin/delay implementations sharing one wire log.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use crate::constants::Instruction;
use crate::interface::Bus;
use crate::{DrawWindow, Error, TransportFault};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Command(u8),
    Data8(u8),
    Data16(u16),
    Data(Vec<u8>),
}

/// Records every transaction; optionally starts failing after `fail_after` of them
#[derive(Default)]
pub struct RecordingBus {
    pub ops: Vec<Op>,
    fail_after: Option<usize>,
}

impl RecordingBus {
    pub fn failing_after(transactions: usize) -> Self {
        Self {
            ops: Vec::new(),
            fail_after: Some(transactions),
        }
    }

    fn push(&mut self, op: Op) -> Result<(), Error> {
        if self.fail_after.is_some_and(|n| self.ops.len() >= n) {
            return Err(Error::Transport(TransportFault::Spi(spi::ErrorKind::Other)));
        }
        self.ops.push(op);
        Ok(())
    }

    /// Every complete window programming sequence, in order
    pub fn windows(&self) -> Vec<DrawWindow> {
        let coord = |ops: &[Op]| match ops {
            [Op::Data8(hi), Op::Data8(lo)] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        };
        self.ops
            .windows(11)
            .filter_map(|w| {
                if w[0] != Op::Command(Instruction::CASET as u8)
                    || w[5] != Op::Command(Instruction::RASET as u8)
                    || w[10] != Op::Command(Instruction::RAMWR as u8)
                {
                    return None;
                }
                Some(DrawWindow::new(
                    coord(&w[1..3])?,
                    coord(&w[6..8])?,
                    coord(&w[3..5])?,
                    coord(&w[8..10])?,
                ))
            })
            .collect()
    }

    pub fn data16(&self) -> impl Iterator<Item = u16> + '_ {
        self.ops.iter().filter_map(|op| match op {
            Op::Data16(v) => Some(*v),
            _ => None,
        })
    }

    pub fn data16_count(&self) -> usize {
        self.data16().count()
    }

    /// Replay everything sent so far into a controller model
    pub fn screen(&self, width: u16, height: u16) -> Screen {
        Screen::replay(&self.ops, width, height)
    }
}

impl Bus for RecordingBus {
    fn write_command(&mut self, opcode: u8) -> Result<(), Error> {
        self.push(Op::Command(opcode))
    }

    fn write_data8(&mut self, value: u8) -> Result<(), Error> {
        self.push(Op::Data8(value))
    }

    fn write_data16(&mut self, value: u16) -> Result<(), Error> {
        self.push(Op::Data16(value))
    }

    fn write_data(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.push(Op::Data(bytes.to_vec()))
    }
}

/// Model of the controller frame memory: window registers plus a row-major write pointer
pub struct Screen {
    pub width: u16,
    pub height: u16,
    pixels: Vec<Option<u16>>,
    writes: Vec<u32>,
    window: DrawWindow,
    cursor: (u16, u16),
    streaming: bool,
}

impl Screen {
    pub fn replay(ops: &[Op], width: u16, height: u16) -> Self {
        let mut screen = Screen {
            width,
            height,
            pixels: vec![None; usize::from(width) * usize::from(height)],
            writes: vec![0; usize::from(width) * usize::from(height)],
            window: DrawWindow::new(0, 0, width - 1, height - 1),
            cursor: (0, 0),
            streaming: false,
        };
        let mut register: Option<(u8, Vec<u8>)> = None;

        for op in ops {
            match op {
                Op::Command(c) => {
                    register = None;
                    screen.streaming = false;
                    if *c == Instruction::CASET as u8 || *c == Instruction::RASET as u8 {
                        register = Some((*c, Vec::new()));
                    } else if *c == Instruction::RAMWR as u8 {
                        screen.cursor = (screen.window.x_start, screen.window.y_start);
                        screen.streaming = true;
                    }
                }
                Op::Data8(b) => {
                    if let Some((reg, bytes)) = register.as_mut() {
                        bytes.push(*b);
                        if bytes.len() == 4 {
                            let start = u16::from_be_bytes([bytes[0], bytes[1]]);
                            let end = u16::from_be_bytes([bytes[2], bytes[3]]);
                            if *reg == Instruction::CASET as u8 {
                                screen.window.x_start = start;
                                screen.window.x_end = end;
                            } else {
                                screen.window.y_start = start;
                                screen.window.y_end = end;
                            }
                            register = None;
                        }
                    }
                }
                Op::Data16(v) => screen.write(*v),
                Op::Data(bytes) => {
                    for px in bytes.chunks(2) {
                        screen.write(u16::from_be_bytes([px[0], px[1]]));
                    }
                }
            }
        }
        screen
    }

    fn write(&mut self, value: u16) {
        assert!(self.streaming, "pixel data outside a RAM write");
        let (x, y) = self.cursor;
        let idx = usize::from(y) * usize::from(self.width) + usize::from(x);
        self.pixels[idx] = Some(value);
        self.writes[idx] += 1;

        self.cursor = if x < self.window.x_end {
            (x + 1, y)
        } else if y < self.window.y_end {
            (self.window.x_start, y + 1)
        } else {
            (self.window.x_start, self.window.y_start)
        };
    }

    pub fn get(&self, x: u16, y: u16) -> Option<u16> {
        self.pixels[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }

    pub fn write_count(&self, x: u16, y: u16) -> u32 {
        self.writes[usize::from(y) * usize::from(self.width) + usize::from(x)]
    }

    /// Every pixel that was written at least once
    pub fn painted(&self) -> BTreeSet<(u16, u16)> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.get(x, y).is_some())
            .collect()
    }

    /// Pixels holding `color`
    pub fn painted_with(&self, color: u16) -> BTreeSet<(u16, u16)> {
        self.painted()
            .into_iter()
            .filter(|&(x, y)| self.get(x, y) == Some(color))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub dc_high: bool,
    pub bytes: Vec<u8>,
}

impl Transfer {
    pub fn command(opcode: u8) -> Self {
        Self {
            dc_high: false,
            bytes: vec![opcode],
        }
    }

    pub fn data(bytes: &[u8]) -> Self {
        Self {
            dc_high: true,
            bytes: bytes.to_vec(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireEvent {
    Transfer(Transfer),
    Reset(bool),
    DelayNs(u64),
}

#[derive(Default)]
struct WireState {
    dc_high: bool,
    events: Vec<WireEvent>,
    transactions: usize,
    spi_fail_after: Option<usize>,
    pin_fails: bool,
}

/// Shared log of everything the fake peripherals saw
#[derive(Clone, Default)]
pub struct Wire(Rc<RefCell<WireState>>);

impl Wire {
    pub fn transfers(&self) -> Vec<Transfer> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                WireEvent::Transfer(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<WireEvent> {
        self.0.borrow().events.clone()
    }

    pub fn fail_spi_after(&self, transactions: usize) {
        self.0.borrow_mut().spi_fail_after = Some(transactions);
    }

    pub fn fail_pin(&self) {
        self.0.borrow_mut().pin_fails = true;
    }
}

pub struct FakeSpi(Wire);

impl FakeSpi {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }
}

impl spi::ErrorType for FakeSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for FakeSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut state = (self.0).0.borrow_mut();
        if state.spi_fail_after.is_some_and(|n| state.transactions >= n) {
            return Err(spi::ErrorKind::Other);
        }
        state.transactions += 1;
        let dc_high = state.dc_high;
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                state.events.push(WireEvent::Transfer(Transfer {
                    dc_high,
                    bytes: bytes.to_vec(),
                }));
            }
        }
        Ok(())
    }
}

/// Command/data-select line
pub struct FakePin(Wire);

impl FakePin {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }

    fn set(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        let mut state = (self.0).0.borrow_mut();
        if state.pin_fails {
            return Err(digital::ErrorKind::Other);
        }
        state.dc_high = high;
        Ok(())
    }
}

impl digital::ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set(true)
    }
}

/// Reset line, logged as [`WireEvent::Reset`]
pub struct FakeResetPin(Wire);

impl FakeResetPin {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }
}

impl digital::ErrorType for FakeResetPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for FakeResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().events.push(WireEvent::Reset(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        (self.0).0.borrow_mut().events.push(WireEvent::Reset(true));
        Ok(())
    }
}

pub struct FakeDelay(Wire);

impl FakeDelay {
    pub fn new(wire: &Wire) -> Self {
        Self(wire.clone())
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        (self.0)
            .0
            .borrow_mut()
            .events
            .push(WireEvent::DelayNs(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        (self.0)
            .0
            .borrow_mut()
            .events
            .push(WireEvent::DelayNs(u64::from(ms) * 1_000_000));
    }
}

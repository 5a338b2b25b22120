//! Shared test doubles
//!
//! `MockBus` and `MockDelay` record into one event log so tests can check
//! the exact interleaving of reads, writes and settling delays. Every
//! transfer yields once before completing, so concurrent operations really
//! do get a chance to interleave at the executor level.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorType, I2c, Operation};

use pca9685_driver::config::DriverConfig;
use pca9685_driver::drivers::pca9685::Pca9685;
use pca9685_driver::types::Channel;

/// Something that reached the bus or the delay provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    /// Single register write (recorded even when it fails)
    Write { addr: u8, reg: u8, value: u8 },
    /// Single register read
    Read { addr: u8, reg: u8 },
    /// Settling delay
    Delay { us: u32 },
}

/// Shortcut for a write event at the default address
pub const fn w(reg: u8, value: u8) -> BusEvent {
    BusEvent::Write {
        addr: 0x40,
        reg,
        value,
    }
}

/// Shortcut for a read event at the default address
pub const fn r(reg: u8) -> BusEvent {
    BusEvent::Read { addr: 0x40, reg }
}

/// Simulated chip plus failure injection
pub struct BusState {
    pub events: Vec<BusEvent>,
    pub registers: [u8; 256],
    pub fail_reads: bool,
    pub fail_write_to: Option<u8>,
}

impl Default for BusState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            registers: [0; 256],
            fail_reads: false,
            fail_write_to: None,
        }
    }
}

pub type Shared = Rc<RefCell<BusState>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MockError;

impl embedded_hal::i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
    }
}

pub struct MockBus {
    state: Shared,
}

impl ErrorType for MockBus {
    type Error = MockError;
}

impl I2c for MockBus {
    async fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        yield_now().await;
        let mut state = self.state.borrow_mut();
        match operations {
            [Operation::Write(bytes)] => {
                let bytes: &[u8] = bytes;
                let &[reg, value] = bytes else {
                    panic!("expected a register write, got {bytes:?}");
                };
                state.events.push(BusEvent::Write { addr: address, reg, value });
                if state.fail_write_to == Some(reg) {
                    return Err(MockError);
                }
                state.registers[usize::from(reg)] = value;
                Ok(())
            }
            [Operation::Write(bytes), Operation::Read(buf)] => {
                let reg = bytes[0];
                state.events.push(BusEvent::Read { addr: address, reg });
                if state.fail_reads {
                    return Err(MockError);
                }
                buf[0] = state.registers[usize::from(reg)];
                Ok(())
            }
            _ => panic!("unexpected transaction shape"),
        }
    }
}

pub struct MockDelay {
    state: Shared,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        yield_now().await;
        self.state.borrow_mut().events.push(BusEvent::Delay { us: ns / 1_000 });
    }

    async fn delay_us(&mut self, us: u32) {
        yield_now().await;
        self.state.borrow_mut().events.push(BusEvent::Delay { us });
    }
}

pub type TestDriver = Pca9685<NoopRawMutex, MockBus, MockDelay>;

/// Build a driver over a fresh simulated chip
pub fn setup(config: DriverConfig) -> (TestDriver, Shared) {
    let state: Shared = Rc::new(RefCell::new(BusState::default()));
    let bus = MockBus { state: state.clone() };
    let delay = MockDelay { state: state.clone() };
    (Pca9685::new(bus, delay, config), state)
}

/// Take the events recorded so far, leaving the log empty
pub fn drain(state: &Shared) -> Vec<BusEvent> {
    std::mem::take(&mut state.borrow_mut().events)
}

pub fn ch(index: u8) -> Channel {
    Channel::new(index).unwrap()
}

//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the PCA9685 and the
//! runtime [`DriverConfig`] handed to the driver at construction.
//! Register addresses live next to the driver that uses them.

use crate::hal::i2c::I2cAddress;
use crate::types::Frequency;

/// PCA9685 internal oscillator frequency (25 MHz)
pub const BASE_CLOCK_HZ: u32 = 25_000_000;

/// PWM resolution: steps per output cycle (12 bits)
pub const STEPS_PER_CYCLE: u32 = 4096;

/// Highest step value a channel register can hold
pub const MAX_STEP: u16 = 4095;

/// Number of PWM channels on the chip
pub const NUM_CHANNELS: u8 = 16;

/// Smallest prescaler the chip accepts
pub const PRESCALER_MIN: u32 = 3;

/// Largest prescaler the chip accepts
pub const PRESCALER_MAX: u32 = 255;

/// Default PCA9685 I2C address (all address pins low)
pub const DEFAULT_I2C_ADDR: u8 = 0x40;

/// Default PWM frequency (standard hobby servo rate)
pub const DEFAULT_FREQUENCY_HZ: u32 = 50;

/// Oscillator settling time after clearing SLEEP, in microseconds.
///
/// The datasheet minimum is 500 us; 10 ms leaves a wide margin.
pub const SETTLE_DELAY_US: u32 = 10_000;

/// Datasheet minimum settling time in microseconds
pub const MIN_SETTLE_DELAY_US: u32 = 500;

/// I2C bus frequency used by the firmware
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

/// Channel toggled by the firmware heartbeat task
pub const HEARTBEAT_CHANNEL: u8 = 15;

/// Heartbeat half-period in milliseconds
pub const HEARTBEAT_PERIOD_MS: u64 = 500;

/// Pin assignments for the firmware
pub mod pins {
    //! GPIO pin assignments matching the bring-up board

    /// I2C1 SCL (PCA9685)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (PCA9685)
    pub const I2C1_SDA: &str = "PB9";

    /// PCA9685 output enable (active low, driven low at boot)
    pub const PCA9685_OE: &str = "PB0";
}

/// Runtime configuration for one driver instance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriverConfig {
    /// 7-bit device address
    pub address: I2cAddress,
    /// PWM frequency programmed by `init`
    pub frequency: Frequency,
    /// Wait between waking the oscillator and setting RESTART
    pub settle_delay_us: u32,
    /// Trace every register write at debug level
    pub debug: bool,
}

impl DriverConfig {
    /// Create the default configuration (0x40, 50 Hz, 10 ms settle, quiet)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            address: I2cAddress::PCA9685,
            frequency: Frequency::DEFAULT,
            settle_delay_us: SETTLE_DELAY_US,
            debug: false,
        }
    }

    /// Use a different device address
    #[must_use]
    pub const fn with_address(mut self, address: I2cAddress) -> Self {
        self.address = address;
        self
    }

    /// Use a different PWM frequency
    #[must_use]
    pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Use a different settling delay, never shorter than the datasheet minimum
    #[must_use]
    pub const fn with_settle_delay_us(mut self, settle_delay_us: u32) -> Self {
        self.settle_delay_us = if settle_delay_us < MIN_SETTLE_DELAY_US {
            MIN_SETTLE_DELAY_US
        } else {
            settle_delay_us
        };
        self
    }

    /// Enable or disable per-write debug tracing
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! Shared types used across the driver
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

use crate::calc;
use crate::config::{DEFAULT_FREQUENCY_HZ, NUM_CHANNELS};
use crate::error::{InvalidChannel, InvalidFrequency};

/// PWM output channel (0-15)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Lowest channel
    pub const FIRST: Self = Self(0);

    /// Highest channel
    pub const LAST: Self = Self(NUM_CHANNELS - 1);

    /// Create a channel, returns None if out of range
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < NUM_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Get the channel number
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Iterate over every channel in ascending order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_CHANNELS).map(Self)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({})", self.0)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CH{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CH{}", self.0);
    }
}

impl TryFrom<u8> for Channel {
    type Error = InvalidChannel;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(InvalidChannel(index))
    }
}

/// PWM output frequency in Hertz with validation
///
/// Only frequencies whose prescaler lands in the chip's 3..=255 range
/// can be represented (24 Hz to 1743 Hz).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frequency(u32);

impl Frequency {
    /// Default frequency (50 Hz)
    pub const DEFAULT: Self = Self(DEFAULT_FREQUENCY_HZ);

    /// Create a new Frequency from Hz, returns None if out of range
    #[must_use]
    pub const fn from_hz(hz: u32) -> Option<Self> {
        if calc::prescaler_in_range(calc::prescaler(hz)) {
            Some(Self(hz))
        } else {
            None
        }
    }

    /// Get the frequency in Hz
    #[must_use]
    pub const fn as_hz(self) -> u32 {
        self.0
    }

    /// Prescaler register value for this frequency
    #[must_use]
    pub const fn prescaler(self) -> u8 {
        // from_hz guarantees 3..=255
        calc::prescaler(self.0) as u8
    }

    /// Length of one step in microseconds
    #[must_use]
    pub fn step_length_us(self) -> f32 {
        calc::step_length_us(self.0)
    }

    /// Length of one cycle in microseconds
    #[must_use]
    pub fn cycle_length_us(self) -> f32 {
        calc::cycle_length_us(self.0)
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frequency({} Hz)", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Frequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{} Hz", self.0);
    }
}

impl TryFrom<u32> for Frequency {
    type Error = InvalidFrequency;

    fn try_from(hz: u32) -> Result<Self, Self::Error> {
        Self::from_hz(hz).ok_or(InvalidFrequency(hz))
    }
}

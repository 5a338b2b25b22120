//! Driver Errors
//!
//! Every operation resolves with `Result<_, Error<E>>`, where `E` is the
//! error type of the I2C implementation in use.

use core::fmt;

/// Channel number outside 0-15
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidChannel(pub u8);

/// Frequency of 0 Hz, or one whose prescaler falls outside 3..=255
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidFrequency(pub u32);

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// The bus read or write failed (NACK, arbitration loss, ...)
    I2c(E),
    /// Channel number outside 0-15, rejected before any write
    InvalidChannel(u8),
    /// Frequency the prescaler cannot express, rejected before any write
    InvalidFrequency(u32),
    /// The driver was disposed and no longer accepts operations
    Disposed,
}

impl<E> Error<E> {
    /// Check whether the error came from the bus rather than the caller
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::I2c(_))
    }
}

impl<E> From<InvalidChannel> for Error<E> {
    fn from(err: InvalidChannel) -> Self {
        Self::InvalidChannel(err.0)
    }
}

impl<E> From<InvalidFrequency> for Error<E> {
    fn from(err: InvalidFrequency) -> Self {
        Self::InvalidFrequency(err.0)
    }
}

impl fmt::Display for InvalidChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {} is out of range (0-15)", self.0)
    }
}

impl fmt::Display for InvalidFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz needs a prescaler outside 3-255", self.0)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2c(err) => write!(f, "I2C transfer failed: {err:?}"),
            Self::InvalidChannel(index) => fmt::Display::fmt(&InvalidChannel(*index), f),
            Self::InvalidFrequency(hz) => fmt::Display::fmt(&InvalidFrequency(*hz), f),
            Self::Disposed => write!(f, "driver has been disposed"),
        }
    }
}

impl core::error::Error for InvalidChannel {}

impl core::error::Error for InvalidFrequency {}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

#[cfg(feature = "embedded")]
impl<E: embedded_hal::i2c::Error> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::I2c(err) => defmt::write!(f, "I2C transfer failed: {}", err.kind()),
            Self::InvalidChannel(index) => defmt::write!(f, "channel {} is out of range", index),
            Self::InvalidFrequency(hz) => defmt::write!(f, "{} Hz is out of range", hz),
            Self::Disposed => defmt::write!(f, "driver has been disposed"),
        }
    }
}

//! I2C Bus Abstractions
//!
//! Single-register access for 8-bit register devices like the PCA9685.
//! Generic over any async I2C implementation (embassy-stm32 with DMA on
//! target, a recording mock in tests).

use core::fmt;

use embedded_hal_async::i2c::I2c;

use crate::config::DEFAULT_I2C_ADDR;

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// PCA9685 default address (A0-A5 low)
    pub const PCA9685: Self = Self(DEFAULT_I2C_ADDR);

    /// PCA9685 "ALL CALL" address, answered by every chip on the bus
    pub const PCA9685_ALL_CALL: Self = Self(0x70);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Create a PCA9685 address from the state of its A0-A5 pins
    #[must_use]
    pub const fn pca9685_with_pins(pins: u8) -> Self {
        Self(DEFAULT_I2C_ADDR | (pins & 0x3F))
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

impl Default for I2cAddress {
    fn default() -> Self {
        Self::PCA9685
    }
}

impl fmt::Display for I2cAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// I2C bus wrapper for register access
pub struct I2cBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> I2cBus<I2C> {
    /// Create a new I2C bus wrapper
    #[must_use]
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Write a single register
    pub async fn write_reg(&mut self, addr: I2cAddress, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(addr.addr(), &[reg, value]).await
    }

    /// Read a single register
    pub async fn read_reg(&mut self, addr: I2cAddress, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8];
        self.i2c.write_read(addr.addr(), &[reg], &mut buf).await?;
        Ok(buf[0])
    }

    /// Give the underlying bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

//! Hardware Abstraction Layer
//!
//! Provides bus access over any `embedded-hal-async` I2C implementation,
//! so the same driver runs on embassy-stm32 and on host test doubles.

pub mod i2c;

//! PCA9685 PWM Controller Driver Library
//!
//! This library drives the NXP PCA9685, a 16-channel, 12-bit PWM
//! controller reached over I2C. It turns requests expressed in human
//! units (Hz, microseconds, duty-cycle fractions) into short, strictly
//! ordered sequences of single-byte register writes.
//!
//! # Architecture
//!
//! The library is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLIENT TASKS                            │
//! │    set_pulse_length │ set_duty_cycle │ set_frequency │ ...   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   COMMAND SEQUENCER                          │
//! │  Bus lock  │  Command builders  │  Frequency state machine   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    UNIT CONVERTER                            │
//! │      Prescaler  │  Step length  │  Pulse / duty to steps     │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 HAL (embedded-hal-async)                     │
//! │              I2C bus  │  Delay provider                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: unit conversion, command
//!   building and the frequency program are pure; only the driver does I/O
//! - **Type-driven design**: [`types::Channel`] and [`types::Frequency`]
//!   cannot hold out-of-range values
//! - **One operation on the wire at a time**: every logical operation
//!   holds the bus lock for all of its writes
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

// Must come first so the logging macros are visible to later modules.
#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// Bus access over any `embedded-hal-async` I2C implementation.
pub mod hal;

/// Peripheral Drivers
///
/// The PCA9685 command sequencer.
pub mod drivers;

/// Unit Converter
///
/// Prescaler and step calculations, testable on the host.
pub mod calc;

/// Error taxonomy shared by all driver operations
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::drivers::pca9685::Pca9685;
    pub use crate::error::Error;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal_async::delay::DelayNs;
    pub use embedded_hal_async::i2c::I2c;

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Delay, Duration, Instant, Timer};

    // Logging
    #[cfg(feature = "embedded")]
    pub use defmt::{debug, error, info, trace, warn};
}

//! PCA9685 Bring-up Firmware
//!
//! Entry point for an STM32G474 board with a PCA9685 on I2C1.
//! Enables the outputs, initializes the chip (which forces every output
//! off) and spawns a heartbeat.

#![no_std]
#![no_main]

use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_stm32::gpio::{Level, Output, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::mode::Async;
use embassy_stm32::time::Hertz;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pca9685_driver::prelude::*;

/// Driver shared between tasks
type Driver = Pca9685<CriticalSectionRawMutex, I2c<'static, Async>, Delay>;

static DRIVER: StaticCell<Driver> = StaticCell::new();

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    I2C1_EV => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("PCA9685 Firmware v{}", env!("CARGO_PKG_VERSION"));

    // Initialize STM32G474 peripherals with default clock configuration
    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    // Initialize I2C1 for the PCA9685
    // PB8 = SCL, PB9 = SDA for I2C1 on STM32G474
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, // SCL
        p.PB9, // SDA
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        Hertz(I2C_FREQUENCY_HZ),
        Default::default(),
    );

    info!(
        "I2C1 initialized at {} Hz (SCL {}, SDA {})",
        I2C_FREQUENCY_HZ,
        pins::I2C1_SCL,
        pins::I2C1_SDA
    );

    // OE is active low; hold it low so the outputs follow the PWM registers
    let _output_enable = Output::new(p.PB0, Level::Low, Speed::Low);
    info!("PCA9685 outputs enabled ({} low)", pins::PCA9685_OE);

    let driver: &'static Driver = DRIVER.init(Pca9685::new(i2c, Delay, DriverConfig::new()));

    // init resets MODE1/MODE2 and forces every channel off before the
    // frequency program runs
    if let Err(err) = driver.init().await {
        error!("PCA9685 init failed: {}", err);
        return;
    }
    info!("PCA9685 running at {}", driver.frequency().await);

    spawner.spawn(heartbeat_task(driver)).unwrap();

    // Main loop - additional coordination can happen here
    loop {
        Timer::after(Duration::from_secs(10)).await;
        info!("Main loop tick");
    }
}

/// Heartbeat task - blinks a PCA9685 output to show the bus is alive
#[embassy_executor::task]
async fn heartbeat_task(driver: &'static Driver) {
    let Some(channel) = Channel::new(HEARTBEAT_CHANNEL) else {
        error!("Heartbeat channel {} does not exist", HEARTBEAT_CHANNEL);
        return;
    };

    loop {
        if driver.channel_on(channel).await.is_err() {
            return;
        }
        Timer::after(Duration::from_millis(HEARTBEAT_PERIOD_MS)).await;
        if driver.channel_off(channel).await.is_err() {
            return;
        }
        Timer::after(Duration::from_millis(HEARTBEAT_PERIOD_MS)).await;
    }
}

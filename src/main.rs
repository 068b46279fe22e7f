//! Firmware for a single-mode-switch flashlight driver.
//!
//! # Overview
//!
//! The light has no button, only a clicky switch in series with the
//! battery. Tapping the switch (off and back on within about half a
//! second) steps through the modes; a longer off resets to the brightest
//! mode. See the library docs for how the off-time is measured.
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power)
//! - **LED**: single emitter behind a PWM-switched current regulator
//! - **Mode store**: last page of program flash
//! - **Off-time sensing**: two SRAM bytes in the `.uninit` section
//!
//! # Boot Sequence
//!
//! 1. Claim the retained SRAM cells
//! 2. Configure clocks and PWM (LED off)
//! 3. Classify the off-time and clear the decay flag
//! 4. Compute and persist the next mode
//! 5. Hold a fixed level or play the ramp until power is cut
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings and peripheral initialization
//! - [`noinit`] - Retained SRAM cells

#![no_std]
#![no_main]

mod hardware;
mod noinit;

use embassy_executor::Spawner;
use embassy_stm32::{
    Config,
    rcc::{LsConfig, mux::ClockMux},
};
use embassy_time::Delay;
use offtime_driver::Flashlight;
use {defmt_rtt as _, panic_probe as _};

use hardware::{MODE_STORE_LEN, MODE_STORE_START, Peripherals};
use noinit::NoInitMemory;

/// Flashlight variant baked into this image.
static LIGHT: offtime_driver::Config = offtime_driver::Config::BUILD;

/// Creates the clock configuration for the driver.
///
/// # Clock Settings
///
/// - **MSI**: 2.097 MHz, enough for an 8-bit PWM well above flicker range
/// - **System clock**: MSI (no PLL)
/// - **LSE/LSI**: off, nothing needs the RTC
/// - **Voltage scale**: Range 1
///
/// # Returns
///
/// Configured RCC settings for embassy-stm32 initialization
fn create_clock_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig::off(),
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE1,
        mux: ClockMux::default(),
    }
}

/// Main entry point for the flashlight firmware.
///
/// Makes the one mode decision of this power session, then either parks
/// with the LED held at a fixed level or plays the ramp. Neither returns;
/// the session ends when the switch cuts power.
#[embassy_executor::main]
async fn main(_spawner: Spawner) -> ! {
    let Some(memory) = NoInitMemory::take() else {
        defmt::panic!("retained memory already claimed");
    };

    let mut config = Config::default();
    config.rcc = create_clock_config();

    let p = embassy_stm32::init(config);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Initializing peripherals...");

    let peripherals = Peripherals::new(p);

    let mut light = match Flashlight::new(
        &LIGHT,
        peripherals.led,
        peripherals.flash,
        MODE_STORE_START,
        MODE_STORE_LEN,
        memory,
    ) {
        Ok(light) => light,
        Err(e) => defmt::panic!("mode store misconfigured: {}", defmt::Debug2Format(&e)),
    };

    let boot = light.boot();

    #[cfg(feature = "debug-mode")]
    defmt::info!("Mode {} selected, dispatching {}", boot.mode, boot.dispatch);

    light.run(boot.dispatch, &mut Delay).await
}

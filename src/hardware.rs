//! Hardware abstraction and peripheral initialization.
//!
//! This module defines the pin mappings and peripheral initialization
//! for the flashlight driver board.
//!
//! # Pin Assignments
//!
//! ## LED
//! - **PA1**: LED_PWM - TIM2_CH2, drives the gate of the LED current switch
//!
//! ## Debug (SWD)
//! - **PA13**: SWDIO
//! - **PA14**: SWCLK
//!
//! # Flash Layout
//!
//! The last 128-byte page of program flash is reserved for the mode store.
//! The firmware image is far smaller than the 32 KiB part, so the page is
//! never reached by code.

use embassy_stm32::flash::{Blocking, FLASH_SIZE, Flash};
use embassy_stm32::gpio::OutputType;
use embassy_stm32::peripherals::TIM2;
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm, SimplePwmChannel};

/// LED PWM frequency, high enough to be flicker-free.
const PWM_FREQUENCY: Hertz = Hertz::khz(8);

/// Flash page size on STM32L0.
const FLASH_PAGE_SIZE: u32 = 128;

/// Start of the mode store, relative to the start of flash.
pub const MODE_STORE_START: u32 = FLASH_SIZE as u32 - FLASH_PAGE_SIZE;

/// Size of the mode store region.
pub const MODE_STORE_LEN: u32 = FLASH_PAGE_SIZE;

/// PWM channel driving the LED.
pub type Led = SimplePwmChannel<'static, TIM2>;

/// Top-level peripheral container for the flashlight driver.
pub struct Peripherals {
    /// LED brightness output
    pub led: Led,
    /// Program flash, holds the mode store
    pub flash: Flash<'static, Blocking>,
}

impl Peripherals {
    /// Initializes all peripherals from STM32 peripheral singleton.
    ///
    /// The LED channel starts enabled at 0% duty.
    ///
    /// # Arguments
    ///
    /// * `p` - STM32 peripheral singleton from embassy_stm32::init()
    pub fn new(p: embassy_stm32::Peripherals) -> Self {
        let pwm = SimplePwm::new(
            p.TIM2,
            None,
            Some(PwmPin::new(p.PA1, OutputType::PushPull)),
            None,
            None,
            PWM_FREQUENCY,
            CountingMode::EdgeAlignedUp,
        );

        let mut led = pwm.split().ch2;
        led.set_duty_cycle_fully_off();
        led.enable();

        Self {
            led,
            flash: Flash::new_blocking(p.FLASH),
        }
    }
}

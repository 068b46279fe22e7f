//! Boot-time controller for the flashlight.
//!
//! Owns the LED, the mode store and the retained cells, and runs the
//! single decision the firmware makes per power session:
//!
//! ```text
//! classify off-time -> next mode -> persist -> dispatch
//!                                               |-- Hold(level): write once, idle
//!                                               '-- Ramp: play until power loss
//! ```
//!
//! The decay flag is always read and cleared before anything else looks at
//! the retained cells, and the new mode is persisted before any output
//! changes, so losing power mid-dispatch never loses a mode advance.

use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;
use embedded_storage::nor_flash::NorFlash;

use crate::config::Config;
use crate::modes::{Dispatch, next_mode};
use crate::offtime::{OffTime, classify};
use crate::ramp::{RampEngine, set_level};
use crate::retained::RetainedMemory;
use crate::store::{ModeStore, StoreError};

/// Mode index a blank or unreadable store reports, like an erased EEPROM
/// cell. It wraps to the first mode whichever way the boot is classified.
pub const ERASED_MODE: u8 = 0xFF;

/// Outcome of one boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Boot {
    /// How the off-time was classified.
    pub off_time: OffTime,
    /// Mode read from the store, `None` if blank or unreadable.
    pub stored: Option<u8>,
    /// Mode selected for this session.
    pub mode: u8,
    /// What the light is doing now.
    pub dispatch: Dispatch,
}

/// Single-LED flashlight with off-time mode switching.
pub struct Flashlight<'c, P, F, M> {
    config: &'c Config,
    led: P,
    store: ModeStore<F>,
    memory: M,
    ramp: RampEngine<'c>,
}

impl<'c, P, F, M> Flashlight<'c, P, F, M>
where
    P: SetDutyCycle,
    F: NorFlash,
    M: RetainedMemory,
{
    /// Creates the controller and switches the LED off.
    ///
    /// # Arguments
    ///
    /// * `config` - Build-time variant
    /// * `led` - PWM channel driving the LED
    /// * `flash` - Flash holding the mode store
    /// * `store_start`, `store_len` - Erase-aligned store region within `flash`
    /// * `memory` - Cells retained across short power gaps
    pub fn new(
        config: &'c Config,
        mut led: P,
        flash: F,
        store_start: u32,
        store_len: u32,
        memory: M,
    ) -> Result<Self, StoreError<F::Error>> {
        set_level(&mut led, 0);
        Ok(Self {
            config,
            led,
            store: ModeStore::new(flash, store_start, store_len)?,
            memory,
            ramp: RampEngine::new(config.ramp_table, config.ramp_policy),
        })
    }

    /// Runs the boot decision and applies fixed outputs.
    ///
    /// Store failures never keep the light off: a failed load counts as a
    /// blank store and a failed save is only logged.
    pub fn boot(&mut self) -> Boot {
        let off_time = classify(&mut self.memory);

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(_e) => {
                #[cfg(feature = "debug-mode")]
                defmt::warn!("mode store read failed: {}", defmt::Debug2Format(&_e));
                None
            }
        };

        let mode = next_mode(
            stored.unwrap_or(ERASED_MODE),
            off_time,
            self.config.mode_memory,
            self.config.mode_count(),
        );

        if let Err(_e) = self.store.save(mode) {
            #[cfg(feature = "debug-mode")]
            defmt::warn!("mode store write failed: {}", defmt::Debug2Format(&_e));
        }

        let dispatch = self.config.mode(mode).dispatch(self.memory.last_level());
        if let Dispatch::Hold(level) = dispatch {
            set_level(&mut self.led, level);
        }

        #[cfg(feature = "debug-mode")]
        defmt::info!(
            "boot: off-time {}, stored {}, mode {}, {}",
            off_time,
            stored,
            mode,
            dispatch
        );

        Boot {
            off_time,
            stored,
            mode,
            dispatch,
        }
    }

    /// Carries out `dispatch` until power is removed.
    ///
    /// A held level needs no further work, so the task just parks.
    pub async fn run<D: DelayNs>(&mut self, dispatch: Dispatch, delay: &mut D) -> ! {
        match dispatch {
            Dispatch::Hold(_) => loop {
                core::future::pending::<()>().await;
            },
            Dispatch::Ramp => self.ramp(delay).await,
        }
    }

    /// Plays the ramp until power is removed.
    pub async fn ramp<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        self.ramp
            .play(
                &mut self.led,
                &mut self.memory,
                delay,
                self.config.step_delay_ms,
            )
            .await
    }

    /// Plays `steps` ramp steps, continuing where the last call stopped.
    pub async fn ramp_for<D: DelayNs>(&mut self, delay: &mut D, steps: usize) {
        self.ramp
            .play_for(
                &mut self.led,
                &mut self.memory,
                delay,
                self.config.step_delay_ms,
                steps,
            )
            .await
    }

    pub fn led(&self) -> &P {
        &self.led
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn store(&self) -> &ModeStore<F> {
        &self.store
    }

    /// Tears the controller down, e.g. to simulate a power cut.
    pub fn into_parts(self) -> (P, F, M) {
        (self.led, self.store.into_inner(), self.memory)
    }
}

//! Build-time flashlight configuration.
//!
//! Nothing here changes at runtime. The firmware uses [`Config::BUILD`],
//! which is picked by Cargo features:
//!
//! - `basic-modes`: four fixed levels instead of the six-mode ramping set
//! - `mode-memory`: resume the stored mode after a long power-off
//! - `ramp-sawtooth`: forward-only ramp instead of rise-fall

use crate::modes::Mode;
use crate::ramp::RampPolicy;
use crate::ramp_table;

/// Default delay between ramp steps.
pub const STEP_DELAY_MS: u32 = 60;

/// Four fixed levels, brightest first.
pub const BASIC_MODES: [Mode; 4] = [
    Mode::Fixed(0xFF),
    Mode::Fixed(0x40),
    Mode::Fixed(0x10),
    Mode::Fixed(0x04),
];

/// Fixed levels followed by the ramp and its selection mode.
pub const RAMPING_MODES: [Mode; 6] = [
    Mode::Fixed(0xFF),
    Mode::Fixed(0x40),
    Mode::Fixed(0x10),
    Mode::Fixed(0x04),
    Mode::Ramp,
    Mode::RampSelection,
];

#[cfg(feature = "basic-modes")]
const BUILD_MODES: &[Mode] = &BASIC_MODES;
#[cfg(not(feature = "basic-modes"))]
const BUILD_MODES: &[Mode] = &RAMPING_MODES;

/// Static description of one firmware variant.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Mode cycle, index 0 is the cold-start default.
    pub modes: &'static [Mode],
    /// Resume the stored mode after a long power-off.
    pub mode_memory: bool,
    pub ramp_table: &'static [u8],
    pub ramp_policy: RampPolicy,
    pub step_delay_ms: u32,
}

impl Config {
    /// Four fixed levels, no ramp.
    pub const BASIC: Self = Self {
        modes: &BASIC_MODES,
        mode_memory: false,
        ramp_table: &ramp_table::SIN_SQUARED_HALF_PERIOD,
        ramp_policy: RampPolicy::Triangle,
        step_delay_ms: STEP_DELAY_MS,
    };

    /// Six modes with rise-fall ramping and ramp selection.
    pub const RAMPING: Self = Self {
        modes: &RAMPING_MODES,
        mode_memory: false,
        ramp_table: &ramp_table::SIN_SQUARED_HALF_PERIOD,
        ramp_policy: RampPolicy::Triangle,
        step_delay_ms: STEP_DELAY_MS,
    };

    /// Variant selected by Cargo features.
    pub const BUILD: Self = Self {
        modes: BUILD_MODES,
        mode_memory: cfg!(feature = "mode-memory"),
        ramp_table: &ramp_table::SIN_SQUARED_HALF_PERIOD,
        ramp_policy: if cfg!(feature = "ramp-sawtooth") {
            RampPolicy::Sawtooth
        } else {
            RampPolicy::Triangle
        },
        step_delay_ms: STEP_DELAY_MS,
    };

    /// Number of modes in the cycle, saturating at 255.
    pub const fn mode_count(&self) -> u8 {
        if self.modes.len() > u8::MAX as usize {
            u8::MAX
        } else {
            self.modes.len() as u8
        }
    }

    /// Mode at `index`, falling back to the first mode when out of range.
    pub fn mode(&self, index: u8) -> Mode {
        self.modes
            .get(index as usize)
            .or(self.modes.first())
            .copied()
            .unwrap_or(Mode::Fixed(u8::MAX))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::BUILD
    }
}

//! Mode table and the once-per-boot state machine.
//!
//! There is no button, so the mode can only change at boot. The off-time
//! classifier decides how the stored index moves:
//!
//! ```text
//! Short tap              -> previous + 1
//! Long off, memory off   -> 0
//! Long off, memory on    -> previous
//! ```
//!
//! Whatever comes out is wrapped back to 0 when it falls outside the mode
//! table, which also absorbs a corrupted or blank store.

use crate::offtime::OffTime;

/// What the light does in a given mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Constant PWM level.
    Fixed(u8),
    /// Continuous ramp through the ramp table.
    Ramp,
    /// Hold the level captured by the last ramp session.
    RampSelection,
}

/// Output decision for one boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// Level written once and held until power is removed.
    Hold(u8),
    /// Hand control to the ramp engine.
    Ramp,
}

impl Mode {
    /// Resolves the mode into an output, reading the captured ramp level
    /// when needed.
    pub const fn dispatch(self, last_level: u8) -> Dispatch {
        match self {
            Self::Fixed(level) => Dispatch::Hold(level),
            Self::Ramp => Dispatch::Ramp,
            Self::RampSelection => Dispatch::Hold(last_level),
        }
    }
}

/// Computes the mode index for this boot.
///
/// `previous` is the index read from the mode store. `mode_count` must be
/// at least 1.
pub fn next_mode(previous: u8, off_time: OffTime, mode_memory: bool, mode_count: u8) -> u8 {
    let mode = match off_time {
        OffTime::Short => previous.wrapping_add(1),
        OffTime::Long if mode_memory => previous,
        OffTime::Long => 0,
    };

    if mode >= mode_count { 0 } else { mode }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tap_cycles_back_to_start() {
        for count in [4u8, 6] {
            for start in 0..count {
                let mut mode = start;
                for _ in 0..count {
                    mode = next_mode(mode, OffTime::Short, false, count);
                }
                assert_eq!(mode, start);
            }
        }
    }

    #[test]
    fn long_off_without_memory_resets() {
        for previous in 0..=u8::MAX {
            assert_eq!(next_mode(previous, OffTime::Long, false, 6), 0);
        }
    }

    #[test]
    fn long_off_with_memory_resumes() {
        for previous in 0..6 {
            assert_eq!(next_mode(previous, OffTime::Long, true, 6), previous);
        }
    }

    #[test]
    fn corrupted_index_wraps_to_zero() {
        assert_eq!(next_mode(200, OffTime::Long, true, 6), 0);
        assert_eq!(next_mode(9, OffTime::Short, false, 4), 0);
        // an erased EEPROM cell overflows straight to the first mode
        assert_eq!(next_mode(0xFF, OffTime::Short, false, 6), 0);
    }

    #[test]
    fn dispatch_table() {
        assert_eq!(Mode::Fixed(0x40).dispatch(9), Dispatch::Hold(0x40));
        assert_eq!(Mode::Ramp.dispatch(9), Dispatch::Ramp);
        assert_eq!(Mode::RampSelection.dispatch(9), Dispatch::Hold(9));
    }
}

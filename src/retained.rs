//! Memory that survives a short power interruption.
//!
//! The driver keeps two bytes in SRAM that the startup code never
//! initializes. While the supply is cut, the decoupling capacitor keeps
//! the SRAM alive for roughly 500 ms; past that, bits start drifting
//! towards their biased power-up value. The next boot reads those bytes
//! back to learn what the previous session left behind.
//!
//! # Cells
//!
//! - **Decay flag**: written to 0 on every boot. Still 0 on the next boot
//!   means the power gap was short.
//! - **Last ramp level**: the most recent brightness emitted by the ramp,
//!   recovered by the ramp-selection mode.
//!
//! The firmware backs this trait with cells in the `.uninit` section.
//! Host code and tests use [`BootContext`].

use crate::offtime::OffTime;

/// Access to the two bytes handed from one power session to the next.
pub trait RetainedMemory {
    /// Current value of the decay flag.
    fn decay_flag(&self) -> u8;

    /// Overwrites the decay flag.
    fn set_decay_flag(&mut self, value: u8);

    /// Last level written by the ramp engine.
    fn last_level(&self) -> u8;

    /// Overwrites the last ramp level.
    fn set_last_level(&mut self, value: u8);
}

/// Plain in-RAM snapshot of the retained cells.
///
/// Stands in for the hardware cells whenever the previous session has to
/// be injected, e.g. in tests or a host-side simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootContext {
    /// Off-time checksum, 0 after a short gap.
    pub decay_flag: u8,
    /// Brightness captured while ramping.
    pub last_level: u8,
}

impl BootContext {
    /// Bit pattern the cells settle to after a long power-off.
    ///
    /// SRAM on these parts decays towards 1, so a fully drained cell reads
    /// as all ones.
    pub const DECAYED: u8 = 0xFF;

    /// Contents of SRAM on the very first power-up.
    pub const fn cold() -> Self {
        Self {
            decay_flag: Self::DECAYED,
            last_level: Self::DECAYED,
        }
    }

    /// Simulates cutting power for the given off-time.
    ///
    /// A short gap hands both cells over untouched. A long gap decays
    /// them, which is what the next boot's classifier keys on.
    pub fn after_power_off(self, off_time: OffTime) -> Self {
        match off_time {
            OffTime::Short => self,
            OffTime::Long => Self::cold(),
        }
    }
}

impl Default for BootContext {
    fn default() -> Self {
        Self::cold()
    }
}

impl RetainedMemory for BootContext {
    fn decay_flag(&self) -> u8 {
        self.decay_flag
    }

    fn set_decay_flag(&mut self, value: u8) {
        self.decay_flag = value;
    }

    fn last_level(&self) -> u8 {
        self.last_level
    }

    fn set_last_level(&mut self, value: u8) {
        self.last_level = value;
    }
}

impl<M: RetainedMemory + ?Sized> RetainedMemory for &mut M {
    fn decay_flag(&self) -> u8 {
        (**self).decay_flag()
    }

    fn set_decay_flag(&mut self, value: u8) {
        (**self).set_decay_flag(value)
    }

    fn last_level(&self) -> u8 {
        (**self).last_level()
    }

    fn set_last_level(&mut self, value: u8) {
        (**self).set_last_level(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_gap_keeps_cells() {
        let ctx = BootContext {
            decay_flag: 0,
            last_level: 50,
        };
        assert_eq!(ctx.after_power_off(OffTime::Short), ctx);
    }

    #[test]
    fn long_gap_decays_cells() {
        let ctx = BootContext {
            decay_flag: 0,
            last_level: 50,
        };
        let after = ctx.after_power_off(OffTime::Long);
        assert_ne!(after.decay_flag, 0);
        assert_eq!(after, BootContext::cold());
    }
}

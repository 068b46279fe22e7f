//! Off-time classification from the decay flag.
//!
//! The flag is a one-byte checksum: every boot clears it, and any bit that
//! reads back as set on the following boot means SRAM lost power long
//! enough to decay. The test is deliberately binary. A partially decayed
//! byte counts the same as a fully decayed one.

use crate::retained::RetainedMemory;

/// How long the light was unpowered before this boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OffTime {
    /// Power came back inside the decay window (a mode-advance tap).
    Short,
    /// Power was off past the decay window, or this is a cold start.
    Long,
}

impl OffTime {
    /// Interprets a raw decay flag value.
    pub const fn from_decay_flag(flag: u8) -> Self {
        if flag == 0 { Self::Short } else { Self::Long }
    }
}

/// Reads and resets the decay flag.
///
/// The flag is read exactly once and then cleared unconditionally so the
/// next boot starts from a clean slate. Must run before anything else
/// touches the retained cells.
pub fn classify<M: RetainedMemory>(memory: &mut M) -> OffTime {
    let off_time = OffTime::from_decay_flag(memory.decay_flag());
    memory.set_decay_flag(0);
    off_time
}

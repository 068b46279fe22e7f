//! Retained cells in SRAM that startup leaves untouched.
//!
//! cortex-m-rt collects `.uninit.*` input sections into a NOLOAD output
//! section which the reset handler neither zeroes nor copies from flash,
//! so after a short power gap the cells still hold what the previous
//! session wrote.
//!
//! Brown-out reset must be enabled in the option bytes (BOR level 1 or
//! higher). Without it the core can limp along while the supply collapses
//! and corrupt the cells before SRAM is actually lost.

use core::mem::MaybeUninit;
use core::ptr::{self, addr_of_mut};

use offtime_driver::RetainedMemory;
use portable_atomic::{AtomicBool, Ordering};

#[repr(C)]
struct Cells {
    decay_flag: u8,
    last_level: u8,
}

#[unsafe(link_section = ".uninit.OFFTIME")]
static mut CELLS: MaybeUninit<Cells> = MaybeUninit::uninit();

static TAKEN: AtomicBool = AtomicBool::new(false);

/// Handle to the `.uninit` cells.
///
/// Only one handle exists per boot, so all accesses go through a single
/// owner.
pub struct NoInitMemory {
    _private: (),
}

impl NoInitMemory {
    /// Returns the handle on the first call and `None` afterwards.
    pub fn take() -> Option<Self> {
        if TAKEN.swap(true, Ordering::Relaxed) {
            None
        } else {
            Some(Self { _private: () })
        }
    }

    fn cells() -> *mut Cells {
        addr_of_mut!(CELLS).cast()
    }
}

// SAFETY (all accesses below): the cells are plain bytes in SRAM reserved
// for this handle, every bit pattern is a valid u8, and the single handle
// plus the single-threaded executor rule out concurrent access. Volatile
// accesses keep the compiler from caching values across the power gap.
impl RetainedMemory for NoInitMemory {
    fn decay_flag(&self) -> u8 {
        unsafe { ptr::read_volatile(addr_of_mut!((*Self::cells()).decay_flag)) }
    }

    fn set_decay_flag(&mut self, value: u8) {
        unsafe { ptr::write_volatile(addr_of_mut!((*Self::cells()).decay_flag), value) }
    }

    fn last_level(&self) -> u8 {
        unsafe { ptr::read_volatile(addr_of_mut!((*Self::cells()).last_level)) }
    }

    fn set_last_level(&mut self, value: u8) {
        unsafe { ptr::write_volatile(addr_of_mut!((*Self::cells()).last_level), value) }
    }
}

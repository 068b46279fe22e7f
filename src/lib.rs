//! Off-time mode switching for single-button flashlights.
//!
//! # Overview
//!
//! A clicky flashlight has exactly one input: a switch that cuts the
//! supply. This crate infers what the user meant from how long the driver
//! was unpowered and maps it onto a small cycle of brightness modes:
//!
//! - Normal on/off keeps the cold-start mode (or the stored one with mode
//!   memory enabled)
//! - A quick off/on tap advances to the next mode
//! - Tapping while the ramp is playing freezes the light at the level
//!   that was showing
//!
//! Off-time is measured without a clock. A byte of SRAM that the startup
//! code never initializes is cleared at every boot; if it still reads 0 on
//! the next boot, the decoupling capacitor kept SRAM alive through the
//! gap, which lasts about 500 ms.
//!
//! # Known Limitation
//!
//! SRAM decay varies with temperature and from part to part, and the
//! classifier only distinguishes zero from nonzero. A drifting decay window
//! shows up as an unwanted mode advance or reset; nothing can detect it.
//!
//! # Module Organization
//!
//! - [`offtime`] - Decay flag classifier
//! - [`modes`] - Mode table and boot state machine
//! - [`ramp`] - Ramp table playback
//! - [`ramp_table`] - Brightness curves
//! - [`store`] - Wear-aware mode persistence on NOR flash
//! - [`retained`] - Cells handed over between power sessions
//! - [`config`] - Build-time variants
//! - [`flashlight`] - Controller tying the above together
//! - [`mock`] - Hardware doubles for host testing

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod flashlight;
pub mod mock;
pub mod modes;
pub mod offtime;
pub mod ramp;
pub mod ramp_table;
pub mod retained;
pub mod store;

pub use config::Config;
pub use flashlight::{Boot, Flashlight};
pub use modes::{Dispatch, Mode};
pub use offtime::OffTime;
pub use ramp::{RampEngine, RampPolicy};
pub use retained::{BootContext, RetainedMemory};
pub use store::{ModeStore, StoreError};

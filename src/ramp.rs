//! Ramp playback for brightness selection.
//!
//! The engine walks a ramp table at a fixed step interval, writing every
//! level to the LED and to the retained last-level cell. When the user taps
//! the switch, the next boot lands in ramp-selection mode and picks that
//! cell up, so the light freezes at whatever brightness was showing.
//!
//! # Policies
//!
//! ```text
//! Sawtooth  //////    0, 1, .., K-1, 0, 1, ..        period K
//! Triangle  /\/\/\    0, 1, .., K-1, K-2, .., 1, 0   period 2K-2
//! ```
//!
//! The triangle turns around without repeating either endpoint.

use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;

use crate::retained::RetainedMemory;

/// Direction policy for ramp playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampPolicy {
    /// Forward only, jumping from the brightest entry back to the dimmest.
    Sawtooth,
    /// Forward then backward, reversing smoothly at both ends.
    #[default]
    Triangle,
}

impl RampPolicy {
    /// Number of steps before the emitted sequence repeats.
    pub const fn period(self, len: usize) -> usize {
        match self {
            Self::Triangle if len > 2 => 2 * len - 2,
            _ => len,
        }
    }
}

/// Writes an 8-bit level to a PWM channel of any resolution.
///
/// The output has no feedback path, so a failed write is dropped.
pub fn set_level<P: SetDutyCycle>(led: &mut P, level: u8) {
    let _ = led.set_duty_cycle_fraction(level as u16, u8::MAX as u16);
}

/// Endless cursor over a ramp table.
///
/// Iterating yields table values forever according to the policy; an empty
/// table yields nothing.
#[derive(Debug, Clone)]
pub struct RampEngine<'t> {
    table: &'t [u8],
    policy: RampPolicy,
    /// Position within one period
    phase: usize,
}

impl<'t> RampEngine<'t> {
    /// Creates an engine positioned at the first table entry.
    pub const fn new(table: &'t [u8], policy: RampPolicy) -> Self {
        Self {
            table,
            policy,
            phase: 0,
        }
    }

    /// Steps per full cycle.
    pub const fn period(&self) -> usize {
        self.policy.period(self.table.len())
    }

    /// Table index the next step will emit.
    pub fn index(&self) -> usize {
        let len = self.table.len();
        if len == 0 || self.phase < len {
            self.phase
        } else {
            // descending leg of the triangle
            2 * len - 2 - self.phase
        }
    }

    /// Emits one level to the LED, then records it as the last ramp level.
    ///
    /// Returns the emitted level, or `None` for an empty table, in which
    /// case neither output is touched.
    pub fn step<P, M>(&mut self, led: &mut P, memory: &mut M) -> Option<u8>
    where
        P: SetDutyCycle,
        M: RetainedMemory,
    {
        let level = self.next()?;
        set_level(led, level);
        memory.set_last_level(level);
        Some(level)
    }

    /// Plays `steps` ramp steps, waiting `step_delay_ms` after each one.
    pub async fn play_for<P, M, D>(
        &mut self,
        led: &mut P,
        memory: &mut M,
        delay: &mut D,
        step_delay_ms: u32,
        steps: usize,
    ) where
        P: SetDutyCycle,
        M: RetainedMemory,
        D: DelayNs,
    {
        for _ in 0..steps {
            if self.step(led, memory).is_none() {
                return;
            }
            delay.delay_ms(step_delay_ms).await;
        }
    }

    /// Plays the ramp until power is removed.
    ///
    /// With an empty table the LED keeps its current level.
    pub async fn play<P, M, D>(
        &mut self,
        led: &mut P,
        memory: &mut M,
        delay: &mut D,
        step_delay_ms: u32,
    ) -> !
    where
        P: SetDutyCycle,
        M: RetainedMemory,
        D: DelayNs,
    {
        loop {
            if self.step(led, memory).is_none() {
                core::future::pending::<()>().await;
            }
            delay.delay_ms(step_delay_ms).await;
        }
    }
}

impl Iterator for RampEngine<'_> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        let period = self.period();
        if period == 0 {
            return None;
        }
        let level = self.table[self.index()];
        self.phase = (self.phase + 1) % period;
        Some(level)
    }
}

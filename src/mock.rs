//! In-memory stand-ins for the driver's hardware.
//!
//! These let the boot sequence, ramp playback and mode store run on the
//! host without an MCU attached.
//!
//! # Example
//!
//! ```
//! use offtime_driver::{BootContext, Config, Flashlight};
//! use offtime_driver::mock::{MockFlash, MockLed};
//!
//! let flash = MockFlash::<256, 4, 128>::new(0x00);
//! let mut light = Flashlight::new(&Config::RAMPING, MockLed::new(), flash, 0, 128, BootContext::cold()).unwrap();
//! let boot = light.boot();
//! assert_eq!(boot.mode, 0);
//! assert_eq!(light.led().level(), 0xFF);
//! ```

use embedded_hal::pwm::{ErrorType as PwmErrorType, SetDutyCycle};
use embedded_hal_async::delay::DelayNs;
use embedded_storage::nor_flash::{
    ErrorType as FlashErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash, check_erase,
    check_read, check_write,
};
use heapless::Vec;

/// Number of levels [`MockLed`] remembers.
pub const LED_HISTORY: usize = 1024;

/// PWM channel that records every level written to it.
#[derive(Debug, Default)]
pub struct MockLed {
    level: u8,
    history: Vec<u8, LED_HISTORY>,
}

impl MockLed {
    /// Creates a dark LED with empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Level currently applied.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Levels written so far, oldest first.
    ///
    /// Writes beyond [`LED_HISTORY`] still change [`level`](Self::level)
    /// but are not recorded.
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    /// Forgets the recorded history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl PwmErrorType for MockLed {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for MockLed {
    fn max_duty_cycle(&self) -> u16 {
        u8::MAX as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.level = duty.min(u8::MAX as u16) as u8;
        let _ = self.history.push(self.level);
        Ok(())
    }
}

/// RAM-backed NOR flash.
///
/// `SIZE` is the capacity, `WRITE` the program granularity and `ERASE`
/// the page size. Programming a byte that is not erased fails, like the
/// real part does.
#[derive(Debug)]
pub struct MockFlash<const SIZE: usize, const WRITE: usize, const ERASE: usize> {
    data: [u8; SIZE],
    erased: u8,
    /// Number of page erases performed.
    pub erases: u32,
    /// Number of write calls performed.
    pub writes: u32,
    /// When set, every write fails.
    pub fail_writes: bool,
    /// When set, every read fails.
    pub fail_reads: bool,
}

impl<const SIZE: usize, const WRITE: usize, const ERASE: usize> MockFlash<SIZE, WRITE, ERASE> {
    /// Creates a fully erased flash. `erased` is the value an erased byte
    /// reads as (0x00 on STM32L0, 0xFF on most other parts).
    pub fn new(erased: u8) -> Self {
        Self {
            data: [erased; SIZE],
            erased,
            erases: 0,
            writes: 0,
            fail_writes: false,
            fail_reads: false,
        }
    }

    /// Raw contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Raw contents, for corrupting records in tests.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const SIZE: usize, const WRITE: usize, const ERASE: usize> FlashErrorType
    for MockFlash<SIZE, WRITE, ERASE>
{
    type Error = NorFlashErrorKind;
}

impl<const SIZE: usize, const WRITE: usize, const ERASE: usize> ReadNorFlash
    for MockFlash<SIZE, WRITE, ERASE>
{
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_reads {
            return Err(NorFlashErrorKind::Other);
        }
        check_read(self, offset, bytes.len())?;
        let start = offset as usize;
        bytes.copy_from_slice(&self.data[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        SIZE
    }
}

impl<const SIZE: usize, const WRITE: usize, const ERASE: usize> NorFlash
    for MockFlash<SIZE, WRITE, ERASE>
{
    const WRITE_SIZE: usize = WRITE;
    const ERASE_SIZE: usize = ERASE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to)?;
        self.data[from as usize..to as usize].fill(self.erased);
        self.erases += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(NorFlashErrorKind::Other);
        }
        check_write(self, offset, bytes.len())?;
        let target = &mut self.data[offset as usize..offset as usize + bytes.len()];
        if target.iter().any(|&b| b != self.erased) {
            return Err(NorFlashErrorKind::Other);
        }
        target.copy_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }
}

/// Delay that only counts the time it was asked to wait.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total requested delay in milliseconds.
    pub elapsed_ms: u64,
    /// Number of delay calls.
    pub calls: u32,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ms += (ns / 1_000_000) as u64;
        self.calls += 1;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ms += ms as u64;
        self.calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_records_levels() {
        let mut led = MockLed::new();
        led.set_duty_cycle_fraction(0x40, 255).unwrap();
        led.set_duty_cycle_fully_on().unwrap();
        assert_eq!(led.history(), &[0x40, 0xFF]);
        assert_eq!(led.level(), 0xFF);
    }

    #[test]
    fn flash_refuses_overwrite() {
        let mut flash = MockFlash::<64, 4, 32>::new(0x00);
        flash.write(0, &[1, 2, 3, 4]).unwrap();
        assert!(flash.write(0, &[5, 6, 7, 8]).is_err());
        flash.erase(0, 32).unwrap();
        flash.write(0, &[5, 6, 7, 8]).unwrap();
        assert_eq!(&flash.data()[..4], &[5, 6, 7, 8]);
    }

    #[test]
    fn flash_checks_alignment() {
        let mut flash = MockFlash::<64, 4, 32>::new(0xFF);
        assert_eq!(flash.write(2, &[0; 4]), Err(NorFlashErrorKind::NotAligned));
        assert_eq!(flash.erase(0, 16), Err(NorFlashErrorKind::NotAligned));
    }
}

//! Mode index persistence on NOR flash.
//!
//! Flash cannot rewrite a byte in place and wears out with every erase, so
//! the store never updates a record. Each save appends a small record to
//! the next blank slot of its region; the region is erased only once every
//! slot has been used.
//!
//! # Record Layout
//!
//! ```text
//! +--------+------+-------+--------+ - - - - - - - +
//! | 0x5A   | mode | !mode | 0xC3   | 0xC3 padding  |
//! +--------+------+-------+--------+ - - - - - - - +
//!   marker                  tail     up to WRITE_SIZE
//! ```
//!
//! A slot whose bytes are all identical is blank (erased flash reads as all
//! 0x00 or all 0xFF depending on the part). Anything else that fails the
//! checks is a torn write and is skipped.

use embedded_storage::nor_flash::NorFlash;

const RECORD_MARKER: u8 = 0x5A;
const RECORD_TAIL: u8 = 0xC3;
const RECORD_LEN: usize = 4;

/// Largest slot the store can buffer.
const MAX_SLOT: usize = 16;

/// Mode store failures.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError<E: core::fmt::Debug> {
    /// The underlying flash reported an error.
    #[error("flash access failed: {0:?}")]
    Flash(E),
    /// The region does not start and end on erase boundaries.
    #[error("store region is not aligned to the flash erase size")]
    Misaligned,
    /// The flash read or write granularity does not fit a record slot.
    #[error("flash geometry does not fit a record slot")]
    UnsupportedGeometry,
}

/// Appending mode store over an erase-aligned flash region.
pub struct ModeStore<F> {
    flash: F,
    start: u32,
    len: u32,
    /// Last valid record, once scanned
    current: Option<u8>,
    /// First blank slot, `None` until the region has been scanned
    next_slot: Option<u32>,
}

impl<F: NorFlash> ModeStore<F> {
    /// Creates a store over `len` bytes of flash starting at `start`.
    ///
    /// Both must be multiples of the flash erase size.
    pub fn new(flash: F, start: u32, len: u32) -> Result<Self, StoreError<F::Error>> {
        let erase = F::ERASE_SIZE as u32;
        if len == 0 || start % erase != 0 || len % erase != 0 {
            return Err(StoreError::Misaligned);
        }

        let slot = Self::slot_size();
        if slot > MAX_SLOT || slot % F::READ_SIZE != 0 || slot as u32 > len {
            return Err(StoreError::UnsupportedGeometry);
        }

        Ok(Self {
            flash,
            start,
            len,
            current: None,
            next_slot: None,
        })
    }

    /// Bytes occupied by one record, rounded up to the write granularity.
    pub fn slot_size() -> usize {
        RECORD_LEN.div_ceil(F::WRITE_SIZE) * F::WRITE_SIZE
    }

    fn slot_count(&self) -> u32 {
        self.len / Self::slot_size() as u32
    }

    fn slot_offset(&self, slot: u32) -> u32 {
        self.start + slot * Self::slot_size() as u32
    }

    /// Reads the most recently saved mode.
    ///
    /// Returns `None` when nothing has been saved yet.
    pub fn load(&mut self) -> Result<Option<u8>, StoreError<F::Error>> {
        let slot_len = Self::slot_size();
        let mut buf = [0u8; MAX_SLOT];
        let mut current = None;
        let mut next_slot = self.slot_count();

        for slot in 0..self.slot_count() {
            let bytes = &mut buf[..slot_len];
            self.flash
                .read(self.slot_offset(slot), bytes)
                .map_err(StoreError::Flash)?;

            if is_blank(bytes) {
                next_slot = slot;
                break;
            }
            if let Some(mode) = decode(bytes) {
                current = Some(mode);
            }
        }

        self.current = current;
        self.next_slot = Some(next_slot);
        Ok(current)
    }

    /// Persists `mode`.
    ///
    /// Saving the value already stored is a no-op, so a boot that does
    /// not change the mode costs no flash wear.
    pub fn save(&mut self, mode: u8) -> Result<(), StoreError<F::Error>> {
        let mut next_slot = match self.next_slot {
            Some(slot) => slot,
            None => {
                self.load()?;
                self.next_slot.unwrap_or(0)
            }
        };

        if self.current == Some(mode) {
            return Ok(());
        }

        if next_slot >= self.slot_count() {
            self.flash
                .erase(self.start, self.start + self.len)
                .map_err(StoreError::Flash)?;
            next_slot = 0;
        }

        let mut buf = [RECORD_TAIL; MAX_SLOT];
        buf[..RECORD_LEN].copy_from_slice(&encode(mode));
        let offset = self.slot_offset(next_slot);

        // The slot is consumed even if programming fails halfway.
        self.next_slot = Some(next_slot + 1);
        self.flash
            .write(offset, &buf[..Self::slot_size()])
            .map_err(StoreError::Flash)?;
        self.current = Some(mode);
        Ok(())
    }

    /// Borrows the underlying flash.
    pub fn flash(&self) -> &F {
        &self.flash
    }

    /// Releases the underlying flash.
    pub fn into_inner(self) -> F {
        self.flash
    }
}

fn encode(mode: u8) -> [u8; RECORD_LEN] {
    [RECORD_MARKER, mode, !mode, RECORD_TAIL]
}

fn decode(slot: &[u8]) -> Option<u8> {
    match slot {
        [RECORD_MARKER, mode, check, RECORD_TAIL, ..] if *check == !*mode => Some(*mode),
        _ => None,
    }
}

fn is_blank(slot: &[u8]) -> bool {
    slot.iter().all(|&b| b == slot[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFlash;
    use embedded_storage::nor_flash::NorFlashErrorKind;

    type L0Flash = MockFlash<256, 4, 128>;

    #[test]
    fn blank_store_loads_nothing() {
        let mut store = ModeStore::new(L0Flash::new(0x00), 128, 128).unwrap();
        assert_eq!(store.load(), Ok(None));

        let mut store = ModeStore::new(MockFlash::<256, 1, 64>::new(0xFF), 0, 64).unwrap();
        assert_eq!(store.load(), Ok(None));
    }

    #[test]
    fn save_then_load() {
        let mut store = ModeStore::new(L0Flash::new(0x00), 0, 128).unwrap();
        store.save(3).unwrap();
        store.save(4).unwrap();

        let mut reopened = ModeStore::new(store.into_inner(), 0, 128).unwrap();
        assert_eq!(reopened.load(), Ok(Some(4)));
    }

    #[test]
    fn unchanged_mode_is_not_rewritten() {
        let mut store = ModeStore::new(L0Flash::new(0x00), 0, 128).unwrap();
        store.save(2).unwrap();
        store.save(2).unwrap();
        assert_eq!(store.flash().writes, 1);
    }

    #[test]
    fn full_region_is_erased_once() {
        let mut store = ModeStore::new(L0Flash::new(0x00), 0, 128).unwrap();
        // 32 four-byte slots per page
        for i in 0..32u8 {
            store.save(i % 6).unwrap();
        }
        assert_eq!(store.flash().erases, 0);

        store.save(5).unwrap();
        assert_eq!(store.flash().erases, 1);
        assert_eq!(store.load(), Ok(Some(5)));
    }

    #[test]
    fn wide_write_size_pads_records() {
        let mut store = ModeStore::new(MockFlash::<128, 8, 64>::new(0xFF), 64, 64).unwrap();
        assert_eq!(ModeStore::<MockFlash<128, 8, 64>>::slot_size(), 8);
        store.save(1).unwrap();
        assert_eq!(
            &store.flash().data()[64..72],
            &[0x5A, 1, 0xFE, 0xC3, 0xC3, 0xC3, 0xC3, 0xC3]
        );
    }

    #[test]
    fn torn_record_is_skipped() {
        let mut store = ModeStore::new(L0Flash::new(0x00), 0, 128).unwrap();
        store.save(1).unwrap();
        store.save(2).unwrap();

        let mut flash = store.into_inner();
        flash.data_mut()[5] = 0x77; // corrupt the second record's mode byte

        let mut store = ModeStore::new(flash, 0, 128).unwrap();
        assert_eq!(store.load(), Ok(Some(1)));
        store.save(3).unwrap();
        assert_eq!(store.load(), Ok(Some(3)));
    }

    #[test]
    fn misaligned_region_is_rejected() {
        assert!(matches!(
            ModeStore::new(L0Flash::new(0x00), 4, 128),
            Err(StoreError::Misaligned)
        ));
        assert!(matches!(
            ModeStore::new(L0Flash::new(0x00), 0, 0),
            Err(StoreError::Misaligned)
        ));
        assert!(matches!(
            ModeStore::new(MockFlash::<64, 32, 32>::new(0x00), 0, 32),
            Err(StoreError::UnsupportedGeometry)
        ));
    }

    #[test]
    fn flash_errors_surface() {
        let mut flash = L0Flash::new(0x00);
        flash.fail_writes = true;
        let mut store = ModeStore::new(flash, 0, 128).unwrap();
        assert_eq!(
            store.save(1),
            Err(StoreError::Flash(NorFlashErrorKind::Other))
        );
    }
}

//! Interrupt-safe key hand-off between the keypad scanner and the app

use portable_atomic::{AtomicU16, AtomicU32, Ordering};
use crate::types::Key;

const EMPTY: u16 = 0;
const PRESENT: u16 = 0x100;

/// Single-slot keypad mailbox.
///
/// The keypad interrupt stores the latest key; the foreground loop takes
/// it. A key not yet taken is overwritten by the next one, matching a
/// scanner that only reports the most recent event.
pub struct KeypadInput {
    slot: AtomicU16,
    overwritten: AtomicU32,
}

impl KeypadInput {
    /// Create an empty mailbox
    pub const fn new() -> Self {
        Self {
            slot: AtomicU16::new(EMPTY),
            overwritten: AtomicU32::new(0),
        }
    }

    /// Post a key (called from interrupt handler).
    ///
    /// Out-of-range digits have no keypad code and are dropped.
    pub fn press(&self, key: Key) {
        if !key.is_valid() {
            return;
        }
        let previous = self.slot.swap(PRESENT | key.to_ascii() as u16, Ordering::AcqRel);
        if previous & PRESENT != 0 {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Post a raw scan code
    pub fn press_code(&self, code: u8) {
        self.press(Key::from_ascii(code));
    }

    /// Take the pending key, leaving the slot empty
    pub fn take(&self) -> Option<Key> {
        let value = self.slot.swap(EMPTY, Ordering::AcqRel);
        Self::decode(value)
    }

    /// Look at the pending key without consuming it
    pub fn peek(&self) -> Option<Key> {
        Self::decode(self.slot.load(Ordering::Acquire))
    }

    pub fn is_pending(&self) -> bool {
        self.slot.load(Ordering::Acquire) & PRESENT != 0
    }

    /// Keys lost because the foreground was too slow
    pub fn overwritten(&self) -> u32 {
        self.overwritten.load(Ordering::Relaxed)
    }

    fn decode(value: u16) -> Option<Key> {
        if value & PRESENT == 0 {
            None
        } else {
            Some(Key::from_ascii(value as u8))
        }
    }

    /// Reset the mailbox (for testing)
    #[cfg(feature = "test-utils")]
    pub fn reset(&self) {
        self.slot.store(EMPTY, Ordering::Relaxed);
        self.overwritten.store(0, Ordering::Relaxed);
    }
}

impl Default for KeypadInput {
    fn default() -> Self {
        Self::new()
    }
}

#![forbid(unsafe_code)]

//! Lock-free held-key bit set.
//!
//! One bit per logical key id, shared between the driver thread (the sole
//! writer) and any number of reader threads. All accesses are relaxed: key
//! events never arrive closer together than about 1 ms, release delays are
//! 50–150 ms, and a stale read is corrected within one poll cycle, so
//! stronger orderings buy nothing here.
//!
//! Invariant (maintained by the scheduler): a bit is set exactly while a
//! pending release exists for that key.

use std::array;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::key::Key;

const WORDS: usize = 4;

/// Fixed 256-bit set indexed by [`Key::code`].
#[derive(Debug)]
pub struct HeldKeys {
    words: [AtomicU64; WORDS],
}

impl HeldKeys {
    #[must_use]
    pub fn new() -> Self {
        Self {
            words: array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn set(&self, key: Key) {
        let (word, bit) = Self::slot(key);
        self.words[word].fetch_or(1 << bit, Ordering::Relaxed);
    }

    pub fn clear(&self, key: Key) {
        let (word, bit) = Self::slot(key);
        self.words[word].fetch_and(!(1 << bit), Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_held(&self, key: Key) -> bool {
        let (word, bit) = Self::slot(key);
        self.words[word].load(Ordering::Relaxed) & (1 << bit) != 0
    }

    fn slot(key: Key) -> (usize, u32) {
        let code = usize::from(key.code());
        (code >> 6, (code & 63) as u32)
    }
}

impl Default for HeldKeys {
    fn default() -> Self {
        Self::new()
    }
}

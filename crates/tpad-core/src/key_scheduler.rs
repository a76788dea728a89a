#![forbid(unsafe_code)]

//! Key-state scheduling: synthesizes hold and release semantics from a
//! protocol that only ever reports presses.
//!
//! Terminals deliver auto-repeat as a stream of identical press sequences.
//! The scheduler turns the first press into `key_down`, keeps the key held
//! while repeats keep arriving, and emits `key_up` once a scheduled release
//! deadline lapses with no repeat to extend it. Arrows get a longer release
//! window than plain keys so held movement stays smooth across the
//! terminal's 30–50 ms repeat cadence.
//!
//! CSI presses additionally detect a fresh distinct press of an
//! already-held key: when the scheduled release is still further away than
//! the fresh-press threshold, the repeat stream evidently stopped and a
//! human tapped the key again, so the stale hold is released immediately
//! and the press starts over. This keeps single-step menu navigation
//! responsive.
//!
//! The pending-release table is a bounded array owned by the driver thread;
//! the only shared state it touches is the held-key bit set.

use std::sync::Arc;
use std::time::Duration;

use web_time::Instant;

use crate::config::InputConfig;
use crate::held_keys::HeldKeys;
use crate::key::{Key, MODIFIER_KEYS, Modifiers};
use crate::sink::InputSink;

/// Pending-release capacity. A full table silently drops new schedules.
pub const MAX_PENDING_RELEASES: usize = 16;

#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    key: Key,
    deadline: Instant,
}

/// Bounded release scheduler. One instance, owned by the driver thread.
#[derive(Debug)]
pub struct KeyScheduler {
    pending: [Option<PendingRelease>; MAX_PENDING_RELEASES],
    len: usize,
    held: Arc<HeldKeys>,
    standard_release: Duration,
    arrow_release: Duration,
    fresh_press_threshold: Duration,
}

impl KeyScheduler {
    #[must_use]
    pub fn new(held: Arc<HeldKeys>, config: &InputConfig) -> Self {
        Self {
            pending: [None; MAX_PENDING_RELEASES],
            len: 0,
            held,
            standard_release: config.standard_release,
            arrow_release: config.arrow_release,
            fresh_press_threshold: config.fresh_press_threshold,
        }
    }

    /// Press from a plain byte, normalized through [`Key::from_ascii`].
    pub fn press_ascii(&mut self, byte: u8, now: Instant, sink: &mut impl InputSink) {
        self.press_plain(Key::from_ascii(byte), now, sink);
    }

    /// Press with the standard release delay (SS3 function keys and
    /// synthesized mouse buttons).
    pub fn press_plain(&mut self, key: Key, now: Instant, sink: &mut impl InputSink) {
        if !self.held.is_held(key) {
            sink.key_down(key);
        }
        self.schedule_release(key, self.standard_release, now);
    }

    /// Press from a CSI key sequence: fresh-press detection plus modifier
    /// synthesis.
    pub fn press_csi(
        &mut self,
        key: Key,
        modifiers: Modifiers,
        now: Instant,
        sink: &mut impl InputSink,
    ) {
        let delay = if key.is_arrow() {
            self.arrow_release
        } else {
            self.standard_release
        };

        let already_held = self.held.is_held(key);
        let mut is_new_press = false;

        if already_held {
            if let Some(remaining) = self.remaining(key, now) {
                if remaining > self.fresh_press_threshold {
                    // The repeat stream stopped and a distinct press
                    // started: release the stale hold and start over.
                    sink.key_up(key);
                    self.held.clear(key);
                    self.remove(key);
                    is_new_press = true;
                }
            }
        }

        if !already_held || is_new_press {
            for (flag, modifier_key) in MODIFIER_KEYS {
                if modifiers.contains(flag) {
                    sink.key_down(modifier_key);
                }
            }
            sink.key_down(key);
        }

        self.schedule_release(key, delay, now);

        if !already_held || is_new_press {
            for (flag, modifier_key) in MODIFIER_KEYS {
                if modifiers.contains(flag) {
                    self.schedule_release(modifier_key, delay, now);
                }
            }
        }
    }

    /// Fire `key_up` for every schedule whose deadline has passed.
    ///
    /// Walks in reverse insertion order so removal never skips an entry.
    pub fn sweep(&mut self, now: Instant, sink: &mut impl InputSink) {
        let mut index = self.len;
        while index > 0 {
            index -= 1;
            if let Some(entry) = self.pending[index] {
                if now >= entry.deadline {
                    sink.key_up(entry.key);
                    self.held.clear(entry.key);
                    self.remove_at(index);
                }
            }
        }
    }

    /// Release everything immediately. Called once at shutdown so the sink
    /// never sees an unbalanced `key_down`.
    pub fn drain(&mut self, sink: &mut impl InputSink) {
        while self.len > 0 {
            if let Some(entry) = self.pending[self.len - 1] {
                sink.key_up(entry.key);
                self.held.clear(entry.key);
            }
            self.remove_at(self.len - 1);
        }
    }

    /// Schedule (or extend) a release `delay` from `now`. Sets the held bit
    /// only when a new entry is created, keeping bit and entry in lockstep.
    fn schedule_release(&mut self, key: Key, delay: Duration, now: Instant) {
        let deadline = now + delay;
        for slot in self.pending[..self.len].iter_mut().flatten() {
            if slot.key == key {
                slot.deadline = deadline;
                return;
            }
        }
        if self.len == MAX_PENDING_RELEASES {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = key.code(), "pending-release table full, schedule dropped");
            return;
        }
        self.pending[self.len] = Some(PendingRelease { key, deadline });
        self.len += 1;
        self.held.set(key);
    }

    fn remaining(&self, key: Key, now: Instant) -> Option<Duration> {
        self.pending[..self.len]
            .iter()
            .flatten()
            .find(|entry| entry.key == key)
            .map(|entry| entry.deadline.saturating_duration_since(now))
    }

    fn remove(&mut self, key: Key) {
        if let Some(index) = self.pending[..self.len]
            .iter()
            .position(|slot| slot.is_some_and(|entry| entry.key == key))
        {
            self.remove_at(index);
        }
    }

    fn remove_at(&mut self, index: usize) {
        if index >= self.len {
            return;
        }
        self.pending[index] = None;
        for i in index..self.len - 1 {
            self.pending[i] = self.pending[i + 1].take();
        }
        self.len -= 1;
    }
}

#![forbid(unsafe_code)]

//! Mouse report translation: SGR cell coordinates in, relative deltas and
//! synthesized button keys out.
//!
//! The terminal reports absolute cell positions; callers want turn-style
//! deltas. The tracker anchors on the first report, then emits the scaled
//! difference from the anchor on every later one. Wheel reports carry no
//! useful position and are dropped before they can disturb the anchor.
//!
//! Buttons become keys: left fires, right interacts, middle runs. Presses
//! go through the scheduler's plain-press path so a held button behaves
//! exactly like a held key, and a latch per button keeps terminal motion
//! reports (which re-state the pressed button) from re-triggering the
//! press.

use web_time::Instant;

use crate::config::InputConfig;
use crate::key::Key;
use crate::key_scheduler::KeyScheduler;
use crate::sink::InputSink;

const BUTTON_BITS: u32 = 0x3;
const MOTION_BIT: u32 = 0x20;
const WHEEL_BIT: u32 = 0x40;

/// SGR mouse state. One instance, owned by the driver thread.
#[derive(Debug)]
pub struct MouseTracker {
    last_col: u32,
    last_row: u32,
    tracking: bool,
    buttons: [bool; 3],
    sensitivity: i32,
    max_delta: i32,
}

impl MouseTracker {
    #[must_use]
    pub fn new(config: &InputConfig) -> Self {
        Self {
            last_col: 0,
            last_row: 0,
            tracking: false,
            buttons: [false; 3],
            sensitivity: config.mouse_sensitivity,
            max_delta: config.mouse_max_delta,
        }
    }

    /// Handle one decoded SGR report.
    pub fn report(
        &mut self,
        button: u32,
        col: u32,
        row: u32,
        press: bool,
        scheduler: &mut KeyScheduler,
        now: Instant,
        sink: &mut impl InputSink,
    ) {
        if button & WHEEL_BIT != 0 {
            return;
        }

        if !self.tracking {
            // First report establishes the anchor; its button still counts.
            self.last_col = col;
            self.last_row = row;
            self.tracking = true;
        } else {
            let dx = self.scaled_delta(col, self.last_col);
            let dy = self.scaled_delta(row, self.last_row);
            if dx != 0 || dy != 0 {
                sink.mouse_move(dx, dy);
                self.last_col = col;
                self.last_row = row;
            }
        }

        if button & MOTION_BIT != 0 {
            return;
        }

        let id = (button & BUTTON_BITS) as usize;
        if id >= self.buttons.len() {
            return;
        }
        if press {
            if !self.buttons[id] {
                self.buttons[id] = true;
                scheduler.press_plain(Self::button_key(id), now, sink);
            }
        } else {
            self.buttons[id] = false;
        }
    }

    fn button_key(id: usize) -> Key {
        match id {
            0 => Key::FIRE,
            1 => Key::RUN,
            _ => Key::USE,
        }
    }

    /// Anchor-relative delta, clamped per report then scaled.
    fn scaled_delta(&self, current: u32, last: u32) -> i32 {
        let raw = i64::from(current) - i64::from(last);
        let clamped = raw.clamp(-i64::from(self.max_delta), i64::from(self.max_delta)) as i32;
        clamped.saturating_mul(self.sensitivity)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::held_keys::HeldKeys;
    use crate::test_support::{Recorded, Recorder};

    fn fixture() -> (MouseTracker, KeyScheduler) {
        let config = InputConfig::default();
        let held = Arc::new(HeldKeys::new());
        (MouseTracker::new(&config), KeyScheduler::new(held, &config))
    }

    #[test]
    fn first_report_primes_anchor_but_button_lands() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        mouse.report(0, 10, 10, true, &mut scheduler, now, &mut sink);
        assert_eq!(sink.events, vec![Recorded::Down(Key::FIRE)]);

        mouse.report(0, 10, 10, false, &mut scheduler, now, &mut sink);
        assert_eq!(sink.events.len(), 1);

        scheduler.sweep(now + std::time::Duration::from_millis(60), &mut sink);
        assert_eq!(sink.events[1], Recorded::Up(Key::FIRE));
    }

    #[test]
    fn deltas_are_scaled_and_clamped() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        mouse.report(MOTION_BIT, 10, 10, false, &mut scheduler, now, &mut sink);
        mouse.report(MOTION_BIT, 15, 12, false, &mut scheduler, now, &mut sink);
        assert_eq!(sink.events, vec![Recorded::Move(50, 20)]);

        // A jump beyond 100 cells clamps before scaling.
        mouse.report(MOTION_BIT, 215, 12, false, &mut scheduler, now, &mut sink);
        assert_eq!(sink.events[1], Recorded::Move(1000, 0));
    }

    #[test]
    fn zero_delta_emits_nothing() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        mouse.report(MOTION_BIT, 40, 12, false, &mut scheduler, now, &mut sink);
        mouse.report(MOTION_BIT, 40, 12, false, &mut scheduler, now, &mut sink);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn wheel_reports_are_dropped() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        // A wheel report before any other must not establish the anchor.
        mouse.report(WHEEL_BIT, 90, 50, true, &mut scheduler, now, &mut sink);
        mouse.report(MOTION_BIT, 10, 10, false, &mut scheduler, now, &mut sink);
        mouse.report(MOTION_BIT, 11, 10, false, &mut scheduler, now, &mut sink);
        assert_eq!(sink.events, vec![Recorded::Move(10, 0)]);
    }

    #[test]
    fn held_button_does_not_retrigger() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        mouse.report(0, 5, 5, true, &mut scheduler, now, &mut sink);
        mouse.report(0, 5, 5, true, &mut scheduler, now, &mut sink);
        assert_eq!(sink.downs(), vec![Key::FIRE]);

        mouse.report(0, 5, 5, false, &mut scheduler, now, &mut sink);
        scheduler.sweep(now + std::time::Duration::from_millis(60), &mut sink);
        mouse.report(0, 5, 5, true, &mut scheduler, now, &mut sink);
        assert_eq!(sink.downs(), vec![Key::FIRE, Key::FIRE]);
    }

    #[test]
    fn middle_runs_and_right_interacts() {
        let (mut mouse, mut scheduler) = fixture();
        let mut sink = Recorder::new();
        let now = Instant::now();

        mouse.report(1, 5, 5, true, &mut scheduler, now, &mut sink);
        mouse.report(2, 5, 5, true, &mut scheduler, now, &mut sink);
        assert_eq!(sink.downs(), vec![Key::RUN, Key::USE]);

        // Ids past the three tracked buttons are ignored.
        mouse.report(3, 5, 5, true, &mut scheduler, now, &mut sink);
        assert_eq!(sink.downs().len(), 2);
    }
}

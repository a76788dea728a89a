#![no_main]

use std::sync::Arc;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tpad_core::config::InputConfig;
use tpad_core::held_keys::HeldKeys;
use tpad_core::key::{Key, Modifiers};
use tpad_core::key_scheduler::KeyScheduler;
use tpad_core::mouse::MouseTracker;
use tpad_core::sink::InputSink;
use web_time::Instant;

#[derive(Debug, Arbitrary)]
enum Op {
    PressAscii(u8),
    PressCsi { key_code: u8, modifier_param: u32 },
    Mouse { button: u32, col: u32, row: u32, press: bool },
    Advance(u16),
}

#[derive(Default)]
struct Balance {
    downs: u64,
    ups: u64,
}

impl InputSink for Balance {
    fn key_down(&mut self, _key: Key) {
        self.downs += 1;
    }

    fn key_up(&mut self, _key: Key) {
        self.ups += 1;
    }

    fn mouse_move(&mut self, _dx: i32, _dy: i32) {}
}

fuzz_target!(|ops: Vec<Op>| {
    let config = InputConfig::default();
    let held = Arc::new(HeldKeys::new());
    let mut scheduler = KeyScheduler::new(Arc::clone(&held), &config);
    let mut mouse = MouseTracker::new(&config);
    let mut sink = Balance::default();
    let base = Instant::now();
    let mut elapsed = Duration::ZERO;

    for op in ops {
        let now = base + elapsed;
        scheduler.sweep(now, &mut sink);
        match op {
            Op::PressAscii(byte) => scheduler.press_ascii(byte, now, &mut sink),
            Op::PressCsi {
                key_code,
                modifier_param,
            } => scheduler.press_csi(
                Key::new(key_code),
                Modifiers::from_xterm_param(modifier_param),
                now,
                &mut sink,
            ),
            Op::Mouse {
                button,
                col,
                row,
                press,
            } => mouse.report(button, col, row, press, &mut scheduler, now, &mut sink),
            Op::Advance(ms) => elapsed += Duration::from_millis(u64::from(ms)),
        }
    }

    scheduler.drain(&mut sink);

    // A key_up always has a matching key_down. Equality is not guaranteed:
    // presses past the pending-release capacity emit a down whose schedule
    // is dropped.
    assert!(sink.ups <= sink.downs, "more key_ups than key_downs");
    // Drain leaves no held bits behind.
    for code in 0..=255u8 {
        assert!(!held.is_held(Key::new(code)), "key {code} still held after drain");
    }
});

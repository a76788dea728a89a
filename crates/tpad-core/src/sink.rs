#![forbid(unsafe_code)]

//! Boundary trait between the input driver and its consumer.

use crate::key::Key;

/// Receives decoded input events.
///
/// Every call happens on the driver thread between 1 ms polls, so
/// implementations must not block.
pub trait InputSink {
    fn key_down(&mut self, key: Key);
    fn key_up(&mut self, key: Key);
    /// Relative pointer motion, already clamped and scaled.
    fn mouse_move(&mut self, dx: i32, dy: i32);
}

impl<S: InputSink + ?Sized> InputSink for &mut S {
    fn key_down(&mut self, key: Key) {
        (**self).key_down(key);
    }

    fn key_up(&mut self, key: Key) {
        (**self).key_up(key);
    }

    fn mouse_move(&mut self, dx: i32, dy: i32) {
        (**self).mouse_move(dx, dy);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl InputSink for NullSink {
    fn key_down(&mut self, _key: Key) {}

    fn key_up(&mut self, _key: Key) {}

    fn mouse_move(&mut self, _dx: i32, _dy: i32) {}
}

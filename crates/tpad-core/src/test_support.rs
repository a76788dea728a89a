//! Shared fixtures for in-module tests.

use std::sync::{Arc, Mutex};

use crate::key::Key;
use crate::sink::InputSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Recorded {
    Down(Key),
    Up(Key),
    Move(i32, i32),
}

/// Records every sink call in arrival order.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub events: Vec<Recorded>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downs(&self) -> Vec<Key> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Down(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    pub fn ups(&self) -> Vec<Key> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Recorded::Up(key) => Some(*key),
                _ => None,
            })
            .collect()
    }
}

impl InputSink for Recorder {
    fn key_down(&mut self, key: Key) {
        self.events.push(Recorded::Down(key));
    }

    fn key_up(&mut self, key: Key) {
        self.events.push(Recorded::Up(key));
    }

    fn mouse_move(&mut self, dx: i32, dy: i32) {
        self.events.push(Recorded::Move(dx, dy));
    }
}

/// Recorder that can cross a thread boundary, for driver tests.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedRecorder {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl SharedRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }
}

impl InputSink for SharedRecorder {
    fn key_down(&mut self, key: Key) {
        self.events.lock().unwrap().push(Recorded::Down(key));
    }

    fn key_up(&mut self, key: Key) {
        self.events.lock().unwrap().push(Recorded::Up(key));
    }

    fn mouse_move(&mut self, dx: i32, dy: i32) {
        self.events.lock().unwrap().push(Recorded::Move(dx, dy));
    }
}

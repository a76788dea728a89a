#![forbid(unsafe_code)]

//! Diagnostics for the termpad input stack, run against a live terminal.
//!
//! `probe` reports what the terminal answered to the standard queries;
//! `events` echoes decoded input until quit. Both are the quickest way to
//! see what a given terminal emulator actually sends and answers.

pub mod cli;
pub mod error;
pub mod events;
pub mod probe;

pub use cli::run_from_env;
pub use error::{InspectError, Result};

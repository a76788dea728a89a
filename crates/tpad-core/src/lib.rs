#![forbid(unsafe_code)]

//! Core: terminal input decoding, key-state scheduling, and query
//! multiplexing.
//!
//! # Role in termpad
//! `tpad-core` is the pipeline between a raw terminal byte stream and a
//! fixed-rate simulation: it decodes escape sequences into logical key and
//! mouse events, synthesizes hold/release state from a protocol that only
//! ever reports presses, and services synchronous terminal queries that
//! share the same input stream as the events.
//!
//! # Primary responsibilities
//! - **[`decoder::SequenceDecoder`]**: byte-at-a-time Ground/Esc/SS3/CSI
//!   state machine over the sequence subset this project needs.
//! - **[`key_scheduler::KeyScheduler`]**: timed release scheduling, repeat
//!   coalescing, and fresh-press detection.
//! - **[`mouse::MouseTracker`]**: SGR reports to clamped relative deltas and
//!   synthesized button keys.
//! - **[`query::QueryChannel`]**: blocking rendezvous for device-attributes,
//!   screen-size, and screen-cells queries.
//! - **[`driver::Input`]**: the dedicated driver thread plus its RAII
//!   handle.
//!
//! # How it fits in the system
//! `tpad-tty` supplies the Unix byte source and raw-mode session;
//! `tpad-inspect` is the diagnostic front end. The simulation consumes
//! [`sink::InputSink`] calls. Nothing here touches platform I/O beyond
//! writing query requests to a caller-provided writer.

pub mod config;
pub mod decoder;
pub mod driver;
pub mod held_keys;
pub mod key;
pub mod key_scheduler;
pub mod logging;
pub mod mouse;
pub mod query;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};

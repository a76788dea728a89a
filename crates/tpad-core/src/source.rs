#![forbid(unsafe_code)]

//! Byte-source boundary trait.

use std::io;
use std::time::Duration;

/// Yields raw terminal bytes one at a time.
///
/// `tpad-tty` implements this over poll(2) on the terminal descriptor; tests
/// implement it over scripted buffers.
pub trait ByteSource {
    /// Return the next byte, or `None` if nothing arrived within `timeout`.
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>>;
}

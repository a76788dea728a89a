#![cfg(unix)]
#![forbid(unsafe_code)]

//! Unix terminal layer: raw-mode session, fd byte source, signal guard.
//!
//! `tpad-core` is platform-agnostic; everything that actually touches a
//! Unix terminal lives here.
//!
//! - [`TtySession`] switches the terminal into raw mode, hides the cursor,
//!   and enables SGR mouse tracking, undoing all of it on drop (or an
//!   explicit [`TtySession::restore`]).
//! - [`FdByteSource`] implements [`ByteSource`] over any fd with `poll(2)`
//!   timeouts; [`stdin_source`] is the common case.
//! - [`SignalGuard`] turns SIGINT/SIGTERM into a clean driver exit instead
//!   of an abrupt kill that would strand the terminal in raw mode.

use std::io::{self, Write};
use std::os::fd::AsFd;
use std::thread;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use rustix::termios::{self, OptionalActions, Termios};
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use tpad_core::driver::ExitHandle;
use tpad_core::source::ByteSource;

// ── Control sequences ────────────────────────────────────────────────────

pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";
/// Button events, any-motion tracking, SGR encoding.
pub const MOUSE_ENABLE: &[u8] = b"\x1b[?1000h\x1b[?1003h\x1b[?1006h";
/// Disable in reverse order of enable.
pub const MOUSE_DISABLE: &[u8] = b"\x1b[?1006l\x1b[?1003l\x1b[?1000l";

// ── Raw-mode session ─────────────────────────────────────────────────────

/// RAII terminal session: raw mode on stdin, hidden cursor, SGR mouse
/// tracking on stdout.
///
/// Restoration runs all of that backwards and additionally drains any bytes
/// still pending on stdin, so queued mouse reports do not splat onto the
/// shell prompt after exit.
pub struct TtySession {
    saved: Termios,
    cursor_hidden: bool,
    mouse_enabled: bool,
    restored: bool,
}

impl TtySession {
    /// Enter raw mode. Fails with `ENOTTY` when stdin is not a terminal.
    ///
    /// A partial setup failure still restores whatever was already applied,
    /// via drop.
    pub fn enter() -> io::Result<Self> {
        let stdin = io::stdin();
        let saved = termios::tcgetattr(stdin.as_fd())?;
        let mut raw = saved.clone();
        raw.make_raw();
        termios::tcsetattr(stdin.as_fd(), OptionalActions::Now, &raw)?;

        let mut session = Self {
            saved,
            cursor_hidden: false,
            mouse_enabled: false,
            restored: false,
        };

        let mut stdout = io::stdout().lock();
        stdout.write_all(CURSOR_HIDE)?;
        session.cursor_hidden = true;
        stdout.write_all(MOUSE_ENABLE)?;
        session.mouse_enabled = true;
        stdout.flush()?;

        #[cfg(feature = "tracing")]
        tracing::debug!("terminal session entered (raw mode, mouse tracking)");
        Ok(session)
    }

    /// Undo everything [`TtySession::enter`] did. Idempotent; drop calls it
    /// too.
    ///
    /// The saved termios comes back even when the stdout writes fail; the
    /// first error encountered is the one returned.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;

        // Raw mode is still active here, so the drain cannot block.
        drain_pending_input();

        let mut stdout = io::stdout().lock();
        let mut result = Ok(());
        if self.mouse_enabled {
            result = result.and(stdout.write_all(MOUSE_DISABLE));
        }
        if self.cursor_hidden {
            result = result.and(stdout.write_all(CURSOR_SHOW));
        }
        result = result.and(stdout.flush());

        let modes = termios::tcsetattr(io::stdin().as_fd(), OptionalActions::Now, &self.saved);

        #[cfg(feature = "tracing")]
        tracing::debug!("terminal session restored");
        result.and(modes.map_err(io::Error::from))
    }
}

impl Drop for TtySession {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Discard every byte already pending on stdin.
fn drain_pending_input() {
    let stdin = io::stdin();
    let mut buffer = [0u8; 64];
    loop {
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::ZERO) {
            Ok(n) if n > 0 => {}
            _ => return,
        }
        match rustix::io::read(stdin.as_fd(), &mut buffer) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}

// ── Byte source ──────────────────────────────────────────────────────────

/// [`ByteSource`] over any pollable fd.
#[derive(Debug)]
pub struct FdByteSource<F: AsFd> {
    fd: F,
}

impl<F: AsFd> FdByteSource<F> {
    #[must_use]
    pub fn new(fd: F) -> Self {
        Self { fd }
    }
}

impl<F: AsFd> ByteSource for FdByteSource<F> {
    fn read_byte_timeout(&mut self, timeout: Duration) -> io::Result<Option<u8>> {
        let timeout_ms: u16 = timeout.as_millis().try_into().unwrap_or(u16::MAX);
        let mut fds = [PollFd::new(self.fd.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::from(timeout_ms)) {
            Ok(0) => return Ok(None),
            Ok(_) => {}
            // A signal interrupting the poll is just an early timeout.
            Err(Errno::EINTR) => return Ok(None),
            Err(err) => return Err(io::Error::other(err)),
        }

        let mut byte = [0u8; 1];
        loop {
            match rustix::io::read(self.fd.as_fd(), &mut byte) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "input stream closed",
                    ));
                }
                Ok(_) => return Ok(Some(byte[0])),
                Err(rustix::io::Errno::INTR) => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Byte source over stdin, the pairing for [`TtySession`].
#[must_use]
pub fn stdin_source() -> FdByteSource<io::Stdin> {
    FdByteSource::new(io::stdin())
}

// ── Signal guard ─────────────────────────────────────────────────────────

/// Routes SIGINT/SIGTERM to [`ExitHandle::request_exit`] so the main loop
/// unwinds normally and [`TtySession`] drops cleanly.
#[derive(Debug)]
pub struct SignalGuard {
    handle: Handle,
    thread: Option<thread::JoinHandle<()>>,
}

impl SignalGuard {
    pub fn install(exit: ExitHandle) -> io::Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(io::Error::other)?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("tpad-signals".into())
            .spawn(move || {
                for _signal in signals.forever() {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(signal = _signal, "termination signal, requesting exit");
                    exit.request_exit();
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

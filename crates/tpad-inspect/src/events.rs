//! `events`: live echo of everything the input stack decodes.
//!
//! The sink prints from the driver thread; the main thread just idles until
//! `q`, Ctrl-C, or a termination signal stops the driver. Raw mode needs
//! explicit `\r\n` line endings.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tpad_core::config::InputConfig;
use tpad_core::driver::Input;
use tpad_core::key::Key;
use tpad_core::sink::InputSink;
use tpad_tty::{SignalGuard, TtySession, stdin_source};

use crate::error::{InspectError, Result};

struct EchoSink {
    quit: Arc<AtomicBool>,
}

impl InputSink for EchoSink {
    fn key_down(&mut self, key: Key) {
        write_line(format_args!("down  {key}"));
        if key == Key::new(b'q') {
            self.quit.store(true, Ordering::Release);
        }
    }

    fn key_up(&mut self, key: Key) {
        write_line(format_args!("up    {key}"));
    }

    fn mouse_move(&mut self, dx: i32, dy: i32) {
        write_line(format_args!("move  dx={dx} dy={dy}"));
    }
}

fn write_line(args: fmt::Arguments<'_>) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_fmt(args);
    let _ = stdout.write_all(b"\r\n");
    let _ = stdout.flush();
}

pub fn run_events() -> Result<()> {
    let mut session = TtySession::enter().map_err(InspectError::Terminal)?;

    let quit = Arc::new(AtomicBool::new(false));
    let input = Input::spawn(
        stdin_source(),
        EchoSink {
            quit: Arc::clone(&quit),
        },
        InputConfig::default(),
    )?;
    let signals = SignalGuard::install(input.exit_handle())?;

    write_line(format_args!("echoing input events; q or ctrl-c quits"));

    while input.is_running() && !quit.load(Ordering::Acquire) {
        thread::sleep(Duration::from_millis(20));
    }

    drop(signals);
    drop(input);
    session.restore()?;
    Ok(())
}

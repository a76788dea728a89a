#![forbid(unsafe_code)]

//! The input driver thread and its public handle.
//!
//! [`Input::spawn`] starts one dedicated reader thread that loops over a
//! [`ByteSource`]: sweep due releases, read one byte with a short timeout,
//! feed it to the decoder, and route whatever decoded. Key events go to the
//! scheduler, mouse reports to the tracker, query replies to the
//! [`QueryChannel`]. A lone ESC that stays silent past the escape timeout
//! is resolved into a real Escape keypress.
//!
//! Lifecycle: spawn blocks until the thread signals ready, so a caller that
//! immediately issues a terminal query knows the reply reader is already
//! listening. The thread stops when Ctrl-C arrives on the wire, when the
//! byte source fails, when [`Input::request_exit`] (or an [`ExitHandle`])
//! is called, or when the handle is dropped. On the way out it releases
//! every held key and closes the query channel so nothing stays blocked on
//! a reader that is gone.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;

use web_time::Instant;

use crate::config::InputConfig;
use crate::decoder::{SeqEvent, SequenceDecoder};
use crate::held_keys::HeldKeys;
use crate::key::Key;
use crate::key_scheduler::KeyScheduler;
use crate::mouse::MouseTracker;
use crate::query::{CellSize, GridSize, PixelSize, QueryChannel};
use crate::sink::InputSink;
use crate::source::ByteSource;

/// State shared between the driver thread and every handle.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub(crate) held: Arc<HeldKeys>,
    pub(crate) exit_requested: AtomicBool,
    pub(crate) shutdown: AtomicBool,
    pub(crate) queries: QueryChannel,
}

impl SharedState {
    fn new(config: &InputConfig) -> Self {
        Self {
            held: Arc::new(HeldKeys::new()),
            exit_requested: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            queries: QueryChannel::new(config),
        }
    }

    pub(crate) fn request_exit(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("exit requested");
        self.exit_requested.store(true, Ordering::Release);
        self.shutdown.store(true, Ordering::Release);
    }

    fn should_stop(&self) -> bool {
        self.exit_requested.load(Ordering::Acquire) || self.shutdown.load(Ordering::Acquire)
    }
}

// ── Driver thread ──

struct Driver<S, K> {
    source: S,
    sink: K,
    shared: Arc<SharedState>,
    config: InputConfig,
    decoder: SequenceDecoder,
    scheduler: KeyScheduler,
    mouse: MouseTracker,
    events: Vec<SeqEvent>,
    esc_deadline: Option<Instant>,
}

impl<S: ByteSource, K: InputSink> Driver<S, K> {
    fn new(source: S, sink: K, shared: Arc<SharedState>, config: InputConfig) -> Self {
        let scheduler = KeyScheduler::new(Arc::clone(&shared.held), &config);
        let mouse = MouseTracker::new(&config);
        Self {
            source,
            sink,
            shared,
            config,
            decoder: SequenceDecoder::new(),
            scheduler,
            mouse,
            events: Vec::with_capacity(8),
            esc_deadline: None,
        }
    }

    fn run(mut self, ready: mpsc::Sender<()>) {
        let _ = ready.send(());
        #[cfg(feature = "tracing")]
        tracing::info!("input driver started");

        while !self.shared.should_stop() {
            self.step();
        }

        self.scheduler.drain(&mut self.sink);
        self.shared.queries.close();
        #[cfg(feature = "tracing")]
        tracing::info!("input driver stopped");
    }

    fn step(&mut self) {
        let now = Instant::now();
        self.scheduler.sweep(now, &mut self.sink);

        match self.source.read_byte_timeout(self.config.poll_interval) {
            Ok(Some(byte)) => {
                self.esc_deadline = None;
                self.decode_and_route(Some(byte), now);
            }
            Ok(None) => self.handle_idle(now),
            Err(_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_error, "byte source failed, stopping driver");
                self.shared.exit_requested.store(true, Ordering::Release);
            }
        }
    }

    /// Arm or fire the lone-ESC timer. The timeout is measured from the
    /// first quiet poll after the last byte.
    fn handle_idle(&mut self, now: Instant) {
        if !self.decoder.in_escape() {
            self.esc_deadline = None;
            return;
        }
        match self.esc_deadline {
            None => self.esc_deadline = Some(now + self.config.escape_timeout),
            Some(deadline) if now >= deadline => {
                self.esc_deadline = None;
                self.decode_and_route(None, now);
            }
            Some(_) => {}
        }
    }

    /// Feed one byte (or resolve a pending escape) and route the results.
    fn decode_and_route(&mut self, byte: Option<u8>, now: Instant) {
        let mut events = std::mem::take(&mut self.events);
        events.clear();
        match byte {
            Some(byte) => self.decoder.feed(byte, &mut events),
            None => self.decoder.resolve_escape(&mut events),
        }
        for event in events.drain(..) {
            self.route(event, now);
        }
        self.events = events;
    }

    fn route(&mut self, event: SeqEvent, now: Instant) {
        match event {
            SeqEvent::Ascii(byte) => self.scheduler.press_ascii(byte, now, &mut self.sink),
            SeqEvent::FunctionKey(key) => self.scheduler.press_plain(key, now, &mut self.sink),
            SeqEvent::CsiKey { key, modifiers } => {
                self.scheduler.press_csi(key, modifiers, now, &mut self.sink);
            }
            SeqEvent::Mouse { button, col, row, press } => self.mouse.report(
                button,
                col,
                row,
                press,
                &mut self.scheduler,
                now,
                &mut self.sink,
            ),
            SeqEvent::DeviceAttributes(params) => {
                self.shared.queries.deliver_device_attributes(params);
            }
            SeqEvent::CellSize { height, width } => {
                self.shared.queries.deliver_cell_size(CellSize { height, width });
            }
            SeqEvent::CursorPos { row, col } => {
                self.shared.queries.deliver_cursor_pos(row, col);
            }
            SeqEvent::ExitRequested => {
                #[cfg(feature = "tracing")]
                tracing::info!("ctrl-c on the wire, exit requested");
                self.shared.exit_requested.store(true, Ordering::Release);
            }
        }
    }
}

// ── Public handle ──

/// Owning handle to the input driver thread.
///
/// Dropping it stops the thread and joins it.
#[derive(Debug)]
pub struct Input {
    shared: Arc<SharedState>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Input {
    /// Start the driver thread. Returns once the thread is running and
    /// listening, so terminal queries issued right after are safe.
    pub fn spawn<S, K>(source: S, sink: K, config: InputConfig) -> io::Result<Self>
    where
        S: ByteSource + Send + 'static,
        K: InputSink + Send + 'static,
    {
        let shared = Arc::new(SharedState::new(&config));
        let driver = Driver::new(source, sink, Arc::clone(&shared), config);
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("tpad-input".into())
            .spawn(move || driver.run(ready_tx))?;
        if ready_rx.recv().is_err() {
            let _ = thread.join();
            return Err(io::Error::other("input driver exited before signalling ready"));
        }
        Ok(Self { shared, thread: Some(thread) })
    }

    /// False once Ctrl-C, a source failure, or an exit request has stopped
    /// input. The main loop polls this.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.exit_requested.load(Ordering::Acquire)
    }

    /// Ask the driver to stop. Safe from any thread.
    pub fn request_exit(&self) {
        self.shared.request_exit();
    }

    /// Sampled key state, readable from any thread without locking.
    #[must_use]
    pub fn is_key_held(&self, key: Key) -> bool {
        self.shared.held.is_held(key)
    }

    /// Cloneable handle for signal handlers and other threads that only
    /// need to stop the driver.
    #[must_use]
    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle { shared: Arc::clone(&self.shared) }
    }

    /// The query channel, for callers that write requests to something
    /// other than stdout.
    #[must_use]
    pub fn queries(&self) -> &QueryChannel {
        &self.shared.queries
    }

    /// Primary device attributes, with the request written to stdout.
    pub fn device_attributes(&self) -> io::Result<Vec<u32>> {
        self.shared.queries.device_attributes(&mut io::stdout().lock())
    }

    /// Terminal size in pixels, with the requests written to stdout.
    pub fn screen_size(&self) -> io::Result<PixelSize> {
        self.shared.queries.screen_size(&mut io::stdout().lock())
    }

    /// Terminal size in cells, with the requests written to stdout.
    pub fn screen_cells(&self) -> io::Result<GridSize> {
        self.shared.queries.screen_cells(&mut io::stdout().lock())
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Clonable stop switch, detached from the owning [`Input`].
#[derive(Debug, Clone)]
pub struct ExitHandle {
    shared: Arc<SharedState>,
}

impl ExitHandle {
    pub fn request_exit(&self) {
        self.shared.request_exit();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.exit_requested.load(Ordering::Acquire)
    }
}

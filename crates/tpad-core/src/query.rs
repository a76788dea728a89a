#![forbid(unsafe_code)]

//! Request/reply rendezvous for terminal queries.
//!
//! Device attributes, cell size, and cursor position all follow the same
//! shape: write an escape sequence to the terminal, then block until the
//! driver thread decodes the reply and delivers it here. Each reply kind
//! has one slot under a shared mutex; a condvar wakes the blocked caller.
//!
//! Every request clears its slot before writing, so a caller can never be
//! satisfied by a reply that arrived for an earlier request. The request
//! bytes go out while the lock is held, which keeps clear-then-write atomic
//! with respect to the driver's deliveries.
//!
//! [`QueryChannel::close`] flips a flag that wakes every blocked caller;
//! from then on all queries resolve immediately to their defaults. The
//! driver closes the channel on its way out so no caller can block on a
//! terminal that has stopped answering.

use std::io::{self, Write};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::InputConfig;

pub const DEVICE_ATTRIBUTES_QUERY: &[u8] = b"\x1b[c";
pub const CELL_SIZE_QUERY: &[u8] = b"\x1b[16t";
pub const CURSOR_POS_QUERY: &[u8] = b"\x1b[6n";
/// Parking the cursor far past any real grid makes the terminal clamp it to
/// the bottom-right cell, so the position report doubles as a size report.
pub const CURSOR_TO_CORNER: &[u8] = b"\x1b[9999;9999H";

/// Size of one character cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub height: u32,
    pub width: u32,
}

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

/// Terminal size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSize {
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Default)]
struct ReplySlots {
    device_attributes: Option<Vec<u32>>,
    cell_size: Option<CellSize>,
    cursor_pos: Option<(u32, u32)>,
    closed: bool,
}

/// One-slot-per-kind reply mailbox shared between callers and the driver.
#[derive(Debug)]
pub struct QueryChannel {
    slots: Mutex<ReplySlots>,
    replied: Condvar,
    cells_timeout: Duration,
    default_cell: CellSize,
    default_grid: GridSize,
}

impl QueryChannel {
    #[must_use]
    pub fn new(config: &InputConfig) -> Self {
        Self {
            slots: Mutex::new(ReplySlots::default()),
            replied: Condvar::new(),
            cells_timeout: config.screen_cells_timeout,
            default_cell: config.default_cell,
            default_grid: config.default_grid,
        }
    }

    // ── Driver side ──

    pub(crate) fn deliver_device_attributes(&self, params: Vec<u32>) {
        #[cfg(feature = "tracing")]
        tracing::debug!(params = ?params, "device attributes reply");
        self.lock().device_attributes = Some(params);
        self.replied.notify_all();
    }

    pub(crate) fn deliver_cell_size(&self, cell: CellSize) {
        self.lock().cell_size = Some(cell);
        self.replied.notify_all();
    }

    pub(crate) fn deliver_cursor_pos(&self, row: u32, col: u32) {
        self.lock().cursor_pos = Some((row, col));
        self.replied.notify_all();
    }

    /// Wake every blocked caller and make all future queries resolve to
    /// defaults. Called once when the driver stops.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
        self.replied.notify_all();
    }

    // ── Caller side ──

    /// Primary device attributes. Blocks until the terminal answers or the
    /// channel closes (then yields an empty list).
    pub fn device_attributes(&self, out: &mut impl Write) -> io::Result<Vec<u32>> {
        #[cfg(feature = "tracing")]
        tracing::trace!("device attributes requested");
        let mut slots = self.lock();
        slots.device_attributes = None;
        out.write_all(DEVICE_ATTRIBUTES_QUERY)?;
        out.flush()?;
        slots = self.wait(slots, |slots| slots.device_attributes.is_none());
        Ok(slots.device_attributes.take().unwrap_or_default())
    }

    /// Terminal size in pixels, composed from the clamped cursor position
    /// and the reported cell size. Blocks like [`Self::device_attributes`].
    pub fn screen_size(&self, out: &mut impl Write) -> io::Result<PixelSize> {
        #[cfg(feature = "tracing")]
        tracing::trace!("screen pixel size requested");
        let mut slots = self.lock();
        slots.cell_size = None;
        slots.cursor_pos = None;
        out.write_all(CURSOR_TO_CORNER)?;
        out.write_all(CELL_SIZE_QUERY)?;
        out.write_all(CURSOR_POS_QUERY)?;
        out.flush()?;
        slots = self.wait(slots, |slots| slots.cursor_pos.is_none());
        let (rows, cols) = slots.cursor_pos.take().unwrap_or_default();
        // Terminals that do not answer 16t get the default cell geometry.
        let cell = slots.cell_size.take().unwrap_or(self.default_cell);
        Ok(PixelSize {
            height: rows.saturating_mul(cell.height),
            width: cols.saturating_mul(cell.width),
        })
    }

    /// Terminal size in cells. Unlike the other queries this one times out,
    /// since it runs during startup probes where hanging is worse than a
    /// default answer.
    pub fn screen_cells(&self, out: &mut impl Write) -> io::Result<GridSize> {
        #[cfg(feature = "tracing")]
        tracing::trace!("screen cell grid requested");
        let mut slots = self.lock();
        slots.cursor_pos = None;
        out.write_all(CURSOR_TO_CORNER)?;
        out.write_all(CURSOR_POS_QUERY)?;
        out.flush()?;
        (slots, _) = self
            .replied
            .wait_timeout_while(slots, self.cells_timeout, |slots| {
                slots.cursor_pos.is_none() && !slots.closed
            })
            .unwrap_or_else(|e| e.into_inner());
        match slots.cursor_pos.take() {
            Some((rows, cols)) => Ok(GridSize { rows, cols }),
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!("cursor position report timed out, using default grid");
                Ok(self.default_grid)
            }
        }
    }

    fn wait<'a>(
        &'a self,
        slots: MutexGuard<'a, ReplySlots>,
        pending: impl Fn(&ReplySlots) -> bool,
    ) -> MutexGuard<'a, ReplySlots> {
        self.replied
            .wait_while(slots, |slots| pending(slots) && !slots.closed)
            .unwrap_or_else(|e| e.into_inner())
    }

    fn lock(&self) -> MutexGuard<'_, ReplySlots> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#![forbid(unsafe_code)]

//! Tuned timing and scaling constants.
//!
//! Everything here is an empirically tuned trade-off, not a protocol
//! constant. The values are plain fields so embedders (and tests) can
//! adjust them.

use std::time::Duration;

use crate::query::{CellSize, GridSize};

/// Input subsystem tunables. `Default` gives the tuned values.
#[derive(Debug, Clone)]
pub struct InputConfig {
    /// Release delay for plain keys (ASCII, SS3 function keys, mouse
    /// buttons).
    pub standard_release: Duration,
    /// Release delay for arrows. Terminal auto-repeat arrives every
    /// 30–50 ms; shorter delays make held movement choppy, longer ones make
    /// single taps sluggish.
    pub arrow_release: Duration,
    /// A CSI press for a held key whose release is still further away than
    /// this counts as a new distinct press rather than auto-repeat.
    pub fresh_press_threshold: Duration,
    /// How long a lone ESC may wait for a follow-up byte before it resolves
    /// as the Escape key.
    pub escape_timeout: Duration,
    /// Byte-source poll timeout; bounds both sweep latency and exit
    /// latency.
    pub poll_interval: Duration,
    /// Multiplier applied to clamped mouse cell deltas.
    pub mouse_sensitivity: i32,
    /// Per-axis clamp on raw cell deltas; guards against jumps from a
    /// resize or protocol desync.
    pub mouse_max_delta: i32,
    /// Deadline for the screen-cells query before falling back to
    /// `default_grid`.
    pub screen_cells_timeout: Duration,
    /// Cell pixel size assumed when the terminal does not answer
    /// `CSI 16 t` (the VT340 raster).
    pub default_cell: CellSize,
    /// Grid assumed when the cursor-position query times out.
    pub default_grid: GridSize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            standard_release: Duration::from_millis(50),
            arrow_release: Duration::from_millis(80),
            fresh_press_threshold: Duration::from_millis(25),
            escape_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(1),
            mouse_sensitivity: 10,
            mouse_max_delta: 100,
            screen_cells_timeout: Duration::from_secs(2),
            default_cell: CellSize { height: 20, width: 10 },
            default_grid: GridSize { rows: 24, cols: 80 },
        }
    }
}

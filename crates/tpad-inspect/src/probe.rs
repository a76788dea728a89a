//! `probe`: ask the terminal who it is and how big it is.
//!
//! Runs the full stack for a moment: raw-mode session, driver thread over
//! stdin, then the three standard queries. The report prints only after the
//! session is restored, so it lands on a sane terminal.
//!
//! Device attributes and pixel size block until the terminal answers; a
//! terminal that never answers leaves the probe waiting, and Ctrl-C
//! unblocks it (the driver closes the query channel on exit, and closed
//! queries resolve to defaults).

use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tpad_core::config::InputConfig;
use tpad_core::driver::Input;
use tpad_core::sink::NullSink;
use tpad_tty::{SignalGuard, TtySession, stdin_source};

use crate::error::{InspectError, Result};

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Deadline for the cell-grid query, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    device_attributes: Vec<u32>,
    grid: GridReport,
    pixels: PixelReport,
}

#[derive(Debug, Serialize)]
struct GridReport {
    rows: u32,
    cols: u32,
}

#[derive(Debug, Serialize)]
struct PixelReport {
    height: u32,
    width: u32,
}

pub fn run_probe(args: ProbeArgs) -> Result<()> {
    let mut session = TtySession::enter().map_err(InspectError::Terminal)?;

    let config = InputConfig {
        screen_cells_timeout: Duration::from_millis(args.timeout_ms),
        ..InputConfig::default()
    };
    let input = Input::spawn(stdin_source(), NullSink, config)?;
    let signals = SignalGuard::install(input.exit_handle())?;

    let device_attributes = input.device_attributes()?;
    let grid = input.screen_cells()?;
    let pixels = input.screen_size()?;

    drop(signals);
    drop(input);
    session.restore()?;

    let report = ProbeReport {
        device_attributes,
        grid: GridReport {
            rows: grid.rows,
            cols: grid.cols,
        },
        pixels: PixelReport {
            height: pixels.height,
            width: pixels.width,
        },
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_plain(&report);
    }
    Ok(())
}

fn print_plain(report: &ProbeReport) {
    let attrs = if report.device_attributes.is_empty() {
        "(none)".to_string()
    } else {
        report
            .device_attributes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(";")
    };
    println!("device attributes: {attrs}");
    println!("grid:   {} rows x {} cols", report.grid.rows, report.grid.cols);
    println!(
        "pixels: {} high x {} wide",
        report.pixels.height, report.pixels.width
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_with_stable_field_names() {
        let report = ProbeReport {
            device_attributes: vec![62, 4],
            grid: GridReport { rows: 24, cols: 80 },
            pixels: PixelReport {
                height: 480,
                width: 800,
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["device_attributes"], serde_json::json!([62, 4]));
        assert_eq!(json["grid"]["rows"], 24);
        assert_eq!(json["pixels"]["width"], 800);
    }
}

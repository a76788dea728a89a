#![forbid(unsafe_code)]

//! Feature-gated logging facade.
//!
//! With the `tracing` feature enabled the driver emits structured events
//! through [`tracing`]; without it every call site compiles away behind its
//! `#[cfg]`. The `tracing-json` feature additionally pulls in a JSON
//! subscriber for production capture.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

/// Install a JSON subscriber writing to stderr, filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "tracing-json")]
pub fn init_json() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

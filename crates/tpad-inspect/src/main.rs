#![forbid(unsafe_code)]

fn main() {
    #[cfg(feature = "tracing-json")]
    tpad_core::logging::init_json();

    if let Err(error) = tpad_inspect::run_from_env() {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}

use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::events::run_events;
use crate::probe::{ProbeArgs, run_probe};

#[derive(Debug, Parser)]
#[command(
    name = "tpad-inspect",
    about = "Terminal input diagnostics for termpad",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Query the terminal and report device attributes and geometry.
    Probe(ProbeArgs),

    /// Echo decoded input events until `q` or Ctrl-C.
    Events,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Probe(args) => run_probe(args),
        Commands::Events => run_events(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_with_json_flag() {
        let cli = Cli::try_parse_from(["tpad-inspect", "probe", "--json"]).unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("expected probe subcommand");
        };
        assert!(args.json);
        assert_eq!(args.timeout_ms, 2000);
    }

    #[test]
    fn parses_probe_timeout_override() {
        let cli =
            Cli::try_parse_from(["tpad-inspect", "probe", "--timeout-ms", "500"]).unwrap();
        let Commands::Probe(args) = cli.command else {
            panic!("expected probe subcommand");
        };
        assert!(!args.json);
        assert_eq!(args.timeout_ms, 500);
    }

    #[test]
    fn parses_events() {
        let cli = Cli::try_parse_from(["tpad-inspect", "events"]).unwrap();
        assert!(matches!(cli.command, Commands::Events));
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["tpad-inspect", "render"]).is_err());
    }
}

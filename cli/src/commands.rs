//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for leancup
#[derive(Parser, Debug)]
#[command(name = "leancup")]
#[command(author, version, about = "Lean Coffee session coordinator")]
#[command(long_about = r#"
leancup coordinates Lean Coffee sessions: participants propose topics, rank
them with quadratic voting, discuss them one at a time under a time box, and
vote on whether to keep going when the box runs out.

Configuration files are loaded from (in priority order):
1. LEANCUP_* environment variables (e.g. LEANCUP_COORDINATOR__MAX_VOTE_COUNT=10)
2. --config <path>     Explicit config file
3. ./leancup.toml      Project-level config
4. ~/.config/leancup/config.toml   Global config

Example:
  leancup run requests.jsonl
  some-client | leancup run
  leancup demo --participants 7
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve JSONL requests from a file or stdin, one reply line per request
    Run {
        /// Request script; reads stdin when omitted
        script: Option<PathBuf>,
    },

    /// Simulate a session with concurrent participants
    Demo {
        /// Number of simulated participants
        #[arg(short, long, default_value_t = 5)]
        participants: usize,

        /// Seed for the simulated choices
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show configuration sources and the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_script() {
        let cli = Cli::parse_from(["leancup", "run", "requests.jsonl"]);
        match cli.command {
            Command::Run { script } => assert_eq!(script, Some(PathBuf::from("requests.jsonl"))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["leancup", "demo", "-p", "3", "-vv", "--no-config"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_config);
        assert!(matches!(
            cli.command,
            Command::Demo {
                participants: 3,
                seed: None
            }
        ));
    }

    #[test]
    fn test_demo_defaults() {
        let cli = Cli::parse_from(["leancup", "demo"]);
        assert!(matches!(
            cli.command,
            Command::Demo {
                participants: 5,
                ..
            }
        ));
    }
}

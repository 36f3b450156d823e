use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stroop", version, about = "Stroop task runner and chat stream relay")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a Stroop session in the terminal
    Session {
        /// Trial log, overrides the configured path
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Replay a recorded provider transcript as an event stream on stdout
    Replay {
        /// JSONL transcript: one request line followed by chunk lines
        #[arg(short, long)]
        transcript: PathBuf,

        /// Interaction log, overrides the configured path
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Delay between replayed chunks
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
}

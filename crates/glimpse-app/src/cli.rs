//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glimpse", version, about = "Peer-to-peer screen sharing sessions")]
pub struct Args {
    /// Path to a settings file, overriding the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a host and a handful of viewers over the in-memory transport.
    Demo {
        /// How many viewers dial into the room.
        #[arg(long, default_value_t = 2)]
        viewers: usize,

        /// Decline the first capture request before sharing for real.
        #[arg(long)]
        deny_capture: bool,
    },
}

pub fn parse() -> Args {
    Args::parse()
}

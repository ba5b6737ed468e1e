use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(name = "woz")]
#[command(version)]
#[command(about = "Inspect Wizard-of-Oz chat transcripts")]
pub struct Args {
    /// Protocol config (TOML, YAML or JSON). Defaults to <config dir>/woz/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render state for every message of a transcript
    Process {
        transcript: PathBuf,

        /// Keep protocol-only messages in the output
        #[arg(long)]
        debug_invisible: bool,

        /// Only list messages the UI would emit
        #[arg(long)]
        visible_only: bool,
    },
    /// Classify a single message text
    Classify {
        text: String,

        #[arg(long, default_value = "Wizard")]
        sender: String,

        /// Platform command attached to the message
        #[arg(long)]
        command: Option<String>,
    },
    /// Decode a knowledge base reply
    Decode { text: String },
    /// Summarise the task state one participant would see
    Session {
        transcript: PathBuf,

        #[arg(long, default_value = "User")]
        agent: String,

        /// The chat input is not accepting text yet
        #[arg(long)]
        input_blocked: bool,
    },
}

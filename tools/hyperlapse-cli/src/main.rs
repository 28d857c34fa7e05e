//! Hyperlapse CLI: command-line interface for time-lapse stabilization.
//!
//! Usage:
//!   hyperlapse stabilize <INPUT> [OPTIONS]   Stabilize a video into a time-lapse
//!   hyperlapse analyze <INPUT> [OPTIONS]     Analyze a video without rendering
//!   hyperlapse probe <INPUT>                 Show stream information
//!   hyperlapse check                         Check external tool availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "hyperlapse",
    about = "Stabilized time-lapse creation from shaky video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stabilize a video into a time-lapse
    Stabilize {
        /// Input video file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output codec: h264|h265|vp9|mpeg4 [default: h264]
        #[arg(long)]
        codec: Option<String>,

        #[command(flatten)]
        tuning: commands::TuningArgs,
    },

    /// Analyze a video and print the stabilization plan without rendering
    Analyze {
        /// Input video file
        input: PathBuf,

        /// Emit the report as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        tuning: commands::TuningArgs,
    },

    /// Show stream information for a video file
    Probe {
        /// Input video file
        input: PathBuf,
    },

    /// Check external tool availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    hyperlapse_common::logging::init_cli_logging(cli.verbose);

    match cli.command {
        Commands::Stabilize {
            input,
            output,
            codec,
            tuning,
        } => commands::stabilize::run(input, output, codec, tuning).await,
        Commands::Analyze {
            input,
            json,
            tuning,
        } => commands::analyze::run(input, json, tuning).await,
        Commands::Probe { input } => commands::probe::run(input),
        Commands::Check => commands::check::run(),
    }
}

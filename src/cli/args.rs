//! Command line argument parsing for the Palaver CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Palaver - a customer-support chatbot with a trainable intent classifier
#[derive(Parser, Debug, Clone)]
#[command(name = "palaver")]
#[command(about = "Customer-support chatbot: dataset tools, trainer, and chat server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Palaver Contributors")]
#[command(long_about = None)]
pub struct PalaverArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl PalaverArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Repair malformed rows in the dataset CSV files
    Repair(RepairArgs),

    /// Merge the dataset CSV files into one labeled training file
    Merge(MergeArgs),

    /// Train the intent classifier and write a model artifact
    Train(TrainArgs),

    /// Run the chat server
    Serve(ServeArgs),
}

/// Arguments for dataset repair
#[derive(Parser, Debug, Clone)]
pub struct RepairArgs {
    /// Directory containing the dataset CSV files
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,
}

/// Arguments for dataset merging
#[derive(Parser, Debug, Clone)]
pub struct MergeArgs {
    /// Directory containing the dataset CSV files
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Path of the merged output file
    #[arg(short, long, default_value = "merged_dataset.csv")]
    pub output: PathBuf,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Directory containing the dataset CSV files
    #[arg(value_name = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Path of the model artifact to write
    #[arg(short, long, default_value = "chatbot_model.bin")]
    pub output: PathBuf,
}

/// Arguments for the chat server
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "PALAVER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Path of the trained model artifact
    #[arg(long, env = "PALAVER_MODEL", default_value = "chatbot_model.bin")]
    pub model: PathBuf,

    /// Directory to store uploads in
    #[arg(long, env = "PALAVER_UPLOADS", default_value = "uploads")]
    pub uploads_dir: PathBuf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

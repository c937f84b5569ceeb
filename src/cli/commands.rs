//! Command implementations for the Palaver CLI.

use crate::cli::args::*;
use crate::cli::output::*;
use crate::dataset::{merge, repair};
use crate::error::Result;
use crate::server::{self, ServerConfig};
use crate::trainer;

/// Execute a CLI command.
pub fn execute_command(args: PalaverArgs) -> Result<()> {
    match &args.command {
        Command::Repair(repair_args) => repair_dataset(repair_args.clone(), &args),
        Command::Merge(merge_args) => merge_dataset(merge_args.clone(), &args),
        Command::Train(train_args) => train_model(train_args.clone(), &args),
        Command::Serve(serve_args) => run_server(serve_args.clone(), &args),
    }
}

/// Repair malformed rows in place.
fn repair_dataset(args: RepairArgs, cli_args: &PalaverArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Repairing CSV files in: {}", args.data_dir.display());
    }

    let report = repair::repair_dir(&args.data_dir)?;

    output_result("Dataset repaired", &report, cli_args)?;
    Ok(())
}

/// Merge the per-topic files into one labeled file.
fn merge_dataset(args: MergeArgs, cli_args: &PalaverArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Merging CSV files in: {}", args.data_dir.display());
        println!("Into: {}", args.output.display());
    }

    let report = merge::merge_dir(&args.data_dir, &args.output)?;

    output_result("Dataset merged", &report, cli_args)?;
    Ok(())
}

/// Train the classifier and write the model artifact.
fn train_model(args: TrainArgs, cli_args: &PalaverArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Training from: {}", args.data_dir.display());
    }

    let report = trainer::train_dir(&args.data_dir, &args.output)?;

    output_result("Model trained", &report, cli_args)?;
    Ok(())
}

/// Run the chat server until interrupted.
fn run_server(args: ServeArgs, cli_args: &PalaverArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Starting chat server on: {}", args.bind);
    }

    let config = ServerConfig {
        bind: args.bind,
        model_path: args.model,
        uploads_dir: args.uploads_dir,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(config))
}

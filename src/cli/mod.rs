//! Command-line interface
//!
//! Two commands: `prune` applies magnitude pruning to a checkpoint and
//! writes the pruned model with its mask registry, and `info` summarizes a
//! checkpoint. Fine-tuning itself is a library concern
//! ([`crate::train::TrainingSession`]); it needs a dataset and a forward
//! function that only the embedding application can supply.

pub mod logging;

use crate::io::{load_checkpoint, save_checkpoint, Checkpoint, CheckpointManager};
use crate::prune::MaskRegistry;
use crate::{Error, Result};
use clap::{Parser, Subcommand};
use logging::{log, LogLevel};
use std::path::PathBuf;

/// Model identifiers with known checkpoint layouts
const KNOWN_MODELS: &[&str] = &["res18", "vgg"];

/// Magnitude pruning with mask-preserving fine-tuning
#[derive(Debug, Parser)]
#[command(name = "podar", version, about)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Suppress all output
    #[arg(long, global = true)]
    quiet: bool,

    /// Verbose output
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prune a checkpoint's target layers by magnitude and save the result
    Prune(PruneArgs),
    /// Show a checkpoint summary
    Info {
        /// Checkpoint path
        loadfile: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct PruneArgs {
    /// Checkpoint to prune
    loadfile: PathBuf,

    /// Fraction of weights to prune in each target layer
    #[arg(short = 'p', long = "prune", default_value_t = 0.5)]
    fraction: f32,

    /// Substring selecting the target layers
    #[arg(long, default_value = "conv2")]
    marker: String,

    /// Model identifier, used to derive output names
    #[arg(long, default_value = "res18")]
    net: String,

    /// Output directory for the pruned checkpoint
    #[arg(long, default_value = "checkpoint")]
    out_dir: PathBuf,

    /// Compute and report masks without writing anything
    #[arg(long)]
    dry_run: bool,
}

/// Execute a parsed CLI invocation
pub fn run_command(cli: Cli) -> Result<()> {
    let level = LogLevel::from_flags(cli.quiet, cli.verbose);
    match cli.command {
        Command::Prune(args) => run_prune(&args, level),
        Command::Info { loadfile } => run_info(&loadfile, level),
    }
}

fn run_prune(args: &PruneArgs, level: LogLevel) -> Result<()> {
    if !KNOWN_MODELS.contains(&args.net.as_str()) {
        return Err(Error::Config(format!(
            "unrecognized model identifier '{}' (known: {})",
            args.net,
            KNOWN_MODELS.join(", ")
        )));
    }

    let checkpoint = load_checkpoint(&args.loadfile)?;
    let mut params = checkpoint.params();

    let plan = MaskRegistry::build(&params, &args.marker, args.fraction)?;
    for stats in plan.stats() {
        log(
            level,
            LogLevel::Normal,
            &format!(
                "pruning layer {}: {} of {} weights",
                stats.address, stats.pruned, stats.total
            ),
        );
    }
    log(
        level,
        LogLevel::Normal,
        &format!("total weights pruned: {}", plan.total_pruned()),
    );

    if args.dry_run {
        log(level, LogLevel::Normal, "dry run, nothing written");
        return Ok(());
    }

    let registry = plan.commit(&mut params)?;

    let manager = CheckpointManager::new(&args.out_dir, &args.net);
    let pruned = Checkpoint::from_params(&params, Some(&registry), checkpoint.acc, checkpoint.epoch);
    save_checkpoint(&pruned, manager.path())?;
    log(
        level,
        LogLevel::Normal,
        &format!("wrote {}", manager.path().display()),
    );
    Ok(())
}

fn run_info(loadfile: &PathBuf, level: LogLevel) -> Result<()> {
    let checkpoint = load_checkpoint(loadfile)?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "{} parameters | acc {:.3} | epoch {}",
            checkpoint.weights.len(),
            checkpoint.acc,
            checkpoint.epoch
        ),
    );

    if checkpoint.is_pruned() {
        let registry = checkpoint.registry()?;
        for (address, mask) in registry.iter() {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "{address}: {} of {} pruned ({:.1}% sparse)",
                    mask.pruned_count(),
                    mask.len(),
                    mask.sparsity() * 100.0
                ),
            );
        }
    } else {
        log(level, LogLevel::Normal, "no prune masks stored");
    }
    Ok(())
}

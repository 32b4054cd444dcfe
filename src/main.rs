//! Podar CLI
//!
//! # Usage
//!
//! ```bash
//! # Prune half the weights of every conv2 layer
//! podar prune checkpoint/res18-ckpt.json --prune 0.5
//!
//! # See what would be pruned without writing anything
//! podar prune checkpoint/res18-ckpt.json --prune 0.7 --dry-run
//!
//! # Inspect a pruned checkpoint
//! podar info checkpoint/pruned-res18-ckpt.json
//! ```

use clap::Parser;
use podar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

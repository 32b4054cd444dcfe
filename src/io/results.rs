//! Per-epoch result file

use crate::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only text file recording epoch number and best accuracy, one
/// value per line, named by prune fraction and model identifier.
#[derive(Debug, Clone)]
pub struct ResultsFile {
    path: PathBuf,
}

impl ResultsFile {
    /// Create a results file handle under `dir` for a run
    pub fn new(dir: impl AsRef<Path>, fraction: f32, model_id: &str) -> Self {
        Self {
            path: dir
                .as_ref()
                .join(format!("prune-results-{fraction}-{model_id}.txt")),
        }
    }

    /// The file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one epoch record: epoch on one line, best accuracy on the next
    pub fn append(&self, epoch: usize, best_acc: f32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{epoch}")?;
        writeln!(file, "{best_acc}")?;
        Ok(())
    }
}

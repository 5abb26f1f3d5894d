//! Per-run state threaded explicitly through the crawl: where output lands
//! and a cooperative cancellation flag, instead of module-level globals.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

/// A cooperative cancellation flag shared across every in-flight worker
/// task. Checked at batch boundaries in the orchestrator; never forces a
/// task to stop mid-await.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Immutable per-run context: where output lands and how to tell whether
/// the run should stop early. Passed by reference (or cloned, since it's
/// cheap) to the orchestrator and every collaborator that needs either.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_dir: PathBuf,
    cancellation: CancellationToken,
}

impl RunContext {
    /// Create a run directory under `output_root` named `run_<timestamp>`
    /// and return a context pointing at it.
    pub fn create(output_root: &Path) -> std::io::Result<Self> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let run_dir = output_root.join(format!("run_{stamp}"));
        std::fs::create_dir_all(&run_dir)?;
        Ok(Self {
            run_dir,
            cancellation: CancellationToken::new(),
        })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.run_dir.join("crawl.log")
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

mod project;
mod stems;
mod tempo;

pub use project::{ExportPlan, ExportProject};
pub use stems::{StemFolderEncoder, MANIFEST_FILE};
pub use tempo::detect_tempo;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ExportError;

/// Which scenes an export covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// Every scene that has audio
    #[default]
    All,
    /// Only the active scene
    Active,
}

/// A container format for realigned audio
pub trait FormatEncoder: Send + Sync {
    /// Short name for logs and status messages
    fn name(&self) -> &'static str;

    /// Write `project` under `out_dir`, returning the path of the result
    fn write(&self, project: &ExportProject, out_dir: &Path) -> Result<PathBuf, ExportError>;
}

/// Allows one export at a time
#[derive(Debug, Clone, Default)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

impl ExportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. Fails with [`ExportError::Busy`] while another
    /// permit is alive.
    pub fn try_acquire(&self) -> Result<ExportPermit, ExportError> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(ExportError::Busy);
        }
        Ok(ExportPermit {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one export; releases the guard on drop
#[derive(Debug)]
pub struct ExportPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for ExportPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// What a finished export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub format: &'static str,
    pub scenes: usize,
    pub clips: usize,
    pub tempo_bpm: f64,
}

/// Render and write `plan` on the blocking pool.
///
/// `permit` is held until the work settles, success or failure.
#[instrument(skip_all, fields(format = encoder.name(), out_dir = %out_dir.display()))]
pub async fn run_export(
    plan: ExportPlan,
    encoder: Arc<dyn FormatEncoder>,
    out_dir: PathBuf,
    permit: ExportPermit,
) -> Result<ExportSummary, ExportError> {
    let result = tokio::task::spawn_blocking(move || -> Result<ExportSummary, ExportError> {
        let project = plan.render()?;
        let path = encoder.write(&project, &out_dir)?;
        Ok(ExportSummary {
            path,
            format: encoder.name(),
            scenes: project.scenes.len(),
            clips: project.clip_count(),
            tempo_bpm: project.tempo_bpm,
        })
    })
    .await
    .map_err(|e| ExportError::Task(e.to_string()))?;

    drop(permit);

    match &result {
        Ok(summary) => info!(
            path = %summary.path.display(),
            scenes = summary.scenes,
            clips = summary.clips,
            "Export complete"
        ),
        Err(e) => warn!(error = %e, "Export failed"),
    }
    result
}

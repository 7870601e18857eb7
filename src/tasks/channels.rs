use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::ExportError;
use crate::export::{ExportPermit, ExportPlan, ExportSummary, FormatEncoder};
use crate::ingest::BatchResult;

/// Commands from the UI loop to the worker task
pub enum WorkerCommand {
    /// Decode these inputs; every directory becomes its own scene
    Ingest(Vec<PathBuf>),
    /// Render and write an export
    Export {
        plan: ExportPlan,
        encoder: Arc<dyn FormatEncoder>,
        out_dir: PathBuf,
        permit: ExportPermit,
    },
    /// Shutdown the worker
    Quit,
}

/// Messages from the worker to the UI loop
#[derive(Debug)]
pub enum TaskEvent {
    /// One batch finished decoding
    BatchLoaded(BatchResult),
    /// Every batch of an ingest request has been reported
    IngestFinished { batches: usize },
    /// An export settled
    ExportFinished(Result<ExportSummary, ExportError>),
    /// Worker is shutting down
    Shutdown,
}

/// Channel bundle for communication
pub struct Channels {
    pub cmd_tx: mpsc::Sender<WorkerCommand>,
    pub cmd_rx: mpsc::Receiver<WorkerCommand>,

    pub event_tx: mpsc::Sender<TaskEvent>,
    pub event_rx: mpsc::Receiver<TaskEvent>,
}

impl Channels {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(16);

        Self {
            cmd_tx,
            cmd_rx,
            event_tx,
            event_rx,
        }
    }

    /// Split into sender/receiver pairs
    pub fn split(
        self,
    ) -> (
        mpsc::Sender<WorkerCommand>,
        mpsc::Receiver<WorkerCommand>,
        mpsc::Sender<TaskEvent>,
        mpsc::Receiver<TaskEvent>,
    ) {
        (self.cmd_tx, self.cmd_rx, self.event_tx, self.event_rx)
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}

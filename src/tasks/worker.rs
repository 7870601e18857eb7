use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::export::run_export;
use crate::ingest::{collect_batches, load_batch};

use super::channels::{TaskEvent, WorkerCommand};

/// Background task that decodes ingestion batches and runs exports,
/// reporting back over the event channel.
pub struct Worker {
    cmd_rx: mpsc::Receiver<WorkerCommand>,
    event_tx: mpsc::Sender<TaskEvent>,
}

impl Worker {
    pub fn new(cmd_rx: mpsc::Receiver<WorkerCommand>, event_tx: mpsc::Sender<TaskEvent>) -> Self {
        Self { cmd_rx, event_tx }
    }

    /// Run until `Quit` or until every command sender is gone
    #[instrument(skip(self), name = "worker")]
    pub async fn run(mut self) {
        info!("Worker starting");

        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                WorkerCommand::Ingest(inputs) => {
                    debug!(inputs = inputs.len(), "Received Ingest command");
                    self.ingest(inputs).await;
                }
                WorkerCommand::Export {
                    plan,
                    encoder,
                    out_dir,
                    permit,
                } => {
                    debug!("Received Export command");
                    // Exports run beside ingestion; the permit serializes them
                    let event_tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        let result = run_export(plan, encoder, out_dir, permit).await;
                        let _ = event_tx.send(TaskEvent::ExportFinished(result)).await;
                    });
                }
                WorkerCommand::Quit => {
                    info!("Received Quit command");
                    break;
                }
            }
        }

        let _ = self.event_tx.send(TaskEvent::Shutdown).await;
        info!("Worker stopped");
    }

    async fn ingest(&self, inputs: Vec<std::path::PathBuf>) {
        let batches = collect_batches(&inputs);
        if batches.is_empty() {
            warn!("No supported audio files found in inputs");
        }

        let count = batches.len();
        for batch in batches {
            let result = load_batch(batch).await;
            if self.event_tx.send(TaskEvent::BatchLoaded(result)).await.is_err() {
                return;
            }
        }

        let _ = self.event_tx.send(TaskEvent::IngestFinished { batches: count }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{encode_wav, SampleBuffer};
    use crate::tasks::Channels;

    #[tokio::test]
    async fn test_ingest_reports_each_batch_then_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let wav = encode_wav(&SampleBuffer::new(1000, vec![vec![0.1; 100]]).unwrap()).unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a/kick.wav"), &wav).unwrap();
        std::fs::write(dir.path().join("b/snare.wav"), &wav).unwrap();

        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = Channels::new().split();
        let handle = tokio::spawn(Worker::new(cmd_rx, event_tx).run());

        cmd_tx
            .send(WorkerCommand::Ingest(vec![dir.path().join("a"), dir.path().join("b")]))
            .await
            .unwrap();
        cmd_tx.send(WorkerCommand::Quit).await.unwrap();

        let mut labels = Vec::new();
        loop {
            match event_rx.recv().await.unwrap() {
                TaskEvent::BatchLoaded(result) => labels.push(result.label),
                TaskEvent::IngestFinished { batches } => assert_eq!(batches, 2),
                TaskEvent::Shutdown => break,
                TaskEvent::ExportFinished(_) => panic!("unexpected export"),
            }
        }
        assert_eq!(labels, vec!["a", "b"]);
        handle.await.unwrap();
    }
}

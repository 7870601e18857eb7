mod app;
mod audio;
mod cli;
mod error;
mod export;
mod ingest;
mod playback;
mod render;
mod session;
mod tasks;
mod tui;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::app::{AppState, Settings, Status};
use crate::cli::Args;
use crate::error::{PhaseloopError, Result};
use crate::export::{run_export, StemFolderEncoder};
use crate::ingest::{collect_batches, load_batch};
use crate::playback::{default_device_index, list_audio_devices, NullOutput, PlaybackEngine};
use crate::tasks::{Channels, TaskEvent, Worker, WorkerCommand};
use crate::tui::{Input, TuiApp};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing (to file if TUI is enabled)
    init_tracing(&args);

    info!("phaseloop v{} starting", env!("CARGO_PKG_VERSION"));

    // Set up graceful shutdown
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    });

    let result = if args.list_devices {
        print_devices();
        Ok(())
    } else if let Some(out_dir) = args.export.clone() {
        run_headless(&args, out_dir).await
    } else {
        run(args, shutdown).await
    };

    // Run the application
    if let Err(e) = result {
        error!("Application error: {}", e);
        return Err(e);
    }

    info!("phaseloop shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber. The UI owns the terminal, so it logs to
/// a file; headless runs log to stderr.
fn init_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact();

    if args.is_headless() {
        builder.with_writer(std::io::stderr).init();
        return;
    }

    match open_log_file(&args.log_path()) {
        Ok(file) => builder.with_writer(Mutex::new(file)).with_ansi(false).init(),
        // Nowhere to log without corrupting the screen
        Err(_) => builder.with_writer(std::io::sink).init(),
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}

fn print_devices() {
    let default = default_device_index();
    for device in list_audio_devices() {
        let marker = if device.index == default { "*" } else { " " };
        println!("{} {:>2}  {}", marker, device.index, device.name);
    }
}

/// Decode the inputs, export them and exit without touching the audio
/// device or the terminal
async fn run_headless(args: &Args, out_dir: PathBuf) -> Result<()> {
    if args.inputs.is_empty() {
        return Err(PhaseloopError::Config("--export needs at least one input".into()));
    }

    info!(inputs = args.inputs.len(), out_dir = %out_dir.display(), scope = ?args.scope, "Headless export");

    let mut app = AppState::new(Settings::from_args(args), NullOutput);
    for batch in collect_batches(&args.inputs) {
        let result = load_batch(batch).await;
        app.add_batch(result)?;
    }

    let (plan, permit) = app.prepare_export(args.scope)?;
    let summary = run_export(plan, Arc::new(StemFolderEncoder), out_dir, permit).await?;

    println!(
        "Exported {} clips in {} scenes at {:.1} BPM to {}",
        summary.clips,
        summary.scenes,
        summary.tempo_bpm,
        summary.path.display()
    );
    Ok(())
}

/// Main application loop
async fn run(args: Args, shutdown: Arc<AtomicBool>) -> Result<()> {
    info!(
        inputs = args.inputs.len(),
        loop_start = args.loop_start,
        snap = args.snap,
        device = ?args.device,
        "Starting session"
    );

    // Initialize playback engine
    let output = PlaybackEngine::with_device(args.device)?;
    info!(device = output.device_index(), "Audio output ready");
    let mut app = AppState::new(Settings::from_args(&args), output);

    // Set up channels for task communication
    let channels = Channels::new();
    let (cmd_tx, cmd_rx, event_tx, mut event_rx) = channels.split();

    // Start worker task
    let worker = Worker::new(cmd_rx, event_tx);
    tokio::spawn(async move {
        worker.run().await;
    });

    if !args.inputs.is_empty() {
        app.set_loading(true);
        let _ = cmd_tx.send(WorkerCommand::Ingest(args.inputs.clone())).await;
    }

    // Initialize TUI
    let mut tui = TuiApp::new(cmd_tx, args.export_root())?;

    info!("TUI started - press 'q' to quit");

    let mut dirty = true;

    // Main event loop
    loop {
        // Handle TUI input
        match tui.handle_input(&mut app).await? {
            Input::Quit => break,
            Input::Handled => dirty = true,
            Input::Idle => {}
        }
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Process worker events
        while let Ok(event) = event_rx.try_recv() {
            dirty = true;
            match event {
                TaskEvent::BatchLoaded(result) => {
                    if let Err(e) = app.add_batch(result) {
                        app.set_status(Status::Error(e.to_string()));
                    }
                }
                TaskEvent::IngestFinished { batches } => {
                    app.set_loading(false);
                    if batches == 0 {
                        app.set_status(Status::Error("No supported audio files in inputs".into()));
                    }
                }
                TaskEvent::ExportFinished(result) => {
                    app.finish_export(result);
                }
                TaskEvent::Shutdown => {
                    info!("Worker shutdown");
                    break;
                }
            }
        }

        // Redraw only while something is moving
        if dirty || app.needs_redraw() {
            app.tick_meters();
            tui.draw(&app)?;
            dirty = false;
        }

        // Small delay to prevent busy loop
        tokio::time::sleep(tokio::time::Duration::from_millis(16)).await; // ~60 FPS
    }

    // Clean shutdown
    app.stop();
    tui.cleanup();

    Ok(())
}

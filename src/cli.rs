use std::path::PathBuf;

use clap::Parser;

use crate::export::ExportScope;
use crate::playback::DEFAULT_ZOOM_STEP;

#[derive(Parser, Debug, Clone)]
#[command(name = "phaseloop")]
#[command(about = "Shift the loop start of a stack of stems and export them phase-locked")]
#[command(version)]
pub struct Args {
    /// Audio files and directories. Each directory becomes its own scene;
    /// loose files together form one scene.
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    // Timeline
    /// Initial loop-start of the first group (seconds)
    #[arg(long, default_value = "0")]
    pub loop_start: f64,

    /// Snap the loop-start to the nearest zero-crossing after a drag and on export
    #[arg(long)]
    pub snap: bool,

    /// Zoom multiplier per zoom step
    #[arg(long, default_value_t = DEFAULT_ZOOM_STEP)]
    pub zoom_step: f64,

    // Export
    /// Export to this directory without starting the UI, then exit
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,

    /// Scenes to export with --export
    #[arg(long, value_enum, default_value_t = ExportScope::All)]
    pub scope: ExportScope,

    /// Directory for exports triggered from the UI
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    // Audio device
    /// Output device index (see --list-devices)
    #[arg(long)]
    pub device: Option<usize>,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    // Debug
    /// Log file used while the UI is running
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Running without the terminal UI
    pub fn is_headless(&self) -> bool {
        self.export.is_some() || self.list_devices
    }

    /// Log file path, defaulting to the user cache directory
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("phaseloop")
                .join("phaseloop.log")
        })
    }

    /// Where UI-triggered exports go, defaulting to `./phaseloop-export`
    pub fn export_root(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("phaseloop-export"))
    }
}

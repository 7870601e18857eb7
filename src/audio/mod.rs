mod buffer;
mod decode;
mod peaks;
mod realign;
mod wav;
mod zero_crossing;

pub use buffer::SampleBuffer;
pub use decode::AudioDecoder;
pub use peaks::{Lod, PeakLevels, PeakPair};
pub use realign::{loop_start_frame, realign};
pub use wav::encode_wav;
pub use zero_crossing::find_nearest_zero_crossing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::DecodeError;

/// File extensions accepted for ingestion (lowercase)
pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["wav", "mp3", "aiff", "aif", "flac", "ogg", "m4a"];

/// Whether `path` looks like an audio file we can ingest
pub fn is_supported(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name == ".DS_Store" || path.components().any(|c| c.as_os_str() == "__MACOSX") {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// A decoded stem together with its render cache
#[derive(Debug, Clone)]
pub struct AudioAsset {
    /// File name including extension
    pub name: String,
    pub path: PathBuf,
    pub buffer: Arc<SampleBuffer>,
    pub peaks: Arc<PeakLevels>,
}

impl AudioAsset {
    /// Decode `path` and precompute its peak levels
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn load(path: PathBuf) -> Result<Self, DecodeError> {
        let buffer = AudioDecoder::decode(path.clone()).await?;
        debug!(
            sample_rate = buffer.sample_rate(),
            channels = buffer.channel_count(),
            duration_secs = buffer.duration_secs(),
            "Audio decoded"
        );

        let buffer = Arc::new(buffer);
        let peaks = {
            let buffer = Arc::clone(&buffer);
            tokio::task::spawn_blocking(move || PeakLevels::build(&buffer))
                .await
                .map_err(|e| DecodeError::Task(e.to_string()))?
        };

        Ok(Self::new(name_of(&path), path, buffer, Arc::new(peaks)))
    }

    /// Wrap an already decoded buffer, computing peaks inline
    pub fn from_buffer(name: impl Into<String>, buffer: SampleBuffer) -> Self {
        let name = name.into();
        let peaks = PeakLevels::build(&buffer);
        Self::new(name.clone(), PathBuf::from(name), Arc::new(buffer), Arc::new(peaks))
    }

    fn new(name: String, path: PathBuf, buffer: Arc<SampleBuffer>, peaks: Arc<PeakLevels>) -> Self {
        Self {
            name,
            path,
            buffer,
            peaks,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

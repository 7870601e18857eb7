use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum PhaseloopError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures turning an input file into a sample buffer
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported or unrecognized audio format: {0}")]
    Unsupported(String),

    #[error("No audio track found")]
    NoTrack,

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Decoded audio is empty")]
    Empty,

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("Invalid channel layout: {0}")]
    InvalidLayout(String),

    #[error("Decode task failed: {0}")]
    Task(String),
}

impl From<symphonia::core::errors::Error> for DecodeError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        use symphonia::core::errors::Error as SymphoniaError;

        match err {
            SymphoniaError::IoError(e) => DecodeError::Io(e),
            SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
            other => DecodeError::Codec(other.to_string()),
        }
    }
}

/// Failures while encoding or writing realigned audio
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("Manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Nothing to export")]
    NothingToExport,

    #[error("An export is already running")]
    Busy,

    #[error("Export task failed: {0}")]
    Task(String),
}

/// Playback errors
#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("No audio device available")]
    NoDevice,

    #[error("Audio sink error: {0}")]
    Sink(String),

    #[error("Playback started without a start time")]
    MissingStartTime,
}

/// TUI errors
#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for phaseloop operations
pub type Result<T> = std::result::Result<T, PhaseloopError>;

impl ExportError {
    /// Whether the user can simply try again
    pub fn is_transient(&self) -> bool {
        matches!(self, ExportError::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symphonia_io_error_maps_to_io() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: DecodeError = symphonia::core::errors::Error::IoError(io).into();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn test_busy_export_is_transient() {
        assert!(ExportError::Busy.is_transient());
        assert!(!ExportError::NothingToExport.is_transient());
    }

    #[test]
    fn test_domain_errors_convert_to_top_level() {
        let err: PhaseloopError = PlaybackError::MissingStartTime.into();
        assert!(err.to_string().contains("start time"));
    }
}

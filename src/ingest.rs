use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::audio::{is_supported, AudioAsset};
use crate::error::DecodeError;
use crate::session::{Assignments, TRACK_COUNT};

/// Files decoded at once per batch
const DECODE_CONCURRENCY: usize = 4;

/// Files that become one scene
#[derive(Debug, Clone, PartialEq)]
pub struct IngestBatch {
    /// Directory name, or "files" for loose inputs
    pub label: String,
    pub files: Vec<PathBuf>,
}

/// Outcome of decoding one batch
#[derive(Debug, Default)]
pub struct BatchResult {
    pub label: String,
    pub assignments: Assignments,
    /// Files that failed to decode, with the reason
    pub failures: Vec<(PathBuf, DecodeError)>,
    /// Decoded files left over once all tracks were taken
    pub dropped: Vec<String>,
}

impl BatchResult {
    pub fn has_audio(&self) -> bool {
        self.assignments.iter().any(Option::is_some)
    }
}

/// Group command-line inputs into batches.
///
/// Every directory is walked recursively and becomes its own batch; all
/// loose files together form one more batch, placed first. Unsupported files
/// are skipped and empty batches are dropped.
pub fn collect_batches(inputs: &[PathBuf]) -> Vec<IngestBatch> {
    let mut loose = Vec::new();
    let mut batches = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(input)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_supported(e.path()))
                .map(|e| e.into_path())
                .collect();
            files.sort();

            if files.is_empty() {
                warn!(dir = %input.display(), "No supported audio files in directory");
                continue;
            }
            batches.push(IngestBatch {
                label: dir_label(input),
                files,
            });
        } else if is_supported(input) {
            loose.push(input.clone());
        } else {
            warn!(path = %input.display(), "Skipping unsupported input");
        }
    }

    if !loose.is_empty() {
        batches.insert(
            0,
            IngestBatch {
                label: "files".to_string(),
                files: loose,
            },
        );
    }

    batches
}

fn dir_label(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}

/// Track index requested by a leading `N ` in the file name (1-based, 1..=8)
pub fn parse_track_number(name: &str) -> Option<usize> {
    let digits: String = name.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if !name[digits.len()..].starts_with(char::is_whitespace) {
        return None;
    }

    let number: usize = digits.parse().ok()?;
    (1..=TRACK_COUNT).contains(&number).then(|| number - 1)
}

/// Place assets on tracks.
///
/// Numbered files claim their track if it is still free; everything else
/// fills the first free track in order. Returns the assets that found no
/// track.
pub fn assign_tracks(assets: Vec<AudioAsset>) -> (Assignments, Vec<AudioAsset>) {
    let mut assignments: Assignments = Default::default();
    let mut unassigned = Vec::new();

    for asset in assets {
        match parse_track_number(&asset.name) {
            Some(track) if assignments[track].is_none() => assignments[track] = Some(asset),
            _ => unassigned.push(asset),
        }
    }

    let mut dropped = Vec::new();
    for asset in unassigned {
        match assignments.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => *slot = Some(asset),
            None => dropped.push(asset),
        }
    }

    (assignments, dropped)
}

/// Decode every file of a batch concurrently and assign the results.
///
/// A file that fails to decode is recorded and skipped; the rest of the
/// batch carries on.
#[instrument(skip_all, fields(batch = %batch.label, files = batch.files.len()))]
pub async fn load_batch(batch: IngestBatch) -> BatchResult {
    let results: Vec<(PathBuf, Result<AudioAsset, DecodeError>)> = stream::iter(batch.files)
        .map(|path| async move {
            let result = AudioAsset::load(path.clone()).await;
            (path, result)
        })
        .buffered(DECODE_CONCURRENCY)
        .collect()
        .await;

    let mut assets = Vec::new();
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(asset) => assets.push(asset),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not decode audio");
                failures.push((path, e));
            }
        }
    }

    let (assignments, dropped) = assign_tracks(assets);
    let dropped: Vec<String> = dropped.into_iter().map(|a| a.name).collect();
    for name in &dropped {
        warn!(file = %name, "All tracks taken, file dropped");
    }

    info!(
        assigned = assignments.iter().flatten().count(),
        failed = failures.len(),
        dropped = dropped.len(),
        "Batch decoded"
    );

    BatchResult {
        label: batch.label,
        assignments,
        failures,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{encode_wav, SampleBuffer};

    fn asset(name: &str) -> AudioAsset {
        AudioAsset::from_buffer(name, SampleBuffer::new(10, vec![vec![0.0; 10]]).unwrap())
    }

    fn names(assignments: &Assignments) -> Vec<Option<&str>> {
        assignments.iter().map(|a| a.as_ref().map(|a| a.name.as_str())).collect()
    }

    fn write_wav(path: &Path, frames: usize) {
        let buffer = SampleBuffer::new(1000, vec![vec![0.25; frames]]).unwrap();
        std::fs::write(path, encode_wav(&buffer).unwrap()).unwrap();
    }

    #[test]
    fn test_parse_track_number() {
        assert_eq!(parse_track_number("1 Kick.wav"), Some(0));
        assert_eq!(parse_track_number("08  Pad.wav"), Some(7));
        assert_eq!(parse_track_number("9 Extra.wav"), None);
        assert_eq!(parse_track_number("0 Zero.wav"), None);
        assert_eq!(parse_track_number("12Kick.wav"), None);
        assert_eq!(parse_track_number("Kick 1.wav"), None);
        assert_eq!(parse_track_number("3"), None);
    }

    #[test]
    fn test_numbered_files_claim_their_track() {
        let (assignments, dropped) = assign_tracks(vec![
            asset("Pad.wav"),
            asset("3 Bass.wav"),
            asset("1 Kick.wav"),
            asset("3 Other Bass.wav"),
        ]);

        assert_eq!(
            names(&assignments),
            vec![
                Some("1 Kick.wav"),
                Some("Pad.wav"),
                Some("3 Bass.wav"),
                Some("3 Other Bass.wav"),
                None,
                None,
                None,
                None
            ]
        );
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_files_beyond_eight_tracks_are_dropped() {
        let assets = (0..10).map(|i| asset(&format!("stem{}.wav", i))).collect();
        let (assignments, dropped) = assign_tracks(assets);
        assert!(assignments.iter().all(Option::is_some));
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped[0].name, "stem8.wav");
    }

    #[test]
    fn test_directories_become_separate_batches() {
        let dir = tempfile::tempdir().unwrap();
        let verse = dir.path().join("verse");
        let chorus = dir.path().join("chorus");
        std::fs::create_dir_all(verse.join("nested")).unwrap();
        std::fs::create_dir_all(&chorus).unwrap();
        write_wav(&verse.join("1 kick.wav"), 10);
        write_wav(&verse.join("nested/2 snare.WAV"), 10);
        std::fs::write(verse.join("notes.txt"), "not audio").unwrap();
        write_wav(&chorus.join("lead.flac"), 10);
        let loose = dir.path().join("loose.wav");
        write_wav(&loose, 10);

        let batches = collect_batches(&[verse.clone(), loose.clone(), chorus.clone()]);
        let labels: Vec<&str> = batches.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["files", "verse", "chorus"]);
        assert_eq!(batches[0].files, vec![loose]);
        assert_eq!(batches[1].files.len(), 2);
        assert_eq!(batches[2].files.len(), 1);
    }

    #[tokio::test]
    async fn test_load_batch_continues_past_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("2 good.wav");
        let bad = dir.path().join("bad.wav");
        write_wav(&good, 500);
        std::fs::write(&bad, b"RIFF garbage").unwrap();

        let result = load_batch(IngestBatch {
            label: "test".into(),
            files: vec![bad.clone(), good],
        })
        .await;

        assert!(result.has_audio());
        assert_eq!(result.assignments[1].as_ref().unwrap().name, "2 good.wav");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].0, bad);
    }

    #[test]
    fn test_batch_of_undecodable_files_has_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.mp3");
        std::fs::write(&bad, b"ID3 but nothing else").unwrap();

        let result = tokio_test::block_on(load_batch(IngestBatch {
            label: "broken".into(),
            files: vec![bad],
        }));

        assert!(!result.has_audio());
        assert_eq!(result.failures.len(), 1);
        assert!(result.dropped.is_empty());
    }
}

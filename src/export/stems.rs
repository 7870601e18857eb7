use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::ExportError;

use super::project::ExportProject;
use super::FormatEncoder;

/// Name of the manifest written next to the scene folders
pub const MANIFEST_FILE: &str = "session.json";

/// Writes one folder per scene holding its realigned WAVs, plus a JSON
/// manifest describing tempo, tracks, scenes and clips.
#[derive(Debug, Default, Clone, Copy)]
pub struct StemFolderEncoder;

impl FormatEncoder for StemFolderEncoder {
    fn name(&self) -> &'static str {
        "stems"
    }

    #[instrument(skip_all, fields(out_dir = %out_dir.display()))]
    fn write(&self, project: &ExportProject, out_dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(out_dir)?;

        for scene in &project.scenes {
            let scene_dir = out_dir.join(&scene.folder);
            fs::create_dir_all(&scene_dir)?;

            for clip in &scene.clips {
                let path = scene_dir.join(&clip.file_name);
                fs::write(&path, &clip.wav)?;
                debug!(path = %path.display(), bytes = clip.wav.len(), "Wrote clip");
            }
        }

        let manifest = serde_json::to_vec_pretty(project)?;
        fs::write(out_dir.join(MANIFEST_FILE), manifest)?;

        info!(
            scenes = project.scenes.len(),
            clips = project.clip_count(),
            "Stem folders written"
        );
        Ok(out_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportPlan, ExportScope};
    use crate::session::tests::assignments;
    use crate::session::Session;

    #[test]
    fn test_writes_scene_folders_and_manifest() {
        let mut session = Session::new();
        session.add_scene(assignments(&[(0, 1.0), (1, 0.5)]));
        session.add_scene(assignments(&[(0, 2.0)]));
        session.rename_scene(session.scenes()[1].id, "Big Chorus");

        let project = ExportPlan::from_session(&session, ExportScope::All, false)
            .unwrap()
            .render()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = StemFolderEncoder.write(&project, dir.path()).unwrap();

        assert!(out.join("Scene_1/realigned_1 stem.wav").is_file());
        assert!(out.join("Scene_1/realigned_2 stem.wav").is_file());
        assert!(out.join("Big_Chorus/realigned_1 stem.wav").is_file());

        let manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(out.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest["tempo_bpm"], 120.0);
        assert_eq!(manifest["scenes"][1]["name"], "Big Chorus");
        assert_eq!(manifest["scenes"][0]["color"], "#1e3a8a");
        assert_eq!(manifest["scenes"][0]["clips"].as_array().unwrap().len(), 2);
        // audio bytes live in the WAV files only
        assert!(manifest["scenes"][0]["clips"][0].get("wav").is_none());
    }

    #[test]
    fn test_wav_size_matches_duration() {
        let mut session = Session::new();
        session.add_scene(assignments(&[(0, 0.5)]));
        let project = ExportPlan::from_session(&session, ExportScope::All, false)
            .unwrap()
            .render()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        StemFolderEncoder.write(&project, dir.path()).unwrap();
        let bytes = fs::read(dir.path().join("Scene_1/realigned_1 stem.wav")).unwrap();
        // 50 mono frames
        assert_eq!(bytes.len(), 44 + 50 * 2);
    }
}

use serde::Serialize;
use tracing::{debug, instrument};

use crate::audio::{encode_wav, find_nearest_zero_crossing, realign, AudioAsset};
use crate::error::ExportError;
use crate::session::{GroupId, Session, TRACK_COUNT};

use super::tempo::{detect_tempo, duration_in_beats, whole_beats};
use super::ExportScope;

/// Folder-safe version of a scene name
pub fn folder_name(scene_name: &str) -> String {
    scene_name
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' { '_' } else { c })
        .collect()
}

/// Owned snapshot of what to export, taken on the UI side.
///
/// Assets are shared by `Arc`, so taking a plan is cheap; the heavy
/// realign and encode work happens later in [`ExportPlan::render`].
#[derive(Debug, Clone)]
pub struct ExportPlan {
    pub tempo_bpm: f64,
    pub scenes: Vec<PlannedScene>,
}

#[derive(Debug, Clone)]
pub struct PlannedScene {
    pub name: String,
    pub color_hex: &'static str,
    /// Final loop-start of the scene's group, snapped if requested
    pub loop_start: f64,
    pub clips: Vec<(usize, AudioAsset)>,
}

impl ExportPlan {
    /// Resolve scenes, per-group loop-starts and tempo for `scope`.
    ///
    /// With `snap`, each group's loop-start is moved to the nearest
    /// zero-crossing of the first asset in the group's first exported scene
    /// that has audio.
    pub fn from_session(session: &Session, scope: ExportScope, snap: bool) -> Result<Self, ExportError> {
        let scenes: Vec<_> = match scope {
            ExportScope::All => session.scenes().iter().collect(),
            ExportScope::Active => session.active_scene().into_iter().collect(),
        };
        let scenes: Vec<_> = scenes.into_iter().filter(|s| s.has_audio()).collect();
        if scenes.is_empty() {
            return Err(ExportError::NothingToExport);
        }

        let mut loop_starts: Vec<(GroupId, f64)> = Vec::new();
        for scene in &scenes {
            if loop_starts.iter().any(|(id, _)| *id == scene.group) {
                continue;
            }
            let Some(group) = session.group(scene.group) else {
                continue;
            };

            let mut loop_start = group.loop_start;
            if snap {
                // `scene` is the first exported scene of this group with audio
                if let Some(asset) = scene.first_asset() {
                    let snapped = find_nearest_zero_crossing(&asset.buffer, loop_start);
                    debug!(from = loop_start, to = snapped, "Snapped group loop-start");
                    loop_start = snapped;
                }
            }
            loop_starts.push((scene.group, loop_start));
        }

        let tempo_bpm = detect_tempo(
            scenes
                .iter()
                .flat_map(|s| s.assignments())
                .map(|(_, asset)| asset.name.as_str()),
        );

        let scenes = scenes
            .into_iter()
            .map(|scene| PlannedScene {
                name: scene.name.clone(),
                color_hex: session.group(scene.group).map_or("#000000", |g| g.color.hex),
                loop_start: loop_starts
                    .iter()
                    .find(|(id, _)| *id == scene.group)
                    .map_or(0.0, |(_, t)| *t),
                clips: scene.assignments().map(|(i, a)| (i, a.clone())).collect(),
            })
            .collect();

        Ok(Self { tempo_bpm, scenes })
    }

    /// Realign and WAV-encode every clip
    #[instrument(skip_all, fields(scenes = self.scenes.len(), tempo_bpm = self.tempo_bpm))]
    pub fn render(&self) -> Result<ExportProject, ExportError> {
        let tracks = (0..TRACK_COUNT)
            .filter(|i| self.scenes.iter().any(|s| s.clips.iter().any(|(t, _)| t == i)))
            .map(|index| ExportTrack {
                index,
                name: format!("Track {}", index + 1),
            })
            .collect();

        let scenes = self
            .scenes
            .iter()
            .map(|scene| {
                let clips = scene
                    .clips
                    .iter()
                    .map(|(track, asset)| self.render_clip(*track, asset, scene.loop_start))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(ExportScene {
                    name: scene.name.clone(),
                    folder: folder_name(&scene.name),
                    color: scene.color_hex,
                    loop_start_secs: scene.loop_start,
                    clips,
                })
            })
            .collect::<Result<Vec<_>, ExportError>>()?;

        Ok(ExportProject {
            tempo_bpm: self.tempo_bpm,
            tracks,
            scenes,
        })
    }

    fn render_clip(&self, track: usize, asset: &AudioAsset, loop_start: f64) -> Result<ExportClip, ExportError> {
        let rotated = realign(&asset.buffer, loop_start);
        let wav = encode_wav(&rotated)?;
        let duration_secs = rotated.duration_secs();

        Ok(ExportClip {
            track,
            source_name: asset.name.clone(),
            file_name: format!("realigned_{}.wav", asset.stem()),
            sample_rate: rotated.sample_rate(),
            channels: rotated.channel_count(),
            duration_secs,
            duration_beats: duration_in_beats(duration_secs, self.tempo_bpm),
            whole_beats: whole_beats(duration_secs, self.tempo_bpm),
            wav,
        })
    }
}

/// Everything a format encoder needs: tempo, tracks, and per-scene clips
/// carrying their realigned WAV bytes
#[derive(Debug, Clone, Serialize)]
pub struct ExportProject {
    pub tempo_bpm: f64,
    pub tracks: Vec<ExportTrack>,
    pub scenes: Vec<ExportScene>,
}

impl ExportProject {
    pub fn clip_count(&self) -> usize {
        self.scenes.iter().map(|s| s.clips.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportTrack {
    pub index: usize,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportScene {
    pub name: String,
    pub folder: String,
    /// Group color as `#rrggbb`
    pub color: &'static str,
    pub loop_start_secs: f64,
    pub clips: Vec<ExportClip>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportClip {
    pub track: usize,
    pub source_name: String,
    pub file_name: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    pub duration_beats: f64,
    pub whole_beats: f64,
    #[serde(skip)]
    pub wav: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleBuffer;
    use crate::session::tests::assignments;
    use crate::session::Assignments;

    #[test]
    fn test_folder_name_replaces_spaces_and_slashes() {
        assert_eq!(folder_name("Scene 1"), "Scene_1");
        assert_eq!(folder_name("Verse/Chorus  A"), "Verse_Chorus__A");
    }

    #[test]
    fn test_empty_session_has_nothing_to_export() {
        let session = Session::new();
        let result = ExportPlan::from_session(&session, ExportScope::All, false);
        assert!(matches!(result, Err(ExportError::NothingToExport)));
    }

    #[test]
    fn test_scope_selects_scenes() {
        let mut session = Session::new();
        session.add_scene(assignments(&[(0, 1.0)]));
        session.add_scene(assignments(&[(1, 2.0)]));

        let all = ExportPlan::from_session(&session, ExportScope::All, false).unwrap();
        let active = ExportPlan::from_session(&session, ExportScope::Active, false).unwrap();
        assert_eq!(all.scenes.len(), 2);
        assert_eq!(active.scenes.len(), 1);
        assert_eq!(active.scenes[0].name, "Scene 2");
    }

    #[test]
    fn test_render_rotates_each_clip_by_group_loop_start() {
        let mut session = Session::new();
        // 4 frames at 4 Hz, ramp so rotation is visible after quantizing
        let buffer = SampleBuffer::new(4, vec![vec![0.0, 0.25, 0.5, 0.75]]).unwrap();
        let mut scene: Assignments = Default::default();
        scene[0] = Some(AudioAsset::from_buffer("Loop 96 BPM.wav", buffer));
        session.add_scene(scene);
        session.set_active_loop_start(0.5);

        let project = ExportPlan::from_session(&session, ExportScope::All, false)
            .unwrap()
            .render()
            .unwrap();

        assert_eq!(project.tempo_bpm, 96.0);
        assert_eq!(project.tracks.len(), 1);
        let clip = &project.scenes[0].clips[0];
        assert_eq!(clip.file_name, "realigned_Loop 96 BPM.wav");
        assert_eq!(clip.duration_secs, 1.0);
        assert_eq!(clip.duration_beats, 1.6);
        assert_eq!(clip.whole_beats, 2.0);
        assert_eq!(clip.wav.len(), 44 + 4 * 2);

        // first frame is now the old frame 2 (0.5 -> 16383)
        let first = i16::from_le_bytes([clip.wav[44], clip.wav[45]]);
        assert_eq!(first, 16383);
    }

    #[test]
    fn test_snap_uses_first_asset_of_group() {
        let mut session = Session::new();
        // sign change between frames 49 and 50 of 100 at 100 Hz
        let samples: Vec<f32> = (0..100).map(|i| if i < 50 { 0.5 } else { -0.1 }).collect();
        let mut scene: Assignments = Default::default();
        scene[2] = Some(AudioAsset::from_buffer("pad.wav", SampleBuffer::new(100, vec![samples]).unwrap()));
        session.add_scene(scene);
        session.set_active_loop_start(0.49);

        let unsnapped = ExportPlan::from_session(&session, ExportScope::All, false).unwrap();
        let snapped = ExportPlan::from_session(&session, ExportScope::All, true).unwrap();
        assert_eq!(unsnapped.scenes[0].loop_start, 0.49);
        assert_eq!(snapped.scenes[0].loop_start, 0.5);
        // planning never touches the session
        assert_eq!(session.active_loop_start(), 0.49);
    }

    #[test]
    fn test_scenes_without_audio_are_skipped() {
        let mut session = Session::new();
        session.add_scene(Default::default());
        session.add_scene(assignments(&[(0, 1.0)]));
        let plan = ExportPlan::from_session(&session, ExportScope::All, false).unwrap();
        assert_eq!(plan.scenes.len(), 1);
        assert_eq!(plan.scenes[0].name, "Scene 2");
    }
}

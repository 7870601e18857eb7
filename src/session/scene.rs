use serde::Serialize;

use crate::audio::AudioAsset;

use super::group::GroupId;
use super::track::TRACK_COUNT;

/// Stable identity of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SceneId(pub(crate) u64);

/// Per-track audio for one scene, at most one asset per track
pub type Assignments = [Option<AudioAsset>; TRACK_COUNT];

/// A named set of track assignments
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub group: GroupId,
    assignments: Assignments,
    master_duration: f64,
}

impl Scene {
    pub(crate) fn new(id: SceneId, name: String, group: GroupId, assignments: Assignments) -> Self {
        let master_duration = assignments
            .iter()
            .flatten()
            .map(AudioAsset::duration_secs)
            .fold(0.0, f64::max);

        Self {
            id,
            name,
            group,
            assignments,
            master_duration,
        }
    }

    /// Longest assigned duration; 0 for a scene without audio
    pub fn master_duration(&self) -> f64 {
        self.master_duration
    }

    pub fn assignment(&self, track: usize) -> Option<&AudioAsset> {
        self.assignments.get(track).and_then(Option::as_ref)
    }

    /// Assigned tracks in track order
    pub fn assignments(&self) -> impl Iterator<Item = (usize, &AudioAsset)> {
        self.assignments
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (i, a)))
    }

    pub fn has_audio(&self) -> bool {
        self.assignments.iter().any(Option::is_some)
    }

    /// First assigned asset in track order
    pub fn first_asset(&self) -> Option<&AudioAsset> {
        self.assignments().next().map(|(_, asset)| asset)
    }
}

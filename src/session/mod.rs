mod group;
mod scene;
mod track;

pub use group::{Group, GroupId, GROUP_COLORS};
pub use scene::{Assignments, Scene, SceneId};
pub use track::{default_tracks, Track, TRACK_COUNT};

use tracing::{debug, info};

/// All in-memory state of one editing session.
///
/// Owns the fixed track slots, the ordered scenes and the groups that
/// partition them into contiguous runs. Every scene references exactly one
/// live group; a group is dropped as soon as its last scene goes away.
#[derive(Debug)]
pub struct Session {
    tracks: Vec<Track>,
    scenes: Vec<Scene>,
    groups: Vec<Group>,
    active_scene: Option<SceneId>,
    color_cursor: usize,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            tracks: default_tracks(),
            scenes: Vec::new(),
            groups: Vec::new(),
            active_scene: None,
            color_cursor: 0,
            next_id: 1,
        }
    }

    // --- tracks ---

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn any_soloed(&self) -> bool {
        self.tracks.iter().any(|t| t.soloed)
    }

    pub fn toggle_mute(&mut self, index: usize) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.muted = !track.muted;
            debug!(track = index, muted = track.muted, "Mute toggled");
        }
        self.apply_gains();
    }

    pub fn toggle_solo(&mut self, index: usize) {
        if let Some(track) = self.tracks.get_mut(index) {
            track.soloed = !track.soloed;
            debug!(track = index, soloed = track.soloed, "Solo toggled");
        }
        self.apply_gains();
    }

    /// Gain a track should play at right now: unity only when it has audio
    /// in the active scene and is audible under the solo/mute rule.
    pub fn target_gain(&self, index: usize) -> f32 {
        let has_audio = self
            .active_scene()
            .is_some_and(|scene| scene.assignment(index).is_some());
        let audible = self
            .track(index)
            .is_some_and(|t| t.is_audible(self.any_soloed()));

        if has_audio && audible {
            1.0
        } else {
            0.0
        }
    }

    /// Push every track's target gain to its gain control
    pub fn apply_gains(&self) {
        for track in &self.tracks {
            track.gain().set(self.target_gain(track.index()));
        }
    }

    // --- scenes ---

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn scene_index(&self, id: SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == id)
    }

    pub fn active_scene_id(&self) -> Option<SceneId> {
        self.active_scene
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.active_scene.and_then(|id| self.scene(id))
    }

    /// Append a scene built from one ingestion batch and make it active.
    ///
    /// The scene joins the last scene's group, or a fresh group if it is the
    /// first. Its group then takes the first group's loop-start so a new
    /// batch lines up with what is already loaded.
    pub fn add_scene(&mut self, assignments: Assignments) -> SceneId {
        let group = match self.scenes.last() {
            Some(last) => last.group,
            None => self.create_group(0.0),
        };

        let id = SceneId(self.allocate_id());
        let name = format!("Scene {}", self.scenes.len() + 1);
        let scene = Scene::new(id, name, group, assignments);

        info!(
            scene = %scene.name,
            tracks = scene.assignments().count(),
            master_duration = scene.master_duration(),
            "Scene added"
        );

        self.scenes.push(scene);

        let first_loop_start = self
            .scenes
            .first()
            .and_then(|s| self.group(s.group))
            .map(|g| g.loop_start);
        if let (Some(loop_start), Some(group)) = (first_loop_start, self.group_mut(group)) {
            group.loop_start = loop_start;
        }

        self.active_scene = Some(id);
        self.apply_gains();
        id
    }

    /// Make `id` the active scene. Returns false if it does not exist.
    pub fn select_scene(&mut self, id: SceneId) -> bool {
        if self.scene(id).is_none() {
            return false;
        }
        self.active_scene = Some(id);
        self.apply_gains();
        true
    }

    /// Scene `offset` positions away from the active one, wrapping around
    pub fn neighbor_scene(&self, offset: isize) -> Option<SceneId> {
        let index = self.active_scene.and_then(|id| self.scene_index(id))?;
        let len = self.scenes.len() as isize;
        let target = (index as isize + offset).rem_euclid(len) as usize;
        self.scenes.get(target).map(|s| s.id)
    }

    /// Rename a scene; blank names are ignored
    pub fn rename_scene(&mut self, id: SceneId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) {
            scene.name = name.to_string();
        }
    }

    /// Move the scenes after `id` that share its group into a new group.
    ///
    /// The new group copies the loop-start and takes the next palette color.
    /// Splitting after the last scene does nothing.
    pub fn split_group_after(&mut self, id: SceneId) {
        let Some(index) = self.scene_index(id) else {
            return;
        };
        if index + 1 >= self.scenes.len() {
            return;
        }

        let original = self.scenes[index].group;
        let Some(loop_start) = self.group(original).map(|g| g.loop_start) else {
            return;
        };
        if self.scenes[index + 1].group != original {
            return;
        }

        let new_group = self.create_group(loop_start);
        for scene in self.scenes[index + 1..].iter_mut() {
            if scene.group != original {
                break;
            }
            scene.group = new_group;
        }

        debug!(after = index, "Group split");
    }

    /// Remove a scene. If it was active, the previous one takes over.
    pub fn delete_scene(&mut self, id: SceneId) {
        let Some(index) = self.scene_index(id) else {
            return;
        };

        let removed = self.scenes.remove(index);
        self.drop_group_if_empty(removed.group);

        if self.scenes.is_empty() {
            self.active_scene = None;
        } else if self.active_scene == Some(id) {
            let next = index.saturating_sub(1);
            self.active_scene = Some(self.scenes[next].id);
        }

        info!(scene = %removed.name, "Scene deleted");
        self.apply_gains();
    }

    /// Move `dragged` next to `target` (after it when `drop_after`).
    ///
    /// The moved scene joins the target's group.
    pub fn reorder_scene(&mut self, dragged: SceneId, target: SceneId, drop_after: bool) {
        if dragged == target {
            return;
        }
        let Some(from) = self.scene_index(dragged) else {
            return;
        };
        if self.scene_index(target).is_none() {
            return;
        }

        let mut scene = self.scenes.remove(from);
        let Some(mut to) = self.scene_index(target) else {
            return;
        };
        let original_group = scene.group;
        scene.group = self.scenes[to].group;
        if drop_after {
            to += 1;
        }
        self.scenes.insert(to, scene);

        self.drop_group_if_empty(original_group);
    }

    /// Drop every scene and group and clear mute/solo
    pub fn reset(&mut self) {
        self.scenes.clear();
        self.groups.clear();
        self.active_scene = None;
        self.color_cursor = 0;
        for track in &mut self.tracks {
            track.muted = false;
            track.soloed = false;
        }
        self.apply_gains();
        info!("Session reset");
    }

    // --- groups ---

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn group_of(&self, scene: SceneId) -> Option<&Group> {
        self.scene(scene).and_then(|s| self.group(s.group))
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.active_scene.and_then(|id| self.group_of(id))
    }

    /// Active group's loop-start as stored. Scenes of one group can differ in
    /// length, so each track reduces this into its own duration.
    pub fn group_loop_start(&self) -> f64 {
        self.active_group().map_or(0.0, |g| g.loop_start)
    }

    /// Active group's loop-start reduced into the active scene's duration
    pub fn active_loop_start(&self) -> f64 {
        let master = self.active_scene().map_or(0.0, Scene::master_duration);
        wrap_loop_start(self.group_loop_start(), master)
    }

    /// Overwrite the active group's loop-start, wrapped into the active scene
    pub fn set_active_loop_start(&mut self, secs: f64) {
        let master = self.active_scene().map_or(0.0, Scene::master_duration);
        let wrapped = wrap_loop_start(secs, master);
        let Some(group) = self.active_group().map(|g| g.id) else {
            return;
        };
        if let Some(group) = self.group_mut(group) {
            group.loop_start = wrapped;
        }
    }

    fn create_group(&mut self, loop_start: f64) -> GroupId {
        let id = GroupId(self.allocate_id());
        let color = GROUP_COLORS[self.color_cursor];
        self.color_cursor = (self.color_cursor + 1) % GROUP_COLORS.len();
        self.groups.push(Group {
            id,
            loop_start,
            color,
        });
        id
    }

    fn drop_group_if_empty(&mut self, id: GroupId) {
        if !self.scenes.iter().any(|s| s.group == id) {
            self.groups.retain(|g| g.id != id);
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Reduce `secs` into `[0, master)`. Leaves it alone when there is no
/// duration to wrap against.
pub fn wrap_loop_start(secs: f64, master: f64) -> f64 {
    if !secs.is_finite() {
        return 0.0;
    }
    if master <= 0.0 {
        return secs;
    }
    let wrapped = secs.rem_euclid(master);
    // rem_euclid can round up to exactly `master` for tiny negative inputs
    if wrapped >= master {
        0.0
    } else {
        wrapped
    }
}

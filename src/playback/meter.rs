use crate::session::{Track, TRACK_COUNT};

/// Weight of a rising level per frame
pub const METER_ATTACK: f32 = 0.6;
/// Decay multiplier of a falling level per frame
pub const METER_RELEASE: f32 = 0.95;
/// Below this every meter counts as settled
pub const METER_FLOOR: f32 = 0.001;

/// Smoothed peak levels for display, one per track
#[derive(Debug, Clone, Default)]
pub struct MeterBank {
    levels: [f32; TRACK_COUNT],
}

impl MeterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain each track's meter tap and apply ballistics
    pub fn update(&mut self, tracks: &[Track]) {
        for track in tracks {
            if let Some(level) = self.levels.get_mut(track.index()) {
                *level = smooth(*level, track.meter().take());
            }
        }
    }

    pub fn level(&self, track: usize) -> f32 {
        self.levels.get(track).copied().unwrap_or(0.0)
    }

    /// Whether any meter is still visibly moving
    pub fn is_active(&self) -> bool {
        self.levels.iter().any(|&l| l > METER_FLOOR)
    }

    pub fn clear(&mut self) {
        self.levels = [0.0; TRACK_COUNT];
    }
}

/// One frame of meter ballistics: fast attack, slow exponential release
pub fn smooth(previous: f32, current: f32) -> f32 {
    if current > previous {
        previous * (1.0 - METER_ATTACK) + current * METER_ATTACK
    } else {
        (previous * METER_RELEASE).max(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::default_tracks;

    #[test]
    fn test_attack_and_release() {
        assert!((smooth(0.0, 1.0) - 0.6).abs() < 1e-6);
        assert!((smooth(0.6, 1.0) - 0.84).abs() < 1e-6);
        assert!((smooth(1.0, 0.0) - 0.95).abs() < 1e-6);
        // release never drops below the live level
        assert_eq!(smooth(0.5, 0.49), 0.49);
    }

    #[test]
    fn test_bank_decays_to_idle() {
        let tracks = default_tracks();
        let mut bank = MeterBank::new();

        tracks[3].meter().record(0.9);
        bank.update(&tracks);
        assert!(bank.level(3) > 0.5);
        assert!(bank.is_active());

        let mut frames = 0;
        while bank.is_active() {
            bank.update(&tracks);
            frames += 1;
            assert!(frames < 1000, "meters never settled");
        }
        assert_eq!(bank.level(0), 0.0);
    }
}

use crate::playback::{GainControl, MeterTap};

/// Number of track slots; fixed for the life of the process
pub const TRACK_COUNT: usize = 8;

/// One channel strip
#[derive(Debug, Clone)]
pub struct Track {
    index: usize,
    pub muted: bool,
    pub soloed: bool,
    gain: GainControl,
    meter: MeterTap,
}

impl Track {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            muted: false,
            soloed: false,
            gain: GainControl::new(0.0),
            meter: MeterTap::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> String {
        format!("Track {}", self.index + 1)
    }

    /// Audible under the solo/mute rule, given whether any track is soloed
    pub fn is_audible(&self, any_soloed: bool) -> bool {
        if any_soloed {
            self.soloed
        } else {
            !self.muted
        }
    }

    pub fn gain(&self) -> &GainControl {
        &self.gain
    }

    pub fn meter(&self) -> &MeterTap {
        &self.meter
    }
}

/// The eight fixed track slots
pub fn default_tracks() -> Vec<Track> {
    (0..TRACK_COUNT).map(Track::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solo_overrides_mute() {
        let mut track = Track::new(0);
        track.muted = true;
        track.soloed = true;
        assert!(track.is_audible(true));
        assert!(!track.is_audible(false));
    }

    #[test]
    fn test_unsoloed_track_is_silent_when_another_is_soloed() {
        let track = Track::new(3);
        assert!(!track.is_audible(true));
        assert!(track.is_audible(false));
        assert_eq!(track.name(), "Track 4");
    }
}

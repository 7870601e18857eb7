use std::sync::LazyLock;

use regex::Regex;

/// Tempo used when no file name carries one
pub const DEFAULT_BPM: f64 = 120.0;

/// `NN BPM`, `NNN.N bpm`, `128BPM`... anywhere in a name
static BPM_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9]{2,3}(?:\.[0-9]+)?)\s*bpm").ok());

/// Tempo written into a file name, taken from the leftmost match of
/// [`BPM_PATTERN`]
pub fn bpm_from_name(name: &str) -> Option<f64> {
    let pattern = BPM_PATTERN.as_ref()?;
    let captures = pattern.captures(name)?;
    captures.get(1)?.as_str().parse().ok()
}

/// First tempo found across `names`, or [`DEFAULT_BPM`]
pub fn detect_tempo<'a>(names: impl IntoIterator<Item = &'a str>) -> f64 {
    names
        .into_iter()
        .find_map(bpm_from_name)
        .unwrap_or(DEFAULT_BPM)
}

/// Length in beats of `secs` at `bpm`
pub fn duration_in_beats(secs: f64, bpm: f64) -> f64 {
    secs * bpm / 60.0
}

/// [`duration_in_beats`] rounded to a whole beat
pub fn whole_beats(secs: f64, bpm: f64) -> f64 {
    duration_in_beats(secs, bpm).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_common_spellings() {
        assert_eq!(bpm_from_name("Drums 124 BPM.wav"), Some(124.0));
        assert_eq!(bpm_from_name("bass_90bpm.wav"), Some(90.0));
        assert_eq!(bpm_from_name("Pad 87.5 Bpm.flac"), Some(87.5));
        assert_eq!(bpm_from_name("lead-140  BPM"), Some(140.0));
    }

    #[test]
    fn test_rejects_names_without_tempo() {
        assert_eq!(bpm_from_name("1 Kick.wav"), None);
        assert_eq!(bpm_from_name("Take 120.wav"), None);
        assert_eq!(bpm_from_name("5 BPM.wav"), None);
        assert_eq!(bpm_from_name("bpm.wav"), None);
    }

    #[test]
    fn test_suffix_must_follow_the_number() {
        assert_eq!(bpm_from_name("Drums 128 BpM.wav"), Some(128.0));
        assert_eq!(bpm_from_name("Loop 128.bpm"), None);
    }

    #[test]
    fn test_long_numbers_match_their_tail() {
        assert_eq!(bpm_from_name("1205 BPM"), Some(205.0));
    }

    #[test]
    fn test_first_match_wins_with_default() {
        let names = ["1 Kick.wav", "2 Bass 128 BPM.wav", "3 Keys 100 BPM.wav"];
        assert_eq!(detect_tempo(names), 128.0);
        assert_eq!(detect_tempo(["a.wav", "b.wav"]), DEFAULT_BPM);
    }

    #[test]
    fn test_beats_from_seconds() {
        assert_eq!(duration_in_beats(8.0, 120.0), 16.0);
        assert!((duration_in_beats(7.9, 120.0) - 15.8).abs() < 1e-9);
        assert_eq!(whole_beats(7.9, 120.0), 16.0);
    }
}

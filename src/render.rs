//! Terminal-independent drawing data: what each waveform column, loop
//! marker and ruler tick should show for the current view.

use crate::audio::{AudioAsset, Lod, PeakPair};

/// Subdivisions across the visible window of the ruler
pub const RULER_DIVISIONS: usize = 16;

/// Glyphs from silence to full scale
const LEVEL_GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// The slice of a scene currently on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub loop_start: f64,
    pub visible: f64,
    pub master: f64,
    pub zoom: f64,
    pub width: usize,
}

impl View {
    fn column_secs(&self) -> f64 {
        self.visible / self.width as f64
    }
}

/// Min/max of each screen column for `asset`.
///
/// Column 0 starts at the loop-start; time wraps around the asset's own
/// duration, so shorter tracks repeat across the window.
pub fn column_peaks(asset: &AudioAsset, view: &View) -> Vec<PeakPair> {
    let peaks = asset.peaks.get(Lod::for_zoom(view.zoom));
    let duration = asset.duration_secs();
    if peaks.is_empty() || duration <= 0.0 || view.width == 0 || view.visible <= 0.0 {
        return vec![PeakPair::default(); view.width];
    }

    let len = peaks.len();
    let peaks_per_sec = len as f64 / duration;
    let per_column = ((view.column_secs() * peaks_per_sec).ceil() as usize).max(1);

    (0..view.width)
        .map(|x| {
            let t = (view.loop_start + x as f64 * view.column_secs()).rem_euclid(duration);
            let start = ((t / duration) * len as f64).floor() as usize;
            (start..start + per_column)
                .map(|i| peaks[i % len])
                .reduce(PeakPair::merge)
                .unwrap_or_default()
        })
        .collect()
}

/// Columns where a track shorter than the scene wraps back to its start
pub fn loop_markers(duration: f64, view: &View) -> Vec<usize> {
    if duration <= 0.0 || duration >= view.master || view.visible <= 0.0 || view.width == 0 {
        return Vec::new();
    }

    let columns_per_sec = view.width as f64 / view.visible;
    let step = duration * columns_per_sec;
    let mut x = (duration - view.loop_start.rem_euclid(duration)) * columns_per_sec;

    let mut markers = Vec::new();
    while x < view.width as f64 {
        markers.push(x.floor() as usize);
        x += step;
    }
    markers
}

/// Ruler tick prominence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickWeight {
    Quarter,
    Eighth,
    Sixteenth,
}

impl TickWeight {
    pub fn glyph(self) -> char {
        match self {
            TickWeight::Quarter => '▆',
            TickWeight::Eighth => '▄',
            TickWeight::Sixteenth => '▂',
        }
    }
}

/// `RULER_DIVISIONS + 1` ticks across `width` columns, the last one pinned
/// to the final column
pub fn ruler_ticks(width: usize) -> Vec<(usize, TickWeight)> {
    if width == 0 {
        return Vec::new();
    }
    (0..=RULER_DIVISIONS)
        .map(|i| {
            let x = if i == RULER_DIVISIONS {
                width - 1
            } else {
                i * width / RULER_DIVISIONS
            };
            let weight = if i % 4 == 0 {
                TickWeight::Quarter
            } else if i % 2 == 0 {
                TickWeight::Eighth
            } else {
                TickWeight::Sixteenth
            };
            (x, weight)
        })
        .collect()
}

/// Block glyph for a column's peak amplitude
pub fn level_glyph(pair: PeakPair) -> char {
    amplitude_glyph(pair.min.abs().max(pair.max.abs()))
}

/// Block glyph for a level in `[0, 1]`
pub fn amplitude_glyph(level: f32) -> char {
    let steps = (LEVEL_GLYPHS.len() - 1) as f32;
    let index = (level.clamp(0.0, 1.0) * steps).round() as usize;
    LEVEL_GLYPHS[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleBuffer;

    fn view(loop_start: f64, visible: f64, master: f64, width: usize) -> View {
        View {
            loop_start,
            visible,
            master,
            zoom: master / visible,
            width,
        }
    }

    /// 1024 Hz mono, one 1024-frame coarse block per second
    fn stepped(seconds: &[f32]) -> AudioAsset {
        let samples = seconds.iter().flat_map(|&v| std::iter::repeat(v).take(1024)).collect();
        AudioAsset::from_buffer("steps.wav", SampleBuffer::new(1024, vec![samples]).unwrap())
    }

    #[test]
    fn test_columns_start_at_loop_start() {
        let asset = stepped(&[0.1, 0.2, 0.3, 0.4]);
        let columns = column_peaks(&asset, &view(2.0, 4.0, 4.0, 4));
        let maxes: Vec<f32> = columns.iter().map(|p| p.max).collect();
        assert_eq!(maxes, vec![0.3, 0.4, 0.1, 0.2]);
    }

    #[test]
    fn test_shorter_track_repeats_across_window() {
        let asset = stepped(&[0.5, 0.25]);
        let columns = column_peaks(&asset, &view(0.0, 4.0, 4.0, 4));
        let maxes: Vec<f32> = columns.iter().map(|p| p.max).collect();
        assert_eq!(maxes, vec![0.5, 0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_wide_columns_merge_blocks() {
        let asset = stepped(&[0.1, -0.6, 0.3, 0.2]);
        let columns = column_peaks(&asset, &view(0.0, 4.0, 4.0, 2));
        assert_eq!(columns[0], PeakPair { min: -0.6, max: 0.1 });
        assert_eq!(columns[1], PeakPair { min: 0.2, max: 0.3 });
    }

    #[test]
    fn test_zero_width_view() {
        let asset = stepped(&[0.1]);
        assert!(column_peaks(&asset, &view(0.0, 1.0, 1.0, 0)).is_empty());
    }

    #[test]
    fn test_loop_markers_for_shorter_track() {
        // 1s track in a 4s scene, 40 columns, loop-start 0.5
        let markers = loop_markers(1.0, &view(0.5, 4.0, 4.0, 40));
        assert_eq!(markers, vec![5, 15, 25, 35]);
    }

    #[test]
    fn test_no_markers_for_full_length_track() {
        assert!(loop_markers(4.0, &view(0.0, 4.0, 4.0, 40)).is_empty());
    }

    #[test]
    fn test_ruler_ticks() {
        let ticks = ruler_ticks(64);
        assert_eq!(ticks.len(), RULER_DIVISIONS + 1);
        assert_eq!(ticks[0], (0, TickWeight::Quarter));
        assert_eq!(ticks[1], (4, TickWeight::Sixteenth));
        assert_eq!(ticks[2], (8, TickWeight::Eighth));
        assert_eq!(ticks[16], (63, TickWeight::Quarter));
    }

    #[test]
    fn test_level_glyph_scale() {
        assert_eq!(amplitude_glyph(0.0), ' ');
        assert_eq!(amplitude_glyph(1.0), '█');
        assert_eq!(amplitude_glyph(2.0), '█');
        assert_eq!(level_glyph(PeakPair { min: -0.5, max: 0.1 }), '▄');
    }
}

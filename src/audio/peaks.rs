use super::buffer::SampleBuffer;

/// Min/max envelope of one block of samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakPair {
    pub min: f32,
    pub max: f32,
}

impl PeakPair {
    /// Widen this pair to also cover `other`
    pub fn merge(self, other: PeakPair) -> PeakPair {
        PeakPair {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Waveform level of detail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lod {
    Coarse,
    Medium,
    Fine,
    Superfine,
}

impl Lod {
    pub const ALL: [Lod; 4] = [Lod::Coarse, Lod::Medium, Lod::Fine, Lod::Superfine];

    /// Samples per peak pair
    pub fn block_size(self) -> usize {
        match self {
            Lod::Coarse => 1024,
            Lod::Medium => 256,
            Lod::Fine => 64,
            Lod::Superfine => 8,
        }
    }

    /// Coarsest level that still resolves detail at `zoom`
    pub fn for_zoom(zoom: f64) -> Lod {
        if zoom > 30.0 {
            Lod::Superfine
        } else if zoom > 15.0 {
            Lod::Fine
        } else if zoom > 4.0 {
            Lod::Medium
        } else {
            Lod::Coarse
        }
    }

    fn index(self) -> usize {
        match self {
            Lod::Coarse => 0,
            Lod::Medium => 1,
            Lod::Fine => 2,
            Lod::Superfine => 3,
        }
    }
}

/// Min/max of every `block_size` samples of channel 0, including the final
/// partial block.
pub fn compute_peaks(buffer: &SampleBuffer, block_size: usize) -> Vec<PeakPair> {
    let block_size = block_size.max(1);

    buffer
        .channel(0)
        .chunks(block_size)
        .map(|block| {
            let first = PeakPair {
                min: block[0],
                max: block[0],
            };
            block[1..].iter().fold(first, |acc, &s| PeakPair {
                min: acc.min.min(s),
                max: acc.max.max(s),
            })
        })
        .collect()
}

/// Precomputed peaks for every [`Lod`], built once per asset at ingestion
#[derive(Debug, Clone)]
pub struct PeakLevels {
    levels: [Vec<PeakPair>; 4],
}

impl PeakLevels {
    pub fn build(buffer: &SampleBuffer) -> Self {
        Self {
            levels: Lod::ALL.map(|lod| compute_peaks(buffer, lod.block_size())),
        }
    }

    pub fn get(&self, lod: Lod) -> &[PeakPair] {
        &self.levels[lod.index()]
    }
}

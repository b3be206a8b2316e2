// src/scale.rs

use crate::model::{Bin, MAX_BINS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_GAMMA: f64 = 2.0;
pub const MIN_GAMMA: f64 = 1.0;
pub const MAX_GAMMA: f64 = 6.0;

/// Transfer function from a line's count to its heat
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Proportional to the count above the file minimum
    Linear,
    /// Compresses outliers so a few hot lines don't wash out the rest
    #[default]
    Logarithmic,
    /// Linear raised to `gamma`, emphasizing the hottest lines
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleConfig {
    pub mode: ScaleMode,
    gamma: f64,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self::new(ScaleMode::default(), DEFAULT_GAMMA)
    }
}

impl ScaleConfig {
    /// Non-finite gamma falls back to the default, anything else is clamped to `[1, 6]`.
    pub fn new(mode: ScaleMode, gamma: f64) -> Self {
        let gamma = if gamma.is_finite() { gamma } else { DEFAULT_GAMMA };
        Self {
            mode,
            gamma: gamma.clamp(MIN_GAMMA, MAX_GAMMA),
        }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

/// Lines grouped by heat bin, so a renderer can draw one batch per bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinAssignment {
    line_bins: Vec<Bin>,
    groups: BTreeMap<Bin, Vec<usize>>,
}

impl BinAssignment {
    /// Bin of a zero-based line
    pub fn bin_of(&self, line0: usize) -> Option<Bin> {
        self.line_bins.get(line0).copied()
    }

    pub fn line_bins(&self) -> &[Bin] {
        &self.line_bins
    }

    /// Zero-based lines in each used bin, ascending by bin
    pub fn groups(&self) -> impl Iterator<Item = (Bin, &[usize])> + '_ {
        self.groups.iter().map(|(&bin, lines)| (bin, lines.as_slice()))
    }

    pub fn used_bins(&self) -> impl Iterator<Item = Bin> + '_ {
        self.groups.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.line_bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line_bins.is_empty()
    }
}

/// Normalized heat in `[0, 1]` for a count, given the file's minimum and range
fn normalized(count: u32, min: u32, range: u32, config: &ScaleConfig) -> f64 {
    if range == 0 {
        return 0.0;
    }
    let above = f64::from(count - min);
    let range = f64::from(range);
    let t = match config.mode {
        ScaleMode::Linear => above / range,
        ScaleMode::Logarithmic => (above + 1.0).ln() / (range + 1.0).ln(),
        ScaleMode::Exponential => (above / range).clamp(0.0, 1.0).powf(config.gamma),
    };
    t.clamp(0.0, 1.0)
}

pub fn bin_for(t: f64) -> Bin {
    (t.clamp(0.0, 1.0) * f64::from(MAX_BINS)).round() as Bin
}

/// Quantize every line's count into a bin under `config`.
///
/// A file whose counts are all equal maps entirely to bin 0.
pub fn assign_bins(counts: &[u32], config: &ScaleConfig) -> BinAssignment {
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    let range = max - min;

    let mut assignment = BinAssignment {
        line_bins: Vec::with_capacity(counts.len()),
        groups: BTreeMap::new(),
    };
    for (line0, &count) in counts.iter().enumerate() {
        let bin = bin_for(normalized(count, min, range, config));
        assignment.line_bins.push(bin);
        assignment.groups.entry(bin).or_default().push(line0);
    }
    assignment
}

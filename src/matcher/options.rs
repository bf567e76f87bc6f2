//! Options shared by the matchers.

use serde::{Deserialize, Serialize};

use crate::raster::{ChannelRange, LAB_RANGES};

/// How a tile's brightness is reconciled with its predecessors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Per-channel value curve fitted on the overlap.
    #[default]
    Curve,

    /// One scalar ratio per tile, followed by a global byte rescale.
    Brightness,
}

/// Which predecessor(s) the curve matcher fits against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NeighborPolicy {
    /// Left neighbor when the tile is not in column 0, otherwise the one above.
    #[default]
    PreferLeft,

    /// Fit against both left and top neighbors and average the results.
    Average,
}

/// Behavior of a value curve outside its observed control points.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Extrapolation {
    /// Hold the nearest endpoint's target value.
    #[default]
    Clamp,

    /// Extend the first and last segments.
    Linear,
}

/// Matcher configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub strategy: Strategy,
    pub neighbor_policy: NeighborPolicy,
    pub extrapolation: Extrapolation,

    /// Force each channel curve to be non-decreasing.
    pub monotone: bool,

    /// Valid range per channel. When present, curves are anchored at the
    /// range ends and the curve composite is rescaled into range.
    pub channel_ranges: Vec<ChannelRange>,

    /// Match sRGB tiles in CIE Lab and convert the composite back to sRGB.
    /// Curve strategy only.
    pub lab: bool,
}

impl MatchConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_neighbor_policy(mut self, policy: NeighborPolicy) -> Self {
        self.neighbor_policy = policy;
        self
    }

    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    pub fn with_monotone(mut self, monotone: bool) -> Self {
        self.monotone = monotone;
        self
    }

    pub fn with_channel_ranges(mut self, ranges: Vec<ChannelRange>) -> Self {
        self.channel_ranges = ranges;
        self
    }

    /// Enable Lab matching. Turning it on also selects [`LAB_RANGES`].
    pub fn with_lab(mut self, lab: bool) -> Self {
        self.lab = lab;
        if lab {
            self.channel_ranges = LAB_RANGES.to_vec();
        }
        self
    }

    pub fn channel_range(&self, channel: usize) -> Option<ChannelRange> {
        self.channel_ranges.get(channel).copied()
    }
}

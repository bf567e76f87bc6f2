//! Per-channel value curves fitted on overlap samples.
//!
//! Two overlap regions depict the same scene with different tonal response.
//! For each channel, pixels are paired by position; every distinct source
//! value maps to the mean of the target values seen with it. The sorted
//! `(source, target)` pairs are the control points of a piecewise-linear
//! curve that is then applied to the whole tile.
//!
//! Channels are treated independently, so the fit captures brightness and
//! range changes well and cross-channel color shifts not at all.

use ndarray::{ArrayView2, ArrayView3, ArrayViewMut2, Axis};

use crate::error::MatchError;
use crate::raster::{ChannelRange, Raster};

use super::options::{Extrapolation, MatchConfig};

// =============================================================================
// Channel Mapper
// =============================================================================

/// Piecewise-linear curve for one channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMapper {
    /// Control point x-values, strictly ascending
    sources: Vec<f64>,

    /// Control point y-values
    targets: Vec<f64>,

    extrapolation: Extrapolation,
}

/// Control point under construction: `(source, target sum, sample count)`.
type Accum = (f64, f64, usize);

impl ChannelMapper {
    /// Fit a curve from paired samples of one channel.
    ///
    /// Pairs where either value is NaN or infinite are ignored. With a
    /// `range`, identity control points are added at the range ends that lie
    /// beyond the observed sources.
    pub fn fit(
        source: ArrayView2<'_, f64>,
        target: ArrayView2<'_, f64>,
        range: Option<ChannelRange>,
        extrapolation: Extrapolation,
        monotone: bool,
    ) -> Self {
        let mut pairs: Vec<(f64, f64)> = source
            .iter()
            .zip(target.iter())
            .filter(|(s, t)| s.is_finite() && t.is_finite())
            .map(|(&s, &t)| (s, t))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut points: Vec<Accum> = Vec::new();
        for (s, t) in pairs {
            match points.last_mut() {
                Some(last) if last.0 == s => {
                    last.1 += t;
                    last.2 += 1;
                }
                _ => points.push((s, t, 1)),
            }
        }
        let mut points: Vec<Accum> = points
            .into_iter()
            .map(|(s, sum, n)| (s, sum / n as f64, n))
            .collect();

        if let (Some(range), Some(&(first, _, _)), Some(&(last, _, _))) =
            (range, points.first(), points.last())
        {
            if range.min < first {
                points.insert(0, (range.min, range.min, 1));
            }
            if range.max > last {
                points.push((range.max, range.max, 1));
            }
        }

        if monotone {
            pool_adjacent_violators(&mut points);
        }

        Self {
            sources: points.iter().map(|p| p.0).collect(),
            targets: points.iter().map(|p| p.1).collect(),
            extrapolation,
        }
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// `(source, target)` control points in ascending source order.
    pub fn control_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.sources.iter().copied().zip(self.targets.iter().copied())
    }

    /// Map one value through the curve.
    ///
    /// An empty curve is the identity; a single control point maps every
    /// value to its target.
    pub fn map(&self, value: f64) -> f64 {
        let n = self.sources.len();
        match n {
            0 => return value,
            1 => return self.targets[0],
            _ => {}
        }
        if value.is_nan() {
            return value;
        }

        let (xs, ys) = (&self.sources, &self.targets);
        if value <= xs[0] {
            return match self.extrapolation {
                Extrapolation::Clamp => ys[0],
                Extrapolation::Linear => lerp(xs[0], ys[0], xs[1], ys[1], value),
            };
        }
        if value >= xs[n - 1] {
            return match self.extrapolation {
                Extrapolation::Clamp => ys[n - 1],
                Extrapolation::Linear => lerp(xs[n - 2], ys[n - 2], xs[n - 1], ys[n - 1], value),
            };
        }

        let upper = xs.partition_point(|&x| x <= value);
        let lower = upper - 1;
        lerp(xs[lower], ys[lower], xs[upper], ys[upper], value)
    }

    /// Map every sample of a channel in place.
    pub fn apply(&self, mut channel: ArrayViewMut2<'_, f64>) {
        channel.mapv_inplace(|v| self.map(v));
    }
}

fn lerp(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Replace targets with their weighted isotonic (non-decreasing) fit.
fn pool_adjacent_violators(points: &mut [Accum]) {
    // (weight, mean, number of points pooled)
    let mut blocks: Vec<(f64, f64, usize)> = Vec::with_capacity(points.len());
    for &(_, target, weight) in points.iter() {
        blocks.push((weight as f64, target, 1));
        while blocks.len() >= 2 {
            let (w2, m2, n2) = blocks[blocks.len() - 1];
            let (w1, m1, n1) = blocks[blocks.len() - 2];
            if m1 <= m2 {
                break;
            }
            blocks.pop();
            let w = w1 + w2;
            if let Some(merged) = blocks.last_mut() {
                *merged = (w, (m1 * w1 + m2 * w2) / w, n1 + n2);
            }
        }
    }

    let mut i = 0;
    for (_, mean, count) in blocks {
        for point in &mut points[i..i + count] {
            point.1 = mean;
        }
        i += count;
    }
}

// =============================================================================
// Value Mapper
// =============================================================================

/// One [`ChannelMapper`] per channel, fitted from a pair of overlap regions.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMapper {
    channels: Vec<ChannelMapper>,
}

impl ValueMapper {
    /// Fit curves that take `source` samples onto `target` samples.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the regions differ in shape.
    pub fn fit(
        source: ArrayView3<'_, f64>,
        target: ArrayView3<'_, f64>,
        config: &MatchConfig,
    ) -> Result<Self, MatchError> {
        if source.dim() != target.dim() {
            return Err(MatchError::ShapeMismatch {
                source_shape: source.dim(),
                target_shape: target.dim(),
            });
        }

        let channels = (0..source.dim().2)
            .map(|c| {
                ChannelMapper::fit(
                    source.index_axis(Axis(2), c),
                    target.index_axis(Axis(2), c),
                    config.channel_range(c),
                    config.extrapolation,
                    config.monotone,
                )
            })
            .collect();

        Ok(Self { channels })
    }

    /// A copy of `tile` with every fitted channel mapped.
    ///
    /// Output values are not clamped to any pixel range.
    pub fn adjusted(&self, tile: &Raster) -> Raster {
        let mut result = tile.clone();
        for (c, mapper) in self.channels.iter().enumerate() {
            if c < result.dim().2 {
                mapper.apply(result.index_axis_mut(Axis(2), c));
            }
        }
        result
    }
}

// =============================================================================
// Tests
// =============================================================================

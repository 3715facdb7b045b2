//! Two-stage color clustering over L*a*b* points.
//!
//! Both stages use the same modified KD-tree split: at depth `d` the channel
//! `d mod dims` is examined and, when its extent exceeds the channel limit,
//! the set is cut at the midpoint of that extent (Rubner rule). Stage one
//! turns raw samples into homogeneous leaves; stage two re-clusters the leaf
//! centroids and keeps only leaves that cover a significant share of the
//! sampled population.
//!
//! The tree is walked with an explicit work stack, so degenerate inputs
//! cannot exhaust the call stack.

use std::ops::Range;

use crate::error::SegmentationError;
use crate::imageops_siox::color::ColorPoint;

/// Per-channel homogeneity thresholds for clustering, in L*a*b* units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits([f32; 3]);

impl Limits {
    /// Thresholds used by the reference segmentation for L, a and b.
    pub const DEFAULT: [f32; 3] = [0.66, 1.25, 2.5];

    /// Creates limits, rejecting non-positive or non-finite values.
    pub fn new(limits: [f32; 3]) -> Result<Self, SegmentationError> {
        if let Some(bad) = limits.iter().find(|l| !l.is_finite() || **l <= 0.0) {
            return Err(SegmentationError::InvalidParameter(format!(
                "clustering limits must be positive and finite, got {bad}"
            )));
        }
        Ok(Self(limits))
    }

    /// Limit for channel `dim` (0 = L, 1 = a, 2 = b).
    #[inline]
    #[must_use]
    pub const fn get(&self, dim: usize) -> f32 {
        self.0[dim]
    }

    #[inline]
    #[must_use]
    pub const fn as_array(&self) -> [f32; 3] {
        self.0
    }

    /// Squared diagonal of the box spanned by `[-limit, +limit]` per channel.
    ///
    /// Serves as the distance cutoff when no foreground signature exists.
    #[must_use]
    pub fn cluster_size(&self) -> f32 {
        self.0.iter().map(|l| (2.0 * l) * (2.0 * l)).sum()
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Leaf clusters stored as index ranges into one reordered point buffer.
#[derive(Debug, Clone, Default)]
pub struct Clusters {
    points: Vec<ColorPoint>,
    ranges: Vec<Range<usize>>,
}

impl Clusters {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Members of the `index`-th leaf.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[ColorPoint]> {
        self.ranges.get(index).map(|r| &self.points[r.clone()])
    }

    /// Leaves in the order the tree produced them ("small" half first).
    pub fn iter(&self) -> impl Iterator<Item = &[ColorPoint]> + '_ {
        self.ranges.iter().map(|r| &self.points[r.clone()])
    }

    /// One centroid per leaf, weighted by the summed cardinality of its members.
    #[must_use]
    pub fn centroids(&self) -> Vec<ColorPoint> {
        self.iter().map(centroid).collect()
    }
}

/// Unweighted mean of the members, carrying their summed cardinality.
fn centroid(members: &[ColorPoint]) -> ColorPoint {
    let count = members.len() as f32;
    let (l, a, b, cardinality) = members.iter().fold((0.0, 0.0, 0.0, 0u32), |acc, p| {
        (
            acc.0 + p.l,
            acc.1 + p.a,
            acc.2 + p.b,
            acc.3.saturating_add(p.cardinality),
        )
    });
    ColorPoint::new(l / count, a / count, b / count).with_cardinality(cardinality)
}

#[inline]
fn channel_extent(points: &[ColorPoint], dim: usize) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
        let value = p.channel(dim);
        (min.min(value), max.max(value))
    })
}

#[inline]
fn exceeds_limit(points: &[ColorPoint], dim: usize, limits: &Limits) -> bool {
    let (min, max) = channel_extent(points, dim);
    max - min > limits.get(dim)
}

/// Stage one: splits `points` into leaves that are homogeneous in every
/// clustered channel.
///
/// `dims` is 3 for color (L, a, b) and 1 for grayscale (L only); other values
/// are clamped into that range. Points equal to the pivot go to the first
/// half. Empty sets vanish and single points are always leaves.
#[must_use]
pub fn split_clusters(mut points: Vec<ColorPoint>, limits: &Limits, dims: usize) -> Clusters {
    let dims = dims.clamp(1, 3);
    let mut ranges = Vec::new();
    let mut scratch = Vec::with_capacity(points.len());
    let mut stack = vec![(0..points.len(), 0usize)];

    while let Some((range, depth)) = stack.pop() {
        if range.is_empty() {
            continue;
        }
        let set = &points[range.clone()];
        let dim = depth % dims;
        let (min, max) = channel_extent(set, dim);

        if max - min > limits.get(dim) {
            let pivot = min + (max - min) / 2.0;

            scratch.clear();
            scratch.extend(set.iter().filter(|p| p.channel(dim) <= pivot));
            let split = range.start + scratch.len();
            scratch.extend(set.iter().filter(|p| p.channel(dim) > pivot));
            points[range.clone()].copy_from_slice(&scratch);

            stack.push((split..range.end, depth + 1));
            stack.push((range.start..split, depth + 1));
        } else if (0..dims).any(|d| d != dim && exceeds_limit(set, d, limits)) {
            stack.push((range, depth + 1));
        } else {
            ranges.push(range);
        }
    }

    Clusters { points, ranges }
}

/// True when `cardinality` is at least `significance` of `total`.
#[inline]
pub(crate) fn is_significant(cardinality: u32, total: u32, significance: f32) -> bool {
    cardinality as f32 >= significance * total as f32
}

/// Stage two: re-clusters stage-one centroids and keeps one averaged point
/// per leaf whose members together cover at least `significance` of the
/// `total` sampled population.
#[must_use]
pub fn merge_clusters(
    centroids: Vec<ColorPoint>,
    limits: &Limits,
    dims: usize,
    total: u32,
    significance: f32,
) -> Vec<ColorPoint> {
    split_clusters(centroids, limits, dims)
        .iter()
        .map(centroid)
        .filter(|c| is_significant(c.cardinality, total, significance))
        .collect()
}

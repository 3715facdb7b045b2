//! Color signatures: a handful of dominant L*a*b* centroids summarizing a
//! sampled pixel population.

use log::debug;

use crate::imageops_siox::cluster::{merge_clusters, split_clusters, Limits};
use crate::imageops_siox::color::ColorPoint;

/// Default share of the sampled population a signature entry must cover.
pub const DEFAULT_SIGNIFICANCE: f32 = 0.10;

/// Dominant color clusters of one sample class.
///
/// Each entry is a stage-two centroid. Its cardinality is the number of raw
/// samples it summarizes; classification only uses the coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorSignature {
    entries: Vec<ColorPoint>,
}

impl ColorSignature {
    /// Builds a signature from raw samples.
    ///
    /// Runs stage one over `samples` and stage two over the resulting
    /// centroids. An empty sample set yields an empty signature without any
    /// clustering work.
    #[must_use]
    pub fn build(
        samples: Vec<ColorPoint>,
        limits: &Limits,
        dims: usize,
        significance: f32,
    ) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let total = samples.iter().fold(0u32, |acc, p| acc.saturating_add(p.cardinality));

        let stage_one = split_clusters(samples, limits, dims);
        debug!("signature: {total} samples -> {} stage-one clusters", stage_one.len());

        let entries = merge_clusters(stage_one.centroids(), limits, dims, total, significance);
        debug!("signature: {} significant clusters", entries.len());

        Self { entries }
    }

    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[ColorPoint] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest squared distance from `point` to any entry, `None` when empty.
    #[must_use]
    pub fn min_distance(&self, point: &ColorPoint) -> Option<f32> {
        self.entries
            .iter()
            .map(|entry| point.distance_squared(entry))
            .reduce(f32::min)
    }
}

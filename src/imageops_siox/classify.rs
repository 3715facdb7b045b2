//! Nearest-signature classification of undecided trimap cells.

use std::collections::HashMap;

use log::debug;

use crate::imageops_siox::cluster::Limits;
use crate::imageops_siox::color::{packed_to_lab, ChannelOrder, ColorPoint};
use crate::imageops_siox::signature::ColorSignature;

/// Cells at or below this confidence are sure background.
pub const BACKGROUND_CONFIDENCE: f32 = 0.1;
/// Cells at or above this confidence are sure foreground.
pub const FOREGROUND_CONFIDENCE: f32 = 0.9;

/// Foreground distance reported when there is no foreground signature and
/// the color is far from the background. Non-zero so ratios stay finite.
const FAR_FOREGROUND_DISTANCE: f32 = 0.00001;

/// Outcome of classifying one color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassResult {
    /// Hard label.
    pub foreground: bool,
    /// Squared distance to the nearest background entry.
    pub bg_distance: f32,
    /// Squared distance to the nearest foreground entry, or the substitute
    /// used when the foreground signature is empty.
    pub fg_distance: f32,
}

/// Labels colors against a background and a foreground signature.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    background: &'a ColorSignature,
    foreground: &'a ColorSignature,
    cluster_size: f32,
}

impl<'a> Classifier<'a> {
    /// Returns `None` when the background signature is empty, since nothing
    /// can be classified without it.
    #[must_use]
    pub fn new(
        background: &'a ColorSignature,
        foreground: &'a ColorSignature,
        limits: &Limits,
    ) -> Option<Self> {
        if background.is_empty() {
            return None;
        }
        Some(Self {
            background,
            foreground,
            cluster_size: limits.cluster_size(),
        })
    }

    /// Classifies one L*a*b* point.
    ///
    /// Without foreground entries, the point is background iff its nearest
    /// background distance is below the cluster size. Otherwise it is
    /// foreground as soon as one foreground entry, scanned in signature
    /// order, is strictly closer than the nearest background entry.
    #[must_use]
    pub fn classify(&self, point: &ColorPoint) -> ClassResult {
        let bg_distance = self
            .background
            .min_distance(point)
            .unwrap_or(f32::INFINITY);

        match self.foreground.min_distance(point) {
            None => {
                let near_background = bg_distance < self.cluster_size;
                ClassResult {
                    foreground: !near_background,
                    bg_distance,
                    fg_distance: if near_background {
                        bg_distance + self.cluster_size
                    } else {
                        FAR_FOREGROUND_DISTANCE
                    },
                }
            }
            Some(fg_distance) => ClassResult {
                foreground: self
                    .foreground
                    .entries()
                    .iter()
                    .any(|entry| point.distance_squared(entry) < bg_distance),
                bg_distance,
                fg_distance,
            },
        }
    }
}

/// Classification results memoized per color.
///
/// Keys are packed colors normalized with [`ChannelOrder::color_key`].
#[derive(Debug, Clone, Default)]
pub struct ClassificationCache {
    entries: HashMap<u32, ClassResult>,
}

impl ClassificationCache {
    #[inline]
    #[must_use]
    pub fn get(&self, key: u32) -> Option<&ClassResult> {
        self.entries.get(&key)
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

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops colors labeled background; new foreground samples may flip them.
    ///
    /// A color exactly as far from both signatures is labeled background, so
    /// it is dropped here as well.
    pub fn forget_background(&mut self) {
        self.entries.retain(|_, result| result.foreground);
    }

    /// Drops colors labeled foreground; new background samples may flip them.
    ///
    /// Colors at equal distance from both signatures carry the background
    /// label and survive.
    pub fn forget_foreground(&mut self) {
        self.entries.retain(|_, result| !result.foreground);
    }

    fn lookup_or_classify(
        &mut self,
        key: u32,
        classifier: &Classifier<'_>,
    ) -> (ClassResult, bool) {
        match self.entries.get(&key) {
            Some(result) => (*result, true),
            None => {
                let result = classifier.classify(&packed_to_lab(key, ChannelOrder::Xrgb));
                self.entries.insert(key, result);
                (result, false)
            }
        }
    }
}

/// Hard-labels every cell of `confidence`.
///
/// Sure foreground becomes `1.0`, sure background `0.0`, and every undecided
/// cell gets the label of its pixel's color.
pub fn classify_cells(
    pixels: &[u32],
    confidence: &mut [f32],
    order: ChannelOrder,
    classifier: &Classifier<'_>,
    cache: &mut ClassificationCache,
) {
    let mut hits = 0usize;
    let mut misses = 0usize;

    for (cell, &pixel) in confidence.iter_mut().zip(pixels) {
        if *cell >= FOREGROUND_CONFIDENCE {
            *cell = 1.0;
        } else if *cell <= BACKGROUND_CONFIDENCE {
            *cell = 0.0;
        } else {
            let (result, cached) = cache.lookup_or_classify(order.color_key(pixel), classifier);
            if cached {
                hits += 1;
            } else {
                misses += 1;
            }
            *cell = if result.foreground { 1.0 } else { 0.0 };
        }
    }

    debug!(
        "classify: {} cached colors, {hits} hits, {misses} misses",
        cache.len()
    );
}

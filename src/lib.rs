//! Foreground extraction with SIOX (Simple Interactive Object Extraction).
//!
//! A trimap marks some cells as sure background (`<= 0.1`), some as sure
//! foreground (`>= 0.9`) and leaves the rest undecided. The colors of the sure
//! cells are clustered in CIE L*a*b* into two signatures, every undecided
//! cell is labeled by the nearer signature, and the labels are cleaned into a
//! binary mask made of the dominant connected region.
//!
//! ```no_run
//! use image::{Luma, Rgb};
//! use imageops_siox::{Image, SegmentationConfig, SegmentationExt};
//!
//! let image: Image<Rgb<u8>> = Image::new(64, 64);
//! let mut trimap: Image<Luma<f32>> = Image::from_pixel(64, 64, Luma([0.5]));
//! image.segment_foreground(&mut trimap, &SegmentationConfig::default())?;
//! # Ok::<(), imageops_siox::SegmentationError>(())
//! ```

mod error;
mod imageops_siox;
#[cfg(test)]
mod test_utils;
mod utils;

pub use error::SegmentationError;
pub use imageops_siox::blob::{
    select_blobs, select_blobs_keeping, BlobPolicy, BlobSummary, Connectivity, BLOB_THRESHOLD,
    MULTIBLOB_DEFAULT_SIZE_FACTOR,
};
pub use imageops_siox::classify::{
    classify_cells, ClassResult, ClassificationCache, Classifier, BACKGROUND_CONFIDENCE,
    FOREGROUND_CONFIDENCE,
};
pub use imageops_siox::cluster::{merge_clusters, split_clusters, Clusters, Limits};
pub use imageops_siox::color::{packed_to_lab, rgb_to_lab, ChannelOrder, ColorPoint};
pub use imageops_siox::confidence::{ConfidenceMatrix, DEFAULT_SMOOTHING_WEIGHTS};
pub use imageops_siox::refine::{Brush, BrushMode};
pub use imageops_siox::segmentate::{
    segmentate, ColorMode, Refinement, SegmentationConfig, SegmentationExt, SegmentationOutcome,
    Segmentator,
};
pub use imageops_siox::signature::{ColorSignature, DEFAULT_SIGNIFICANCE};
pub use imageproc::definitions::Image;

//! Foreground extraction entry points.
//!
//! The pipeline follows SIOX (Simple Interactive Object Extraction):
//!
//! 1. Sure background (`<= 0.1`) and sure foreground (`>= 0.9`) cells of the
//!    trimap provide color samples.
//! 2. Each sample class is summarized by a [`ColorSignature`].
//! 3. Every undecided cell is labeled by the signature its color is closer to.
//! 4. Smooth, normalize and erode the labels, keep the dominant blob, smooth
//!    again, threshold, keep the dominant blob once more and dilate back the
//!    boundary lost to erosion.
//!
//! The trimap is overwritten in place with a mask of exactly `0.0` and `1.0`.
//! Without any sure background nothing can be classified and the trimap is
//! left untouched.
//!
//! ## References
//!
//! G. Friedland, K. Jantz, L. Knipping, R. Rojas: "Image Segmentation by
//! Uniform Color Clustering -- Approach and Benchmark Results", Technical
//! Report B-05-07, Freie Universität Berlin, 2005.

use image::{Luma, Pixel, Rgb, Rgba};
use imageproc::definitions::Image;
use log::debug;

use crate::error::SegmentationError;
use crate::imageops_siox::blob::{select_blobs_keeping, BlobPolicy, Connectivity, BLOB_THRESHOLD};
use crate::imageops_siox::classify::{
    classify_cells, ClassificationCache, Classifier, BACKGROUND_CONFIDENCE, FOREGROUND_CONFIDENCE,
};
use crate::imageops_siox::cluster::Limits;
use crate::imageops_siox::color::{packed_to_lab, ChannelOrder, ColorPoint};
use crate::imageops_siox::confidence::{ConfidenceMatrix, DEFAULT_SMOOTHING_WEIGHTS};
use crate::imageops_siox::signature::{ColorSignature, DEFAULT_SIGNIFICANCE};
use crate::utils::{validate_buffer_len, validate_matching_dimensions, validate_non_empty_image};

/// Channels the clustering runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// L, a and b.
    #[default]
    Color,
    /// L only.
    Grayscale,
}

impl ColorMode {
    #[inline]
    #[must_use]
    pub const fn dims(self) -> usize {
        match self {
            Self::Color => 3,
            Self::Grayscale => 1,
        }
    }
}

/// Parameters of a segmentation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentationConfig {
    /// Per-channel clustering thresholds.
    pub limits: Limits,
    /// Extra smoothing passes before the final threshold.
    pub smoothness: u32,
    /// Share of the samples a signature entry must cover.
    pub significance: f32,
    /// Weights of the three-tap smoothing kernel.
    pub smoothing_weights: [f32; 3],
    /// Byte layout of packed pixels.
    pub channel_order: ChannelOrder,
    pub color_mode: ColorMode,
    pub blob_policy: BlobPolicy,
    pub connectivity: Connectivity,
    /// Keep every blob that contains a sure-foreground cell of the trimap,
    /// whatever the blob policy says about its size.
    pub keep_marked_foreground: bool,
}

impl SegmentationConfig {
    /// Smoothness used for non-interactive extraction.
    pub const DEFAULT_SMOOTHNESS: u32 = 6;

    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_smoothness(mut self, smoothness: u32) -> Self {
        self.smoothness = smoothness;
        self
    }

    #[must_use]
    pub fn with_significance(mut self, significance: f32) -> Self {
        self.significance = significance;
        self
    }

    #[must_use]
    pub fn with_smoothing_weights(mut self, weights: [f32; 3]) -> Self {
        self.smoothing_weights = weights;
        self
    }

    #[must_use]
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.color_mode = mode;
        self
    }

    #[must_use]
    pub fn with_blob_policy(mut self, policy: BlobPolicy) -> Self {
        self.blob_policy = policy;
        self
    }

    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    #[must_use]
    pub fn with_keep_marked_foreground(mut self, keep: bool) -> Self {
        self.keep_marked_foreground = keep;
        self
    }

    /// Checks every parameter the pipeline depends on.
    pub fn validate(&self) -> Result<(), SegmentationError> {
        Limits::new(self.limits.as_array())?;
        if !(self.significance > 0.0 && self.significance <= 1.0) {
            return Err(SegmentationError::InvalidParameter(format!(
                "significance must be in (0, 1], got {}",
                self.significance
            )));
        }
        if self.smoothing_weights.iter().any(|w| !w.is_finite()) {
            return Err(SegmentationError::InvalidParameter(format!(
                "smoothing weights must be finite, got {:?}",
                self.smoothing_weights
            )));
        }
        if self.blob_policy == BlobPolicy::SizeFactor(0) {
            return Err(SegmentationError::InvalidParameter(
                "blob size factor must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            smoothness: Self::DEFAULT_SMOOTHNESS,
            significance: DEFAULT_SIGNIFICANCE,
            smoothing_weights: DEFAULT_SMOOTHING_WEIGHTS,
            channel_order: ChannelOrder::default(),
            color_mode: ColorMode::default(),
            blob_policy: BlobPolicy::default(),
            connectivity: Connectivity::default(),
            keep_marked_foreground: false,
        }
    }
}

/// What changed in the trimap since the previous extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refinement {
    /// Rebuild both signatures and forget every cached color.
    #[default]
    Recalculate,
    /// More foreground was marked: rebuild the foreground signature.
    AddForeground,
    /// More background was marked: rebuild the background signature.
    AddBackground,
}

/// How an extraction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationOutcome {
    /// The trimap now holds a binary mask.
    Segmented,
    /// No background signature could be built; the trimap is unchanged.
    NoBackground,
}

/// Stateful segmentator that keeps signatures and classified colors between
/// extractions, so that refining a trimap only redoes the affected work.
#[derive(Debug, Clone)]
pub struct Segmentator {
    config: SegmentationConfig,
    background: Option<ColorSignature>,
    foreground: Option<ColorSignature>,
    cache: ClassificationCache,
}

impl Segmentator {
    /// Creates a segmentator after validating `config`.
    pub fn new(config: SegmentationConfig) -> Result<Self, SegmentationError> {
        config.validate()?;
        Ok(Self {
            config,
            background: None,
            foreground: None,
            cache: ClassificationCache::default(),
        })
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn cache(&self) -> &ClassificationCache {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub fn background_signature(&self) -> Option<&ColorSignature> {
        self.background.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn foreground_signature(&self) -> Option<&ColorSignature> {
        self.foreground.as_ref()
    }

    /// Segments `pixels` using `confidence` as trimap, writing the mask back
    /// into `confidence`.
    ///
    /// # Errors
    ///
    /// * `EmptyImage` when `width` or `height` is zero
    /// * `DimensionMismatch` when a buffer does not hold `width * height` cells
    /// * `AllocationFailed` when the sample buffers cannot be reserved
    pub fn extract(
        &mut self,
        pixels: &[u32],
        confidence: &mut [f32],
        width: usize,
        height: usize,
        refinement: Refinement,
    ) -> Result<SegmentationOutcome, SegmentationError> {
        validate_non_empty_image(width, height)?;
        validate_buffer_len(pixels.len(), width, height)?;
        validate_buffer_len(confidence.len(), width, height)?;

        match refinement {
            Refinement::Recalculate => self.cache.clear(),
            Refinement::AddForeground => self.cache.forget_background(),
            Refinement::AddBackground => self.cache.forget_foreground(),
        }

        let limits = self.config.limits;
        let dims = self.config.color_mode.dims();
        let order = self.config.channel_order;

        if refinement != Refinement::AddForeground || self.background.is_none() {
            let samples =
                collect_samples(pixels, confidence, order, |c| c <= BACKGROUND_CONFIDENCE)?;
            debug!("extract: {} background samples", samples.len());
            self.background = Some(ColorSignature::build(
                samples,
                &limits,
                dims,
                self.config.significance,
            ));
        }
        if refinement != Refinement::AddBackground || self.foreground.is_none() {
            let samples =
                collect_samples(pixels, confidence, order, |c| c >= FOREGROUND_CONFIDENCE)?;
            debug!("extract: {} foreground samples", samples.len());
            self.foreground = Some(ColorSignature::build(
                samples,
                &limits,
                dims,
                self.config.significance,
            ));
        }

        let (Some(background), Some(foreground)) = (&self.background, &self.foreground) else {
            return Ok(SegmentationOutcome::NoBackground);
        };
        let Some(classifier) = Classifier::new(background, foreground, &limits) else {
            debug!("extract: empty background signature, trimap left unchanged");
            return Ok(SegmentationOutcome::NoBackground);
        };

        // Classification overwrites the sure-foreground marks.
        let marked: Vec<bool> = if self.config.keep_marked_foreground {
            confidence.iter().map(|&c| c >= FOREGROUND_CONFIDENCE).collect()
        } else {
            Vec::new()
        };

        classify_cells(pixels, confidence, order, &classifier, &mut self.cache);

        let mut matrix = ConfidenceMatrix::new(confidence, width, height)?;
        self.postprocess(&mut matrix, &marked);

        Ok(SegmentationOutcome::Segmented)
    }

    /// Turns hard labels into the final mask. Blobs touching a `marked` cell
    /// survive both blob passes.
    fn postprocess(&self, matrix: &mut ConfidenceMatrix<'_>, marked: &[bool]) {
        let config = &self.config;

        matrix.smooth(config.smoothing_weights);
        matrix.normalize();
        matrix.erode();
        select_blobs_keeping(matrix, config.blob_policy, config.connectivity, marked);

        for _ in 0..config.smoothness {
            matrix.smooth(config.smoothing_weights);
        }
        matrix.normalize();
        matrix.threshold(BLOB_THRESHOLD);
        select_blobs_keeping(matrix, config.blob_policy, config.connectivity, marked);

        matrix.dilate();
    }
}

/// Converts the pixels whose cell satisfies `is_sample` to L*a*b*.
fn collect_samples<F>(
    pixels: &[u32],
    confidence: &[f32],
    order: ChannelOrder,
    is_sample: F,
) -> Result<Vec<ColorPoint>, SegmentationError>
where
    F: Fn(f32) -> bool,
{
    let requested = confidence.iter().filter(|&&c| is_sample(c)).count();
    let mut samples = Vec::new();
    samples
        .try_reserve_exact(requested)
        .map_err(|_| SegmentationError::AllocationFailed { requested })?;
    samples.extend(
        pixels
            .iter()
            .zip(confidence)
            .filter(|&(_, &c)| is_sample(c))
            .map(|(&pixel, _)| packed_to_lab(pixel, order)),
    );
    Ok(samples)
}

/// Segments `pixels` with the default configuration apart from `limits` and
/// `smoothness`, returning the mutated `confidence` buffer.
///
/// Packed pixels use [`ChannelOrder::Xrgb`].
///
/// # Errors
///
/// Same as [`Segmentator::extract`], plus `InvalidParameter` for limits that
/// are not positive and finite.
pub fn segmentate<'a>(
    pixels: &[u32],
    confidence: &'a mut [f32],
    xres: usize,
    yres: usize,
    limits: [f32; 3],
    smoothness: u32,
) -> Result<&'a mut [f32], SegmentationError> {
    let config = SegmentationConfig::default()
        .with_limits(Limits::new(limits)?)
        .with_smoothness(smoothness);
    Segmentator::new(config)?.extract(pixels, confidence, xres, yres, Refinement::Recalculate)?;
    Ok(confidence)
}

/// Trait for extracting the foreground of an image with a trimap
///
/// The trimap is a `Luma<f32>` image of the same size that is overwritten
/// with the resulting mask.
pub trait SegmentationExt {
    /// Segments the image in place of `trimap`.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` if the image and trimap sizes differ
    /// * `EmptyImage` if the image has no pixels
    /// * `InvalidParameter` if `config` does not validate
    fn segment_foreground(
        &self,
        trimap: &mut Image<Luma<f32>>,
        config: &SegmentationConfig,
    ) -> Result<SegmentationOutcome, SegmentationError>;
}

fn segment_packed<P, F>(
    image: &Image<P>,
    trimap: &mut Image<Luma<f32>>,
    config: SegmentationConfig,
    rgb: F,
) -> Result<SegmentationOutcome, SegmentationError>
where
    P: Pixel<Subpixel = u8>,
    F: Fn(&P) -> [u8; 3],
{
    validate_matching_dimensions(image.dimensions(), trimap.dimensions())?;
    let (width, height) = image.dimensions();
    let order = ChannelOrder::Xrgb;
    let pixels: Vec<u32> = image.pixels().map(|p| order.pack(rgb(p))).collect();

    Segmentator::new(config.with_channel_order(order))?.extract(
        &pixels,
        &mut **trimap,
        width as usize,
        height as usize,
        Refinement::Recalculate,
    )
}

impl SegmentationExt for Image<Rgb<u8>> {
    fn segment_foreground(
        &self,
        trimap: &mut Image<Luma<f32>>,
        config: &SegmentationConfig,
    ) -> Result<SegmentationOutcome, SegmentationError> {
        segment_packed(self, trimap, *config, |&Rgb(rgb)| rgb)
    }
}

impl SegmentationExt for Image<Rgba<u8>> {
    fn segment_foreground(
        &self,
        trimap: &mut Image<Luma<f32>>,
        config: &SegmentationConfig,
    ) -> Result<SegmentationOutcome, SegmentationError> {
        segment_packed(self, trimap, *config, |&Rgba([r, g, b, _])| [r, g, b])
    }
}

impl SegmentationExt for Image<Luma<u8>> {
    fn segment_foreground(
        &self,
        trimap: &mut Image<Luma<f32>>,
        config: &SegmentationConfig,
    ) -> Result<SegmentationOutcome, SegmentationError> {
        let config = config.with_color_mode(ColorMode::Grayscale);
        segment_packed(self, trimap, config, |&Luma([v])| [v, v, v])
    }
}

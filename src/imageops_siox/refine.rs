//! Detail refinement brush.
//!
//! After an extraction, cells under a square brush can be given fractional
//! confidence from the cached distances of their color to the background
//! and foreground signatures. This recovers soft edges (hair, fur, blur)
//! that the hard labeling removed.

use itertools::iproduct;

use crate::error::SegmentationError;
use crate::imageops_siox::classify::FOREGROUND_CONFIDENCE;
use crate::imageops_siox::segmentate::Segmentator;
use crate::utils::{validate_buffer_len, validate_non_empty_image};

/// Direction of a refinement stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrushMode {
    /// Raise cells that are not sure foreground toward foreground.
    Add,
    /// Lower sure foreground cells toward background.
    Subtract,
}

/// Square brush covering `[x - radius, x + radius) × [y - radius, y + radius)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brush {
    pub x: usize,
    pub y: usize,
    pub radius: usize,
}

impl Brush {
    /// Creates a brush centered on `(x, y)`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` when `radius` is zero.
    pub fn new(x: usize, y: usize, radius: usize) -> Result<Self, SegmentationError> {
        if radius == 0 {
            return Err(SegmentationError::InvalidParameter(
                "brush radius must be non-zero".to_string(),
            ));
        }
        Ok(Self { x, y, radius })
    }
}

/// Alpha of a cell from squared signature distances.
fn brush_alpha(mode: BrushMode, bg_distance: f32, fg_distance: f32) -> f32 {
    let bg = bg_distance.sqrt();
    let fg = fg_distance.sqrt();
    match mode {
        BrushMode::Add if fg == 0.0 => 1.0,
        BrushMode::Add => (bg / fg).min(1.0),
        BrushMode::Subtract if bg == 0.0 => 0.0,
        BrushMode::Subtract => 1.0 - (fg / bg).min(1.0),
    }
}

impl Segmentator {
    /// Applies one refinement stroke to `confidence`.
    ///
    /// Only colors classified by a previous [`Segmentator::extract`] are
    /// affected; others can only be sure background or sure foreground.
    /// A cell whose alpha falls below `threshold` becomes `0.0`, any other
    /// takes the alpha itself.
    ///
    /// # Returns
    ///
    /// The number of cells written.
    ///
    /// # Errors
    ///
    /// * `EmptyImage` / `DimensionMismatch` for inconsistent geometry
    /// * `InvalidParameter` when `threshold` is outside `[0, 1]`
    #[allow(clippy::too_many_arguments)]
    pub fn refine_detail(
        &self,
        pixels: &[u32],
        confidence: &mut [f32],
        width: usize,
        height: usize,
        brush: Brush,
        mode: BrushMode,
        threshold: f32,
    ) -> Result<usize, SegmentationError> {
        validate_non_empty_image(width, height)?;
        validate_buffer_len(pixels.len(), width, height)?;
        validate_buffer_len(confidence.len(), width, height)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SegmentationError::InvalidParameter(format!(
                "brush threshold must be in [0, 1], got {threshold}"
            )));
        }

        let order = self.config().channel_order;
        let xs = brush.x.saturating_sub(brush.radius)
            ..brush.x.saturating_add(brush.radius).min(width);
        let ys = brush.y.saturating_sub(brush.radius)
            ..brush.y.saturating_add(brush.radius).min(height);

        let mut written = 0;
        for (y, x) in iproduct!(ys, xs) {
            let i = y * width + x;
            let cell = &mut confidence[i];
            let sure_foreground = *cell >= FOREGROUND_CONFIDENCE;
            let eligible = match mode {
                BrushMode::Add => !sure_foreground,
                BrushMode::Subtract => sure_foreground,
            };
            if !eligible {
                continue;
            }
            let Some(result) = self.cache().get(order.color_key(pixels[i])) else {
                continue;
            };

            let alpha = brush_alpha(mode, result.bg_distance, result.fg_distance);
            *cell = if alpha < threshold { 0.0 } else { alpha };
            written += 1;
        }
        Ok(written)
    }
}

//! In-place filters over a row-major confidence matrix.
//!
//! Every filter is made of four directional passes (right, left, down, up).
//! Each pass reads the cells already written by the previous one, so the
//! passes cascade instead of working on a copy. Cells near the edge in the
//! direction of a pass simply see fewer neighbors.

use crate::error::SegmentationError;
use crate::utils::{validate_buffer_len, validate_non_empty_image};

/// Default weights of the three-tap smoothing kernel.
pub const DEFAULT_SMOOTHING_WEIGHTS: [f32; 3] = [0.33, 0.33, 0.33];

/// Mutable view of a `width * height` confidence buffer.
#[derive(Debug)]
pub struct ConfidenceMatrix<'a> {
    cells: &'a mut [f32],
    width: usize,
    height: usize,
}

impl<'a> ConfidenceMatrix<'a> {
    /// Wraps `cells`, failing when the geometry does not match its length.
    pub fn new(
        cells: &'a mut [f32],
        width: usize,
        height: usize,
    ) -> Result<Self, SegmentationError> {
        validate_non_empty_image(width, height)?;
        validate_buffer_len(cells.len(), width, height)?;
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[f32] {
        self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [f32] {
        self.cells
    }

    /// Releases the view, handing back the underlying buffer.
    #[inline]
    #[must_use]
    pub fn into_cells(self) -> &'a mut [f32] {
        self.cells
    }

    fn for_each_row<F>(&mut self, pass: F)
    where
        F: Fn(&mut [f32]) + Send + Sync,
    {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            self.cells.par_chunks_mut(self.width).for_each(pass);
        }
        #[cfg(not(feature = "rayon"))]
        self.cells.chunks_mut(self.width).for_each(pass);
    }

    /// Three-tap weighted smoothing.
    ///
    /// `weights[0]` applies to the cell itself, `weights[1]` and `weights[2]`
    /// to its first and second neighbor in the direction of the pass.
    pub fn smooth(&mut self, [f1, f2, f3]: [f32; 3]) {
        let width = self.width;
        let height = self.height;

        self.for_each_row(|row| {
            for x in 0..width.saturating_sub(2) {
                row[x] = f1 * row[x] + f2 * row[x + 1] + f3 * row[x + 2];
            }
            for x in (2..width).rev() {
                row[x] = f3 * row[x - 2] + f2 * row[x - 1] + f1 * row[x];
            }
        });

        let cells = &mut *self.cells;
        for y in 0..height.saturating_sub(2) {
            for x in 0..width {
                let i = y * width + x;
                cells[i] = f1 * cells[i] + f2 * cells[i + width] + f3 * cells[i + 2 * width];
            }
        }
        for y in (2..height).rev() {
            for x in 0..width {
                let i = y * width + x;
                cells[i] = f3 * cells[i - 2 * width] + f2 * cells[i - width] + f1 * cells[i];
            }
        }
    }

    /// Scales the matrix so that its maximum becomes exactly `1.0`.
    ///
    /// Does nothing when the maximum is not positive or already `1.0`.
    pub fn normalize(&mut self) {
        let max = self.cells.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max <= 0.0 || max == 1.0 {
            return;
        }
        for cell in self.cells.iter_mut() {
            *cell /= max;
        }
    }

    /// Pairwise minimum with the next neighbor in each direction.
    pub fn erode(&mut self) {
        self.morph(f32::min);
    }

    /// Pairwise maximum with the next neighbor in each direction.
    pub fn dilate(&mut self) {
        self.morph(f32::max);
    }

    fn morph(&mut self, op: fn(f32, f32) -> f32) {
        let width = self.width;
        let height = self.height;

        self.for_each_row(|row| {
            for x in 0..width.saturating_sub(1) {
                row[x] = op(row[x], row[x + 1]);
            }
            for x in (1..width).rev() {
                row[x] = op(row[x - 1], row[x]);
            }
        });

        let cells = &mut *self.cells;
        for y in 0..height.saturating_sub(1) {
            for x in 0..width {
                let i = y * width + x;
                cells[i] = op(cells[i], cells[i + width]);
            }
        }
        for y in (1..height).rev() {
            for x in 0..width {
                let i = y * width + x;
                cells[i] = op(cells[i - width], cells[i]);
            }
        }
    }

    /// Sets every cell to exactly `1.0` when it is at least `level`, else `0.0`.
    pub fn threshold(&mut self, level: f32) {
        self.for_each_row(|row| {
            for cell in row.iter_mut() {
                *cell = if *cell >= level { 1.0 } else { 0.0 };
            }
        });
    }
}

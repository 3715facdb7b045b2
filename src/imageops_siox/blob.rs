//! Connected-component filtering of the confidence matrix.

use std::collections::VecDeque;

use log::debug;

use crate::imageops_siox::confidence::ConfidenceMatrix;

/// Cells at or above this confidence belong to a blob.
pub const BLOB_THRESHOLD: f32 = 0.5;

/// Default size factor when several blobs may be kept.
pub const MULTIBLOB_DEFAULT_SIZE_FACTOR: u32 = 4;

/// Neighborhood used by the flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Left, right, up and down neighbors within the image.
    #[default]
    FourConnected,
    /// Previous, next, up and down cells of the flat buffer, checked only
    /// against the buffer bounds. A blob touching the right edge continues on
    /// the left edge of the next row. Matches the historical behavior.
    Scanline,
}

/// Which blobs survive the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlobPolicy {
    /// Only the largest blob; on equal sizes the first one found in
    /// row-major order wins.
    #[default]
    Largest,
    /// Every blob with `size * factor >= largest size`.
    SizeFactor(u32),
}

/// Result of a blob selection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobSummary {
    /// Number of blobs found.
    pub blobs: usize,
    /// Number of blobs left untouched.
    pub kept: usize,
    /// Size of the largest blob in cells.
    pub largest: usize,
}

#[inline]
fn neighbors(
    pos: usize,
    width: usize,
    len: usize,
    connectivity: Connectivity,
) -> [Option<usize>; 4] {
    let (left, right) = match connectivity {
        Connectivity::FourConnected => {
            let x = pos % width;
            (
                (x > 0).then(|| pos - 1),
                (x + 1 < width).then_some(pos + 1),
            )
        }
        Connectivity::Scanline => (pos.checked_sub(1), (pos + 1 < len).then_some(pos + 1)),
    };
    [
        left,
        right,
        pos.checked_sub(width),
        (pos + width < len).then_some(pos + width),
    ]
}

/// Breadth-first flood fill from `start`, returning the blob size and
/// whether any of its cells is set in `marked`.
#[allow(clippy::too_many_arguments)]
fn flood_fill(
    cells: &[f32],
    labels: &mut [u32],
    marked: &[bool],
    start: usize,
    label: u32,
    width: usize,
    connectivity: Connectivity,
    queue: &mut VecDeque<usize>,
) -> (usize, bool) {
    let is_marked = |pos: usize| marked.get(pos).copied().unwrap_or(false);
    labels[start] = label;
    queue.push_back(start);
    let mut size = 1;
    let mut touched = is_marked(start);

    while let Some(pos) = queue.pop_front() {
        for next in neighbors(pos, width, cells.len(), connectivity)
            .into_iter()
            .flatten()
        {
            if labels[next] == 0 && cells[next] >= BLOB_THRESHOLD {
                labels[next] = label;
                queue.push_back(next);
                size += 1;
                touched |= is_marked(next);
            }
        }
    }
    (size, touched)
}

/// Labels all blobs of cells `>= 0.5` and zeroes those the policy rejects.
///
/// Cells below the threshold are never touched.
pub fn select_blobs(
    matrix: &mut ConfidenceMatrix<'_>,
    policy: BlobPolicy,
    connectivity: Connectivity,
) -> BlobSummary {
    select_blobs_keeping(matrix, policy, connectivity, &[])
}

/// Like [`select_blobs`], but a blob containing any cell set in `marked` is
/// kept whatever its size.
///
/// `marked` is indexed like the matrix cells; missing entries count as unset,
/// so an empty slice marks nothing. The largest blob is still measured over
/// all blobs.
pub fn select_blobs_keeping(
    matrix: &mut ConfidenceMatrix<'_>,
    policy: BlobPolicy,
    connectivity: Connectivity,
    marked: &[bool],
) -> BlobSummary {
    let width = matrix.width();
    let cells = matrix.cells_mut();
    let mut labels = vec![0u32; cells.len()];
    let mut sizes: Vec<usize> = Vec::new();
    let mut touched: Vec<bool> = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..cells.len() {
        if labels[start] == 0 && cells[start] >= BLOB_THRESHOLD {
            let label = sizes.len() as u32 + 1;
            let (size, hit) = flood_fill(
                cells,
                &mut labels,
                marked,
                start,
                label,
                width,
                connectivity,
                &mut queue,
            );
            sizes.push(size);
            touched.push(hit);
        }
    }

    let (winner, largest) = sizes
        .iter()
        .enumerate()
        .fold((0usize, 0usize), |best, (index, &size)| {
            if size > best.1 {
                (index + 1, size)
            } else {
                best
            }
        });

    let keep: Vec<bool> = sizes
        .iter()
        .zip(&touched)
        .enumerate()
        .map(|(index, (&size, &hit))| {
            hit || match policy {
                BlobPolicy::Largest => index + 1 == winner,
                BlobPolicy::SizeFactor(factor) => size.saturating_mul(factor as usize) >= largest,
            }
        })
        .collect();

    for (cell, &label) in cells.iter_mut().zip(&labels) {
        if label != 0 && !keep[label as usize - 1] {
            *cell = 0.0;
        }
    }

    let summary = BlobSummary {
        blobs: sizes.len(),
        kept: keep.iter().filter(|&&k| k).count(),
        largest,
    };
    debug!(
        "blobs: {} found, {} kept, largest {} cells",
        summary.blobs, summary.kept, summary.largest
    );
    summary
}

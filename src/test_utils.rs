//! Test utilities for imageops-siox
//!
//! Synthetic images and trimaps shared by the unit tests.
//! It is only compiled when running tests.

use std::ops::Range;

use crate::imageops_siox::color::ChannelOrder;

/// Background color of the synthetic images (a saturated blue).
pub const BACKGROUND_RGB: [u8; 3] = [20, 40, 200];
/// Foreground color of the synthetic images (a saturated yellow).
pub const FOREGROUND_RGB: [u8; 3] = [250, 220, 10];

/// Creates a packed `Xrgb` image with a foreground rectangle on background.
///
/// # Returns
/// `(pixels, width, height)`
pub fn block_image(
    width: usize,
    height: usize,
    xs: Range<usize>,
    ys: Range<usize>,
) -> (Vec<u32>, usize, usize) {
    let order = ChannelOrder::Xrgb;
    let pixels = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| {
            if xs.contains(&x) && ys.contains(&y) {
                order.pack(FOREGROUND_RGB)
            } else {
                order.pack(BACKGROUND_RGB)
            }
        })
        .collect();
    (pixels, width, height)
}

/// Creates a trimap with a sure-background frame, sure-foreground seeds and
/// undecided cells (`0.5`) everywhere else.
pub fn border_trimap(width: usize, height: usize, foreground: &[(usize, usize)]) -> Vec<f32> {
    let mut cells = vec![0.5f32; width * height];
    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                cells[y * width + x] = 0.0;
            }
        }
    }
    for &(x, y) in foreground {
        cells[y * width + x] = 1.0;
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_image_with_valid_input_creates_image() {
        let (pixels, width, height) = block_image(4, 3, 1..3, 1..2);
        assert_eq!((width, height), (4, 3));
        assert_eq!(pixels.len(), 12);
        assert_eq!(pixels[5], 0x00fa_dc0a);
        assert_eq!(pixels[0], 0x0014_28c8);
        assert_eq!(pixels[9], 0x0014_28c8);
    }

    #[test]
    fn border_trimap_with_seed_marks_frame_and_seed() {
        let cells = border_trimap(4, 4, &[(1, 2)]);
        assert_eq!(&cells[0..4], &[0.0; 4]);
        assert_eq!(cells[5], 0.5);
        assert_eq!(cells[9], 1.0);
        assert_eq!(cells[7], 0.0);
    }
}

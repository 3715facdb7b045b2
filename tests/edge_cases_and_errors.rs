//! Edge case and error handling tests for imageops-siox
//!
//! Degenerate geometries, trimaps without usable samples and invalid
//! parameters.

use image::{Luma, Rgb};
use imageops_siox::{
    segmentate, Brush, ChannelOrder, Image, Limits, Refinement, SegmentationConfig,
    SegmentationError, SegmentationExt, SegmentationOutcome, Segmentator,
};

const BACKGROUND: [u8; 3] = [20, 40, 200];
const FOREGROUND: [u8; 3] = [250, 220, 10];

fn block_pixels(
    width: usize,
    height: usize,
    xs: std::ops::Range<usize>,
    ys: std::ops::Range<usize>,
) -> Vec<u32> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            let rgb = if xs.contains(&x) && ys.contains(&y) {
                FOREGROUND
            } else {
                BACKGROUND
            };
            ChannelOrder::Xrgb.pack(rgb)
        })
        .collect()
}

fn framed_trimap(width: usize, height: usize) -> Vec<f32> {
    (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                0.0
            } else {
                0.5
            }
        })
        .collect()
}

// Degenerate geometries

#[test]
fn single_pixel_sure_background_becomes_zero() {
    let pixels = [ChannelOrder::Xrgb.pack(BACKGROUND)];
    let mut trimap = [0.0f32];
    let mut segmentator = Segmentator::new(SegmentationConfig::default()).unwrap();

    let outcome = segmentator
        .extract(&pixels, &mut trimap, 1, 1, Refinement::Recalculate)
        .unwrap();

    assert_eq!(outcome, SegmentationOutcome::Segmented);
    assert_eq!(trimap, [0.0]);
}

#[test]
fn single_pixel_without_background_is_left_unchanged() {
    let pixels = [ChannelOrder::Xrgb.pack(FOREGROUND)];
    let mut trimap = [0.5f32];
    let mut segmentator = Segmentator::new(SegmentationConfig::default()).unwrap();

    let outcome = segmentator
        .extract(&pixels, &mut trimap, 1, 1, Refinement::Recalculate)
        .unwrap();

    assert_eq!(outcome, SegmentationOutcome::NoBackground);
    assert_eq!(trimap, [0.5]);
}

#[test]
fn single_row_image_produces_binary_mask() {
    let pixels = block_pixels(12, 1, 4..8, 0..1);
    let mut trimap = vec![0.5f32; 12];
    trimap[0] = 0.0;
    trimap[11] = 0.0;
    trimap[5] = 1.0;

    let mask = segmentate(&pixels, &mut trimap, 12, 1, Limits::DEFAULT, 0).unwrap();
    assert!(mask.iter().all(|&v| v == 0.0 || v == 1.0));
    assert_eq!(mask[0], 0.0);
}

#[test]
fn tiny_image_mask_is_binary() {
    let pixels = block_pixels(4, 4, 1..3, 1..3);
    let mut trimap = vec![0.5f32; 16];
    for corner in [0, 3, 12, 15] {
        trimap[corner] = 0.05;
    }
    for center in [5, 6, 9, 10] {
        trimap[center] = 0.95;
    }

    // Smoothing and the final dilation reach every cell of a 4x4 grid, so
    // the 2x2 block grows to the whole image.
    let mask = segmentate(&pixels, &mut trimap, 4, 4, Limits::DEFAULT, 0).unwrap();
    assert_eq!(mask, [1.0f32; 16].as_slice());
}

// Trimaps without usable samples

#[test]
fn trimap_without_background_is_left_unchanged() {
    let pixels = block_pixels(8, 8, 2..6, 2..6);
    let mut trimap = vec![0.5f32; 64];
    trimap[20] = 1.0;
    trimap[63] = 0.2;
    let before = trimap.clone();

    let mask = segmentate(&pixels, &mut trimap, 8, 8, Limits::DEFAULT, 6).unwrap();
    assert_eq!(mask, before.as_slice());
}

#[test]
fn trimap_without_foreground_labels_distant_colors_as_foreground() {
    let pixels = block_pixels(16, 16, 5..11, 5..11);
    let mut trimap = framed_trimap(16, 16);

    let mask = segmentate(&pixels, &mut trimap, 16, 16, Limits::DEFAULT, 0).unwrap();

    for y in 0..16 {
        for x in 0..16 {
            let inside = (5..11).contains(&x) && (5..11).contains(&y);
            assert_eq!(mask[y * 16 + x], if inside { 1.0 } else { 0.0 }, "({x}, {y})");
        }
    }
}

#[test]
fn uniform_image_with_background_frame_becomes_empty_mask() {
    let pixels = vec![ChannelOrder::Xrgb.pack(BACKGROUND); 100];
    let mut trimap = framed_trimap(10, 10);

    let mask = segmentate(&pixels, &mut trimap, 10, 10, Limits::DEFAULT, 6).unwrap();
    assert!(mask.iter().all(|&v| v == 0.0));
}

#[test]
fn segmentator_recovers_after_no_background_outcome() {
    let pixels = block_pixels(16, 16, 5..11, 5..11);
    let mut segmentator =
        Segmentator::new(SegmentationConfig::default().with_smoothness(0)).unwrap();

    let mut trimap = vec![0.5f32; 256];
    let outcome = segmentator
        .extract(&pixels, &mut trimap, 16, 16, Refinement::AddForeground)
        .unwrap();
    assert_eq!(outcome, SegmentationOutcome::NoBackground);

    let mut trimap = framed_trimap(16, 16);
    let outcome = segmentator
        .extract(&pixels, &mut trimap, 16, 16, Refinement::Recalculate)
        .unwrap();
    assert_eq!(outcome, SegmentationOutcome::Segmented);
    assert_eq!(trimap[7 * 16 + 7], 1.0);
}

// Invalid input

#[test]
fn mismatched_buffer_lengths_return_dimension_mismatch() {
    let pixels = vec![0u32; 15];
    let mut trimap = vec![0.0f32; 16];
    assert_eq!(
        segmentate(&pixels, &mut trimap, 4, 4, Limits::DEFAULT, 6).unwrap_err(),
        SegmentationError::DimensionMismatch {
            expected: (16, 1),
            actual: (15, 1),
        }
    );

    let pixels = vec![0u32; 16];
    let mut trimap = vec![0.0f32; 12];
    assert!(matches!(
        segmentate(&pixels, &mut trimap, 4, 4, Limits::DEFAULT, 6),
        Err(SegmentationError::DimensionMismatch { .. })
    ));
}

#[test]
fn zero_dimensions_return_empty_image() {
    let mut trimap: Vec<f32> = Vec::new();
    assert_eq!(
        segmentate(&[], &mut trimap, 0, 0, Limits::DEFAULT, 6).unwrap_err(),
        SegmentationError::EmptyImage
    );

    let image: Image<Rgb<u8>> = Image::new(0, 5);
    let mut mask: Image<Luma<f32>> = Image::new(0, 5);
    assert_eq!(
        image
            .segment_foreground(&mut mask, &SegmentationConfig::default())
            .unwrap_err(),
        SegmentationError::EmptyImage
    );
}

#[test]
fn image_and_trimap_size_mismatch_returns_error() {
    let image: Image<Rgb<u8>> = Image::new(8, 6);
    let mut trimap: Image<Luma<f32>> = Image::new(6, 8);
    assert_eq!(
        image
            .segment_foreground(&mut trimap, &SegmentationConfig::default())
            .unwrap_err(),
        SegmentationError::DimensionMismatch {
            expected: (8, 6),
            actual: (6, 8),
        }
    );
}

#[test]
fn invalid_parameters_return_invalid_parameter() {
    let mut trimap = vec![0.0f32; 4];
    for limits in [[0.0, 1.25, 2.5], [0.66, -1.0, 2.5], [0.66, 1.25, f32::NAN]] {
        assert!(matches!(
            segmentate(&[0; 4], &mut trimap, 2, 2, limits, 6),
            Err(SegmentationError::InvalidParameter(_))
        ));
    }

    assert!(matches!(
        Segmentator::new(SegmentationConfig::default().with_significance(0.0)),
        Err(SegmentationError::InvalidParameter(_))
    ));
    assert!(matches!(
        Brush::new(1, 1, 0),
        Err(SegmentationError::InvalidParameter(_))
    ));
}

#[test]
fn error_messages_describe_the_problem() {
    let error = SegmentationError::DimensionMismatch {
        expected: (4, 4),
        actual: (4, 3),
    };
    assert!(error.to_string().contains("(4, 3)"));
    assert_eq!(
        SegmentationError::InvalidParameter("brush radius must be non-zero".to_string())
            .to_string(),
        "Invalid parameter: brush radius must be non-zero"
    );
    assert_eq!(SegmentationError::EmptyImage.to_string(), "Image dimensions must be non-zero");
}

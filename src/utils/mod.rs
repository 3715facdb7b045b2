//! Internal utility functions for imageops-siox.
//!
//! Geometry checks shared by the segmentation entry points.

use crate::error::SegmentationError;

/// Validates that an image has non-zero dimensions.
///
/// # Arguments
///
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Returns
///
/// `Ok(())` if the dimensions are valid, otherwise `EmptyImage`
pub fn validate_non_empty_image(width: usize, height: usize) -> Result<(), SegmentationError> {
    if width == 0 || height == 0 {
        Err(SegmentationError::EmptyImage)
    } else {
        Ok(())
    }
}

/// Validates that a flat buffer holds exactly `width * height` elements.
///
/// # Arguments
///
/// * `len` - The length of the buffer
/// * `width` - The width of the image
/// * `height` - The height of the image
///
/// # Returns
///
/// `Ok(())` if the length matches, otherwise `DimensionMismatch`
pub fn validate_buffer_len(
    len: usize,
    width: usize,
    height: usize,
) -> Result<(), SegmentationError> {
    let expected = width
        .checked_mul(height)
        .ok_or_else(|| SegmentationError::InvalidParameter(format!("{width}x{height} overflows")))?;
    if len != expected {
        Err(SegmentationError::DimensionMismatch {
            expected: (expected, 1),
            actual: (len, 1),
        })
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
///
/// # Arguments
///
/// * `image` - The (width, height) of the first image
/// * `trimap` - The (width, height) of the second image
///
/// # Returns
///
/// `Ok(())` if the dimensions match, otherwise `DimensionMismatch`
pub fn validate_matching_dimensions(
    image: (u32, u32),
    trimap: (u32, u32),
) -> Result<(), SegmentationError> {
    if image != trimap {
        Err(SegmentationError::DimensionMismatch {
            expected: (image.0 as usize, image.1 as usize),
            actual: (trimap.0 as usize, trimap.1 as usize),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_non_empty_image() {
        assert!(validate_non_empty_image(100, 100).is_ok());
        assert!(validate_non_empty_image(1, 1).is_ok());
        assert_eq!(
            validate_non_empty_image(0, 100),
            Err(SegmentationError::EmptyImage)
        );
        assert!(validate_non_empty_image(100, 0).is_err());
        assert!(validate_non_empty_image(0, 0).is_err());
    }

    #[test]
    fn test_validate_buffer_len() {
        assert!(validate_buffer_len(12, 4, 3).is_ok());
        assert_eq!(
            validate_buffer_len(11, 4, 3),
            Err(SegmentationError::DimensionMismatch {
                expected: (12, 1),
                actual: (11, 1),
            })
        );
        assert!(matches!(
            validate_buffer_len(0, usize::MAX, 2),
            Err(SegmentationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_validate_matching_dimensions() {
        assert!(validate_matching_dimensions((100, 100), (100, 100)).is_ok());
        assert!(validate_matching_dimensions((50, 75), (50, 75)).is_ok());
        assert_eq!(
            validate_matching_dimensions((100, 100), (100, 50)),
            Err(SegmentationError::DimensionMismatch {
                expected: (100, 100),
                actual: (100, 50),
            })
        );
    }
}

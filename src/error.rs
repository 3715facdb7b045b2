use thiserror::Error;

/// Error type for segmentation operations
///
/// The engine has a deliberately small error surface: geometry that does not
/// match the buffers, parameters that cannot drive the clustering, and running
/// out of memory while collecting sample colors. A trimap without any sure
/// background is not an error; it leaves the confidence matrix untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentationError {
    /// A buffer does not hold `xres * yres` elements
    ///
    /// Returned when the pixel buffer or the confidence matrix disagrees
    /// with the resolution passed alongside it, or when an image and its
    /// trimap have different dimensions.
    #[error("Buffer dimensions do not match: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height) or (length, 1) for flat buffers
        expected: (usize, usize),
        /// Actual dimensions (width, height) or (length, 1) for flat buffers
        actual: (usize, usize),
    },

    /// Width or height is zero
    #[error("Image dimensions must be non-zero")]
    EmptyImage,

    /// Invalid parameter provided to the operation
    ///
    /// This error is returned when a limit, weight, threshold or brush
    /// setting is outside the range the algorithm accepts.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Sample collection could not reserve memory
    #[error("Failed to allocate {requested} color samples")]
    AllocationFailed {
        /// Number of samples that were requested
        requested: usize,
    },
}

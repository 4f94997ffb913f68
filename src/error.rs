use thiserror::Error;

/// Failures the diff engine can report. Every error is a synchronous return
/// value; a call either succeeds with a complete region list or fails whole.
#[derive(Debug, Error)]
pub enum DiffError {
    /// The comparator was handed rasters of unequal size. Callers must
    /// normalize sizes first (the pipeline does this automatically).
    #[error(
        "raster dimensions differ: {expected_width}x{expected_height} vs {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// A raster with zero width or height was passed to the pipeline.
    #[error("raster has zero area ({width}x{height})")]
    InvalidInput { width: u32, height: u32 },

    /// A pixel buffer does not hold `width * height` RGBA pixels.
    #[error("pixel buffer holds {len} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferMismatch {
        width: u32,
        height: u32,
        len: usize,
        expected: usize,
    },

    /// The scan produced more markers than the configured limit allows,
    /// guarding the clustering stage against pathological inputs.
    #[error("difference scan produced {markers} markers, over the limit of {limit}")]
    ResourceExhausted { markers: usize, limit: usize },

    /// A parallel scan worker was lost before returning its band.
    #[error("parallel scan worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

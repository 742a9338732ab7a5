use thiserror::Error;

/// Exit code for failures that retrying cannot fix (bad inputs or options).
pub const EXIT_NO_RETRY: i32 = 3;

#[derive(Error, Debug)]
pub enum PansharpenError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Pan band must be 1 band - {path} has {count}")]
    PanBandCount { path: String, count: usize },

    #[error("Pan band {pan_width}x{pan_height} must be larger than RGB bands {color_width}x{color_height}")]
    PanNotLarger {
        pan_width: usize,
        pan_height: usize,
        color_width: usize,
        color_height: usize,
    },

    #[error("Color inputs differ in size: {0}x{1} and {2}x{3}")]
    ColorSizeMismatch(usize, usize, usize, usize),

    #[error("CRS of inputs must be the same: received {0} and {1}")]
    CrsMismatch(String, String),

    #[error("Custom blocksize must be greater than {min}: got {size}")]
    InvalidCustomWindow { size: usize, min: usize },

    #[error("Unsupported destination data type: {0} (expected uint8, uint16 or int16)")]
    UnsupportedDtype(String),

    #[error("Unsupported pixel type for {path}: {pixel_type}")]
    UnsupportedPixelType { path: String, pixel_type: String },

    #[error("Worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Geotransform is not invertible: {0:?}")]
    DegenerateTransform([f64; 6]),

    #[error("Cannot reproject between different CRSs ({0} -> {1})")]
    UnsupportedReprojection(String, String),

    #[error("Band {band} out of range (raster has {count} bands)")]
    BandOutOfRange { band: usize, count: usize },

    #[error("Window rows [{0},{1}) cols [{2},{3}) lies outside the raster")]
    WindowOutOfBounds(isize, isize, isize, isize),

    #[error("Resampled color shape {actual:?} does not match pan shape {expected:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Color stack must have 3 bands, got {0}")]
    ColorBandCount(usize),

    #[error("Raster handle for {0} is poisoned")]
    PoisonedHandle(String),

    #[error("Tile writer stopped before all tiles were written")]
    WriterClosed,

    #[error("A tile worker panicked")]
    WorkerPanicked,
}

impl PansharpenError {
    /// Errors detected while validating inputs, before any tile is scheduled.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PansharpenError::PanBandCount { .. }
                | PansharpenError::PanNotLarger { .. }
                | PansharpenError::ColorSizeMismatch(..)
                | PansharpenError::CrsMismatch(..)
                | PansharpenError::InvalidCustomWindow { .. }
                | PansharpenError::UnsupportedDtype(_)
                | PansharpenError::UnsupportedPixelType { .. }
                | PansharpenError::InvalidWorkerCount
                | PansharpenError::InvalidDimensions(..)
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_configuration() {
            EXIT_NO_RETRY
        } else {
            1
        }
    }
}

pub type Result<T> = std::result::Result<T, PansharpenError>;

use crate::dtype::DstDtype;
use crate::error::{PansharpenError, Result};
use crate::geo::check_crs;
use crate::io::RasterDescriptor;
use crate::profile::{validate_custom_window, MIN_CUSTOM_WINDOW};

pub const DEFAULT_WEIGHT: f32 = 0.2;
pub const DEFAULT_NODATA: f64 = 0.0;

/// Everything a run needs, as collected from the command line.
#[derive(Debug, Clone)]
pub struct PansharpenConfig {
    pub pan_path: String,
    /// Red, green, blue, in that order.
    pub color_paths: [String; 3],
    pub dst_path: String,
    pub weight: f32,
    pub dst_dtype: DstDtype,
    pub nodata: f64,
    pub half_window: bool,
    /// Custom square tile size; 0 uses the pan raster's natural blocks.
    pub custom_window: usize,
    pub min_custom_window: usize,
    pub jobs: usize,
    pub verbose: bool,
}

impl PansharpenConfig {
    pub fn new(pan_path: &str, color_paths: [&str; 3], dst_path: &str) -> Self {
        Self {
            pan_path: pan_path.to_string(),
            color_paths: color_paths.map(str::to_string),
            dst_path: dst_path.to_string(),
            weight: DEFAULT_WEIGHT,
            dst_dtype: DstDtype::default(),
            nodata: DEFAULT_NODATA,
            half_window: false,
            custom_window: 0,
            min_custom_window: MIN_CUSTOM_WINDOW,
            jobs: 1,
            verbose: false,
        }
    }

    /// Option checks that need no input raster.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(PansharpenError::InvalidWorkerCount);
        }
        validate_custom_window(self.custom_window, self.min_custom_window)
    }
}

/// Checks across the opened inputs, run before any tile is planned.
pub fn validate_inputs(pan: &RasterDescriptor, colors: [&RasterDescriptor; 3]) -> Result<()> {
    if pan.band_count > 1 {
        return Err(PansharpenError::PanBandCount {
            path: pan.path.clone(),
            count: pan.band_count,
        });
    }

    if pan.pixel_type.max_value().is_none() {
        return Err(PansharpenError::UnsupportedPixelType {
            path: pan.path.clone(),
            pixel_type: pan.pixel_type.to_string(),
        });
    }

    let red = colors[0];
    for other in &colors[1..] {
        if (other.width, other.height) != (red.width, red.height) {
            return Err(PansharpenError::ColorSizeMismatch(
                red.width,
                red.height,
                other.width,
                other.height,
            ));
        }
    }

    if pan.width <= red.width || pan.height <= red.height {
        return Err(PansharpenError::PanNotLarger {
            pan_width: pan.width,
            pan_height: pan.height,
            color_width: red.width,
            color_height: red.height,
        });
    }

    check_crs(&[
        colors[0].projection.as_str(),
        colors[1].projection.as_str(),
        colors[2].projection.as_str(),
        pan.projection.as_str(),
    ])
}

/// Read-only arguments shared by every tile worker.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub weight: f32,
    pub dst_dtype: DstDtype,
    /// `dst_dtype.rescale_divisor()`, resolved once.
    pub rescale_divisor: f64,
    pub half_window: bool,
    pub nodata: f64,
    pub verbose: bool,
    pub pan: RasterDescriptor,
    /// Grid of the color inputs, taken from the red band.
    pub color: RasterDescriptor,
}

impl GlobalArgs {
    pub fn new(config: &PansharpenConfig, pan: &RasterDescriptor, color: &RasterDescriptor) -> Self {
        Self {
            weight: config.weight,
            dst_dtype: config.dst_dtype,
            rescale_divisor: config.dst_dtype.rescale_divisor(),
            half_window: config.half_window,
            nodata: config.nodata,
            verbose: config.verbose,
            pan: pan.clone(),
            color: color.clone(),
        }
    }
}

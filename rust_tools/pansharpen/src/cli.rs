use crate::config::{PansharpenConfig, DEFAULT_NODATA, DEFAULT_WEIGHT};
use crate::error::Result;
use crate::profile::MIN_CUSTOM_WINDOW;
use clap::Parser;

/// Pansharpens a landsat scene.
///
/// Input is a panchromatic band plus 3 color bands, e.g.
/// `pansharpen B8.tif B4.tif B3.tif B2.tif out.tif`
#[derive(Parser, Debug)]
#[command(name = "pansharpen")]
#[command(version)]
pub struct Args {
    /// Panchromatic band (single band GeoTIFF)
    #[arg(value_name = "PAN")]
    pub pan: String,

    /// Red band
    #[arg(value_name = "RED")]
    pub red: String,

    /// Green band
    #[arg(value_name = "GREEN")]
    pub green: String,

    /// Blue band
    #[arg(value_name = "BLUE")]
    pub blue: String,

    /// Output GeoTIFF path (4 bands: RGB + alpha)
    #[arg(value_name = "OUTPUT")]
    pub output: String,

    /// Output data type: uint8, uint16 or int16
    #[arg(long, default_value = "uint16", value_name = "DTYPE")]
    pub dst_dtype: String,

    /// Nodata value of the color bands
    #[arg(long, default_value_t = DEFAULT_NODATA, value_name = "VALUE")]
    pub ndv: f64,

    /// Weight of blue band
    #[arg(short, long, default_value_t = DEFAULT_WEIGHT)]
    pub weight: f32,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbosity: bool,

    /// Number of worker threads
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    pub jobs: usize,

    /// Use a half window, assuming pan is aligned with the rgb bands
    #[arg(long)]
    pub half_window: bool,

    /// Block size for custom windows (> 150); 0 uses the pan band's blocks
    #[arg(short, long, default_value_t = 0, value_name = "SIZE")]
    pub customwindow: usize,
}

impl Args {
    pub fn to_config(&self) -> Result<PansharpenConfig> {
        let mut config = PansharpenConfig::new(
            &self.pan,
            [self.red.as_str(), self.green.as_str(), self.blue.as_str()],
            &self.output,
        );
        config.dst_dtype = self.dst_dtype.parse()?;
        config.nodata = self.ndv;
        config.weight = self.weight;
        config.verbose = self.verbosity;
        config.jobs = self.jobs;
        config.half_window = self.half_window;
        config.custom_window = self.customwindow;
        config.min_custom_window = MIN_CUSTOM_WINDOW;
        config.validate()?;
        Ok(config)
    }
}

// Library exports for testing and reuse

pub mod align;
pub mod brovey;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod dtype;
pub mod error;
pub mod geo;
pub mod io;
pub mod pipeline;
pub mod profile;
pub mod resample;
pub mod run;
pub mod scheduler;

// Re-export commonly used types
pub use chunking::{TileJob, Window};
pub use config::{GlobalArgs, PansharpenConfig};
pub use dtype::{DstDtype, PixelType};
pub use error::{PansharpenError, Result};
pub use io::{GdalRaster, GdalWriter, MemoryRaster, MemorySink, RasterDescriptor, RasterSink, RasterSource};
pub use pipeline::{pansharpen_arrays, FusionPipeline, TileData, TileResult};
pub use resample::{Bilinear, Resampler};
pub use run::{calculate_pansharpen, execute_into_file, execute_plan, plan_run, RunPlan};
pub use scheduler::{RunSummary, TileScheduler};

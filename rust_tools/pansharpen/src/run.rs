use crate::chunking::TileJob;
use crate::config::{validate_inputs, GlobalArgs, PansharpenConfig};
use crate::error::Result;
use crate::io::{GdalRaster, GdalWriter, RasterDescriptor, RasterSink, RasterSource};
use crate::pipeline::FusionPipeline;
use crate::resample::{Bilinear, Resampler};
use crate::scheduler::{RunSummary, TileScheduler};
use log::{info, warn};
use std::path::Path;

/// Validated arguments and the tile jobs of one run.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub args: GlobalArgs,
    pub jobs: Vec<TileJob>,
}

/// Validate the configuration against the inputs and plan the tiles.
/// Nothing is read or written here.
pub fn plan_run(
    config: &PansharpenConfig,
    pan: &RasterDescriptor,
    colors: [&RasterDescriptor; 3],
) -> Result<RunPlan> {
    config.validate()?;
    validate_inputs(pan, colors)?;

    let jobs = pan.tile_jobs(config.custom_window);
    info!(
        "Planned {} tiles over {}x{} pan raster",
        jobs.len(),
        pan.width,
        pan.height
    );

    Ok(RunPlan {
        args: GlobalArgs::new(config, pan, colors[0]),
        jobs,
    })
}

/// Run a plan against opened inputs, writing into `sink`.
pub fn execute_plan<R, Z, S>(
    plan: &RunPlan,
    pan: &R,
    colors: [&R; 3],
    resampler: &Z,
    workers: usize,
    sink: &mut S,
) -> Result<RunSummary>
where
    R: RasterSource,
    Z: Resampler,
    S: RasterSink,
{
    let pipeline = FusionPipeline::new(pan, colors, resampler, &plan.args);
    TileScheduler::new(&pipeline, workers)?.run(&plan.jobs, sink)
}

/// Pansharpen the files named in `config` into a new RGBA GeoTIFF.
///
/// Configuration problems surface before the output is created. If any tile
/// fails, the partial output is removed and the error returned.
pub fn calculate_pansharpen(config: &PansharpenConfig) -> Result<RunSummary> {
    config.validate()?;

    let pan = GdalRaster::open(&config.pan_path)?;
    let [red, green, blue] = &config.color_paths;
    let colors = [
        GdalRaster::open(red)?,
        GdalRaster::open(green)?,
        GdalRaster::open(blue)?,
    ];
    let color_refs = [&colors[0], &colors[1], &colors[2]];

    let plan = plan_run(
        config,
        pan.descriptor(),
        color_refs.map(|c| c.descriptor()),
    )?;

    let writer = GdalWriter::create(&config.dst_path, pan.descriptor(), config.dst_dtype)?;
    execute_into_file(&plan, &pan, color_refs, &Bilinear, config.jobs, writer)
}

/// Run a plan into a freshly created output file.
///
/// The file is flushed and closed on success. On any tile, write or flush
/// failure it is removed, so a failed run never leaves a partial output.
pub fn execute_into_file<R, Z>(
    plan: &RunPlan,
    pan: &R,
    colors: [&R; 3],
    resampler: &Z,
    workers: usize,
    mut writer: GdalWriter,
) -> Result<RunSummary>
where
    R: RasterSource,
    Z: Resampler,
{
    let path = writer.path().to_path_buf();
    match execute_plan(plan, pan, colors, resampler, workers, &mut writer) {
        Ok(summary) => match writer.finish() {
            Ok(()) => Ok(summary),
            Err(e) => {
                remove_partial(&path);
                Err(e)
            }
        },
        Err(e) => {
            writer.discard();
            Err(e)
        }
    }
}

fn remove_partial(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Could not remove partial output {}: {}", path.display(), e);
    }
}

use crate::chunking::TileJob;
use crate::error::{PansharpenError, Result};
use crate::io::{RasterSink, RasterSource};
use crate::pipeline::{FusionPipeline, TileResult};
use crate::resample::Resampler;
use log::{debug, info};
use rayon::prelude::*;
use std::sync::mpsc;
use std::thread;

/// Finished tiles buffered per worker between the pool and the writer.
const RESULTS_PER_WORKER: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub tiles_written: usize,
}

/// Worker pool plus the single writer role.
///
/// Workers compute tiles in parallel and hand them over a bounded channel;
/// only the thread calling [`TileScheduler::run`] touches the sink, and each
/// result is written at its own job window.
pub struct TileScheduler<'p, 'a, R: RasterSource, Z: Resampler> {
    pipeline: &'p FusionPipeline<'a, R, Z>,
    workers: usize,
}

impl<'p, 'a, R: RasterSource, Z: Resampler> TileScheduler<'p, 'a, R, Z> {
    pub fn new(pipeline: &'p FusionPipeline<'a, R, Z>, workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(PansharpenError::InvalidWorkerCount);
        }
        Ok(Self { pipeline, workers })
    }

    /// Process every job exactly once and write it to `sink`.
    ///
    /// Stops at the first failing tile or write; remaining jobs are dropped.
    pub fn run<S: RasterSink>(&self, jobs: &[TileJob], sink: &mut S) -> Result<RunSummary> {
        let total = jobs.len();
        info!("Processing {} tiles with {} workers", total, self.workers);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("pansharpen-worker-{}", i))
            .build()?;

        let (tx, rx) = mpsc::sync_channel::<TileResult>(self.workers * RESULTS_PER_WORKER);
        let pipeline = self.pipeline;
        let verbose = pipeline.args().verbose;

        thread::scope(|scope| {
            let producer = scope.spawn(move || {
                pool.install(|| {
                    jobs.par_iter().try_for_each_with(tx, |tx, job| {
                        let result = pipeline.process(job)?;
                        tx.send(result).map_err(|_| PansharpenError::WriterClosed)
                    })
                })
            });

            let mut tiles_written = 0;
            let mut write_error = None;
            for result in rx.iter() {
                if let Err(e) = sink.write_block(&result) {
                    write_error = Some(e);
                    break;
                }
                tiles_written += 1;

                if verbose {
                    info!(
                        "Wrote tile {:?} ({}/{})",
                        result.block, tiles_written, total
                    );
                } else {
                    debug!("Wrote tile {:?} ({}/{})", result.block, tiles_written, total);
                }
            }
            // Unblocks any worker still sending so the pool can wind down.
            drop(rx);

            let computed = producer.join().map_err(|_| PansharpenError::WorkerPanicked)?;
            if let Some(e) = write_error {
                return Err(e);
            }
            computed?;

            info!("Wrote {} of {} tiles", tiles_written, total);
            Ok(RunSummary { tiles_written })
        })
    }
}

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use pansharpen::cli::Args;
use pansharpen::error::Result;
use pansharpen::run::calculate_pansharpen;

fn run(args: &Args) -> Result<()> {
    let config = args.to_config()?;

    info!("Pan band: {}", config.pan_path);
    info!(
        "Color bands: {} {} {}",
        config.color_paths[0], config.color_paths[1], config.color_paths[2]
    );
    info!(
        "Weight: {}, output type: {}, jobs: {}",
        config.weight, config.dst_dtype, config.jobs
    );

    let summary = calculate_pansharpen(&config)?;

    info!("Wrote {} tiles to {}", summary.tiles_written, config.dst_path);
    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbosity { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Pansharpen ===");

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }

    info!("=== Done! ===");
}

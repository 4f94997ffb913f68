// Command-line runner for the `delta_vision` library: compares two images,
// writes a copy of the second with the divergent regions outlined, and prints
// the region list as JSON.

use std::path::PathBuf;

use clap::Parser;
use delta_vision::core_modules::utils::image_helper::image_helper;
use delta_vision::error::DiffError;
use delta_vision::pipeline::{DiffConfig, DiffPipeline, DiffReport};

#[derive(Parser, Debug)]
#[command(name = "delta-vision", about = "Highlight the differences between two images")]
struct Args {
    /// Baseline image.
    original: PathBuf,

    /// Image to compare against the baseline.
    modified: PathBuf,

    /// Where to write the highlighted output image.
    #[arg(short, long, default_value = "diff.png")]
    output: PathBuf,

    /// Per-pixel channel-sum difference cutoff.
    #[arg(long, default_value_t = 25)]
    threshold: u32,

    /// Maximum gap between markers that still merge into one region.
    #[arg(long, default_value_t = 15)]
    cluster_distance: u32,

    /// Margin added around each reported region.
    #[arg(long, default_value_t = 10)]
    padding: u32,
}

fn main() {
    let _logger = flexi_logger::Logger::try_with_env_or_str("info")
        .and_then(|logger| logger.start())
        .unwrap_or_else(|e| panic!("Logger initialization failed: {e}"));

    if let Err(error) = run(Args::parse()) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), DiffError> {
    let original = image_helper::load(&args.original)?;
    let modified = image_helper::load(&args.modified)?;

    let pipeline = DiffPipeline::new(DiffConfig {
        threshold: args.threshold,
        cluster_distance: args.cluster_distance,
        padding: args.padding,
        ..DiffConfig::default()
    });

    match pipeline.generate_report(&original, &modified)? {
        DiffReport::Identical => {
            log::info!("no differences found");
            println!("[]");
        }
        DiffReport::Divergent(summary) => {
            log::info!(
                "{} differing pixels in {} regions at {}x{}",
                summary.marker_count,
                summary.regions.len(),
                summary.compared_width,
                summary.compared_height
            );

            // Draw over the modified side, matching its compared size.
            let base = if modified.width() != summary.compared_width
                || modified.height() != summary.compared_height
            {
                image_helper::resize(&modified, summary.compared_width, summary.compared_height)?
            } else {
                modified
            };
            let canvas = image_helper::draw_highlights(
                &base,
                &summary.regions,
                image_helper::HIGHLIGHT_STROKE,
                image_helper::HIGHLIGHT_COLOR,
            )?;
            canvas.save(&args.output)?;
            log::info!("highlighted image written to {}", args.output.display());

            match serde_json::to_string_pretty(&summary.regions) {
                Ok(json) => println!("{json}"),
                Err(e) => log::warn!("could not serialize regions: {e}"),
            }
        }
    }

    Ok(())
}

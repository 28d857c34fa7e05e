//! Stabilize a video into a time-lapse.

use std::path::PathBuf;

use hyperlapse_common::config::config_file_path;
use hyperlapse_common::HyperlapseConfig;
use hyperlapse_render_engine::{
    run_hyperlapse, HyperlapseJob, PipelineProgress, PipelineStage,
};

use super::TuningArgs;

pub async fn run(
    input: PathBuf,
    output: Option<PathBuf>,
    codec: Option<String>,
    tuning: TuningArgs,
) -> anyhow::Result<()> {
    let output_path = output.unwrap_or_else(|| default_output(&input));

    // Config file as the base, explicit flags on top.
    let mut config = HyperlapseConfig::load(&config_file_path());
    tuning.apply(&mut config);
    if let Some(v) = codec {
        config.codec = v;
    }

    println!("Stabilizing: {}", input.display());
    println!("  Output: {}", output_path.display());
    println!("  Speed-up: {}x", config.speed_up);

    let job = HyperlapseJob::new(input, output_path.clone(), config);

    let progress_cb: Box<dyn Fn(PipelineProgress) + Send> = Box::new(|p| match p.stage {
        PipelineStage::Analyzing => {
            print!(
                "\r  Analyzing: {:.1}% ({}/{} frames)  ",
                p.fraction() * 100.0,
                p.current,
                p.total
            );
        }
        PipelineStage::Smoothing => {
            println!("\n  Smoothing trajectory...");
        }
        PipelineStage::Rendering => {
            print!(
                "\r  Rendering: {:.1}% ({}/{} frames)  ",
                p.fraction() * 100.0,
                p.current,
                p.total
            );
        }
        PipelineStage::Complete => {}
    });

    match run_hyperlapse(&job, Some(progress_cb)).await {
        Ok(plan) => {
            println!(
                "\nDone: {} ({}x{}, {:?})",
                output_path.display(),
                plan.output_width,
                plan.output_height,
                plan.strategy
            );
            Ok(())
        }
        Err(e) => {
            println!("\nStabilization failed: {e}");
            Err(e.into())
        }
    }
}

/// `video.mp4` becomes `video.hyperlapse.mp4` next to the input.
fn default_output(input: &PathBuf) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let ext = input
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    input.with_file_name(format!("{stem}.hyperlapse.{ext}"))
}

//! Analyze a video and print the stabilization plan without rendering.

use std::path::PathBuf;

use hyperlapse_common::config::config_file_path;
use hyperlapse_common::HyperlapseConfig;
use hyperlapse_render_engine::{analyze_hyperlapse, AnalysisReport, HyperlapseJob};

use super::TuningArgs;

pub async fn run(input: PathBuf, json: bool, tuning: TuningArgs) -> anyhow::Result<()> {
    // Config file as the base, explicit flags on top.
    let mut config = HyperlapseConfig::load(&config_file_path());
    tuning.apply(&mut config);

    // Analysis never writes the output path; a placeholder keeps the
    // job shape uniform.
    let placeholder = input.with_extension("analysis.mp4");
    let job = HyperlapseJob::new(input.clone(), placeholder, config);

    if !json {
        println!("Analyzing: {}", input.display());
    }

    let report = analyze_hyperlapse(&job, None)
        .await
        .map_err(|e| anyhow::anyhow!("Analysis failed: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &AnalysisReport) {
    println!(
        "  Input: {}x{} @ {:.3} fps, {} frames",
        report.meta.width, report.meta.height, report.meta.fps, report.meta.total_frames
    );
    println!("  Smoothing window: {} frames", report.smoothing_window);
    println!("  Retained frames: {}", report.retained_frames);
    println!(
        "  Crop margins: {:.1}px horizontal ({:.1}%), {:.1}px vertical ({:.1}%)",
        report.plan.x_crop,
        report.plan.x_ratio * 100.0,
        report.plan.y_crop,
        report.plan.y_ratio * 100.0
    );
    println!("  Strategy: {:?}", report.plan.strategy);
    println!(
        "  Output: {}x{} @ {:.3} fps",
        report.plan.output_width, report.plan.output_height, report.output_fps
    );
}

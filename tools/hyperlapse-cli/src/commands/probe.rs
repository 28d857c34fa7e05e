//! Show stream information for a video file.

use std::path::PathBuf;

use hyperlapse_render_engine::probe;

pub fn run(input: PathBuf) -> anyhow::Result<()> {
    let meta = probe(&input).map_err(|e| anyhow::anyhow!("Failed to probe video: {e}"))?;

    println!("File: {}", input.display());
    println!("  Resolution: {}x{}", meta.width, meta.height);
    println!("  Frame rate: {:.3} fps", meta.fps);
    println!("  Frames: {}", meta.total_frames);
    println!(
        "  Duration: {:.1}s",
        meta.total_frames as f64 / meta.fps.max(f64::MIN_POSITIVE)
    );

    Ok(())
}

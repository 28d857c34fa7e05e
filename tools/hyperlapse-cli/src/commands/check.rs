//! Check external tool availability.

use hyperlapse_render_engine::check_environment;

pub fn run() -> anyhow::Result<()> {
    println!("Hyperlapse System Check");
    println!("{}", "=".repeat(50));

    let tools = check_environment();
    for (name, available) in &tools {
        if *available {
            println!("[OK] {name} found on PATH");
        } else {
            println!("[MISSING] {name} not found on PATH");
        }
    }

    println!();
    if tools.iter().all(|(_, ok)| *ok) {
        println!("All required tools are available. Hyperlapse is ready.");
        Ok(())
    } else {
        println!("Install ffmpeg (which provides ffprobe) and re-run this check.");
        Err(anyhow::anyhow!("Missing required external tools"))
    }
}

//! Tracing setup for the pipeline crates and the CLI.

use crate::config::LoggingConfig;

/// Workspace crates covered by a bare level name.
const CRATE_TARGETS: [&str; 5] = [
    "hyperlapse_common",
    "hyperlapse_video_model",
    "hyperlapse_processing_core",
    "hyperlapse_render_engine",
    "hyperlapse_cli",
];

/// Expand a bare level name ("info", "debug") into directives that
/// apply it to the hyperlapse crates while keeping everything else at
/// warn. A value that already contains directives is passed through.
fn filter_directives(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = String::from("warn");
    for target in CRATE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level when set.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level)));

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Human-readable logging for the CLI, with `--verbose` mapping to
/// debug-level output from the hyperlapse crates.
pub fn init_cli_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    init_logging(&LoggingConfig {
        level: level.to_string(),
        json: false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_scoped_to_workspace_crates() {
        let directives = filter_directives("debug");
        assert!(directives.starts_with("warn,"));
        assert!(directives.contains("hyperlapse_processing_core=debug"));
        assert!(directives.contains("hyperlapse_render_engine=debug"));
    }

    #[test]
    fn test_explicit_directives_pass_through() {
        assert_eq!(
            filter_directives("hyperlapse_render_engine=trace,warn"),
            "hyperlapse_render_engine=trace,warn"
        );
        assert_eq!(filter_directives("info,tokio=warn"), "info,tokio=warn");
    }
}

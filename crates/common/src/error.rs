//! Error types shared across Hyperlapse crates.

use std::path::PathBuf;

/// Top-level error type for Hyperlapse operations.
#[derive(Debug, thiserror::Error)]
pub enum HyperlapseError {
    #[error("Internal consistency violation: {message}")]
    Consistency { message: String },

    #[error("Frame source error: {message}")]
    Source { message: String },

    #[error("Frame sink error: {message}")]
    Sink { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using HyperlapseError.
pub type HyperlapseResult<T> = Result<T, HyperlapseError>;

impl HyperlapseError {
    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency {
            message: msg.into(),
        }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source {
            message: msg.into(),
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_category_and_message() {
        assert_eq!(
            HyperlapseError::consistency("lengths diverge").to_string(),
            "Internal consistency violation: lengths diverge"
        );
        assert_eq!(
            HyperlapseError::source("pipe closed").to_string(),
            "Frame source error: pipe closed"
        );
        assert_eq!(
            HyperlapseError::sink("encoder exited").to_string(),
            "Frame sink error: encoder exited"
        );
        assert_eq!(
            HyperlapseError::config("speed_up must be positive").to_string(),
            "Configuration error: speed_up must be positive"
        );
        assert_eq!(
            HyperlapseError::unsupported("codec av1").to_string(),
            "Unsupported operation: codec av1"
        );
    }

    #[test]
    fn test_file_not_found_shows_path() {
        let err = HyperlapseError::FileNotFound {
            path: PathBuf::from("/tmp/missing.mp4"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/missing.mp4");
    }

    #[test]
    fn test_anyhow_passes_through_transparently() {
        let err: HyperlapseError = anyhow::anyhow!("task panicked").into();
        assert_eq!(err.to_string(), "task panicked");
    }
}

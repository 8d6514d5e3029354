//! CLI error types.

use std::fmt;
use std::io;
use std::path::PathBuf;

use storyatlas::model::ModelError;
use storyatlas::playback::PlaybackError;

/// Errors that can occur while running a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Failed to read a document file.
    Read { path: PathBuf, source: io::Error },

    /// Document failed validation.
    Document { path: PathBuf, source: ModelError },

    /// A playback operation was rejected.
    Playback(PlaybackError),

    /// Logging setup failed.
    Logging(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            CliError::Document { path, source } => {
                write!(f, "Invalid story map {}: {}", path.display(), source)
            }
            CliError::Playback(e) => write!(f, "Playback failed: {}", e),
            CliError::Logging(msg) => write!(f, "Failed to set up logging: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Read { source, .. } => Some(source),
            CliError::Document { source, .. } => Some(source),
            CliError::Playback(e) => Some(e),
            CliError::Logging(_) => None,
        }
    }
}

impl From<PlaybackError> for CliError {
    fn from(e: PlaybackError) -> Self {
        CliError::Playback(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_path() {
        let err = CliError::Read {
            path: PathBuf::from("/tmp/tour.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/tour.json"));
    }
}

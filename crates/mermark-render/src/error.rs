//! Render error types.

use std::io;
use std::path::{Path, PathBuf};

/// Error returned by renderers and the render gateway.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Renderer executable could not be resolved.
    #[error("renderer executable `{0}` not found in PATH or node_modules/.bin")]
    NotFound(String),
    /// Renderer process could not be started.
    #[error("failed to start renderer {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Renderer ran but reported failure.
    #[error("renderer failed ({status}): {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },
    /// File system operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    /// Create an I/O error with path context.
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

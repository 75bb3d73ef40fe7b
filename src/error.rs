//! Error kinds for the play workflow.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::api::ApiError;

/// Container runtime invocation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStep {
    Pull,
    Build,
    Run,
}

impl fmt::Display for ContainerStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ContainerStep::Pull => "Error updating the game binary",
            ContainerStep::Build => "Error building your bot",
            ContainerStep::Run => "Error running the game",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum PlayError {
    #[error("Could not find visualizer at {}. Run `mm download` before trying this again.", .path.display())]
    VisualizerMissing { path: PathBuf },

    #[error("{} is not a directory. Make sure to run mm play on a directory, not a file.", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Error accessing the directory {}. Are you sure it exists and you have permission to access it?", .path.display())]
    InaccessiblePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{step} (exit code {code})")]
    ExternalProcess { step: ContainerStep, code: i32 },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("remote play failed: {0}")]
    Network(#[from] ApiError),

    #[error("failed to archive {}: {source}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PlayError {
    /// Process exit code for this failure. Container steps propagate the child's own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            PlayError::ExternalProcess { code, .. } => *code,
            _ => 1,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PlayError::VisualizerMissing { .. }
                | PlayError::NotADirectory { .. }
                | PlayError::InaccessiblePath { .. }
        )
    }
}

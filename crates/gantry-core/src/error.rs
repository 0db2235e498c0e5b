//! Error types for gantry

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Descriptor/solution parsing errors
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Build-backend errors
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Artifact discovery/packaging errors
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Test-cloud submission errors
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Descriptor and solution parsing errors
#[derive(Debug, Error)]
pub enum ParseError {
    /// Project descriptor not found
    #[error("Project descriptor not found at {0}")]
    DescriptorNotFound(PathBuf),

    /// Descriptor is missing a required field or is otherwise malformed
    #[error("Malformed descriptor {path}: {message}")]
    MalformedDescriptor { path: PathBuf, message: String },

    /// Solution manifest not found
    #[error("Solution not found at {0}")]
    SolutionNotFound(PathBuf),

    /// No solution lists the given project
    #[error("No solution found listing project {0}")]
    NoOwningSolution(PathBuf),

    /// IO error while reading a descriptor or solution
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build-backend errors; any of these aborts the whole run
#[derive(Debug, Error)]
pub enum BuildError {
    /// Build tool executable could not be resolved
    #[error("Build tool not found: {0}")]
    ToolNotFound(String),

    /// Build tool could not be spawned
    #[error("Failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    /// Build tool exited non-zero
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },
}

/// Artifact discovery errors; missing symbols are a warning, not an error
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No installable package found under the output tree
    #[error("No package found under {0}")]
    PackageNotFound(PathBuf),

    /// No application bundle found to package
    #[error("No application bundle found under {0}")]
    BundleNotFound(PathBuf),

    /// The packaging utility exited non-zero
    #[error("Packaging failed with exit code {code:?}: {command}")]
    PackagingFailed { command: String, code: Option<i32> },

    /// IO error during artifact resolution
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Test-cloud submission errors
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// test-cloud runner executable not found under the workspace
    #[error("Test runner not found (searched {0})")]
    RunnerNotFound(String),

    /// Runner could not be spawned
    #[error("Failed to spawn {command}: {source}")]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    /// Runner exited non-zero
    #[error("Submission failed with exit code {code:?}")]
    ExitFailure { code: Option<i32> },

    /// The service accepted the submission but reported errors in its payload
    #[error("Service reported errors: {}", .0.join("; "))]
    ServiceRejected(Vec<String>),

    /// Invalid submission parameter
    #[error("Invalid submission parameter: {0}")]
    InvalidParameter(String),

    /// IO error during submission
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GantryError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

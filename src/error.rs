use std::io;
use std::path::PathBuf;

/// Crate-level error taxonomy. A kill-command failing is never one of these:
/// a non-zero exit is the designed signal for a killed mutant and is handled
/// as a classification, not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Conflicting or invalid options, rejected before any work starts.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The file to be mutated is missing or unreadable. Fatal for that
    /// file's generation, not for a multi-file run as a whole.
    #[error("cannot read source file {}: {source}", .path.display())]
    SourceAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A batch directory with zero mutant artifacts at evaluation time.
    /// Distinct from a batch whose mutants were all killed.
    #[error("no mutants found in {}", .0.display())]
    EmptyBatch(PathBuf),

    /// A batch directory whose original-file marker is missing or
    /// unreadable; the batch cannot name the file it mutates.
    #[error("batch directory {} is missing its original-file marker", .0.display())]
    BatchMarker(PathBuf),

    #[error("coverage file not found: {}", .0.display())]
    CoverageMissing(PathBuf),

    #[error("skip-list file {} is missing or malformed", .0.display())]
    SkipList(PathBuf),

    #[error("git command failed: {0}")]
    Git(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

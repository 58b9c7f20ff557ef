//! Error types for the harness.
//!
//! Only discovery errors are fatal for a run. Load and spawn errors are caught
//! at the test-case boundary and turned into verdicts by [`crate::harness`].

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias using [`HarnessError`].
pub type Result<T> = std::result::Result<T, HarnessError>;

/// The kind of error that occurred while running the corpus.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("corpus root '{}' does not exist", .path.display())]
    #[diagnostic(
        code(loxtest::discovery::missing_root),
        help("pass the directory holding the test scripts with --root")
    )]
    MissingRoot { path: PathBuf },

    #[error("corpus root '{}' is not a directory", .path.display())]
    #[diagnostic(code(loxtest::discovery::not_a_directory))]
    RootNotDirectory { path: PathBuf },

    #[error("failed to walk corpus directory: {0}")]
    #[diagnostic(code(loxtest::discovery::walk))]
    Walk(#[from] walkdir::Error),

    #[error("failed to read test file '{}': {source}", .path.display())]
    #[diagnostic(code(loxtest::load))]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start '{}': {source}", .binary.display())]
    #[diagnostic(
        code(loxtest::spawn),
        help("check that the interpreter path is correct and executable")
    )]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for '{}': {source}", .binary.display())]
    #[diagnostic(code(loxtest::wait))]
    Wait {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write report: {0}")]
    #[diagnostic(code(loxtest::report))]
    Report(#[from] io::Error),
}

//! Drives the conformance run.
//!
//! Every discovered script goes through the same phases, one script at a time:
//! 1. **Load**: read the script and extract its annotations
//! 2. **Execute**: run the interpreter on it and capture stdout/stderr
//! 3. **Compare**: decide the verdict
//! 4. **Report**: print the verdict as soon as it is known
//!
//! Faults while loading or executing a script only affect that script. The
//! only state carried from one script to the next is the [`Summary`] tally.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use termcolor::WriteColor;
use tracing::{debug, info, warn};

use crate::annotation::{self, ExpectedOutput, MalformedAnnotation};
use crate::discovery::{TestDiscoverer, DEFAULT_EXTENSION};
use crate::error::{HarnessError, Result};
use crate::executor::{ExecutionResult, Executor};
use crate::report::Reporter;
use crate::verdict::{self, Verdict};

/// Corpus root used when none is given.
pub const DEFAULT_TEST_ROOT: &str = "test";

/// Configuration for one run of the harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// The interpreter under test.
    pub binary: PathBuf,
    pub test_root: PathBuf,
    /// Extension of test scripts, without the dot.
    pub extension: String,
    pub timeout: Option<Duration>,
}

impl HarnessConfig {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            test_root: PathBuf::from(DEFAULT_TEST_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            timeout: None,
        }
    }
}

/// A script together with the output it expects.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub path: PathBuf,
    pub source: String,
    pub expected: ExpectedOutput,
    pub malformed: Vec<MalformedAnnotation>,
}

impl TestCase {
    /// Reads a script and extracts its annotations.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| HarnessError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_source(path, source))
    }

    /// Builds a case from script text. Line endings are normalized to `\n`
    /// before annotations are extracted.
    pub fn from_source(path: impl Into<PathBuf>, source: String) -> Self {
        let path = path.into();
        let source = annotation::normalize_newlines(&source);
        let extraction = annotation::extract(&source);
        for malformed in &extraction.malformed {
            warn!(
                file = %path.display(),
                line = malformed.line,
                text = %malformed.text,
                "malformed annotation ignored"
            );
        }
        Self {
            path,
            source,
            expected: extraction.expected,
            malformed: extraction.malformed,
        }
    }
}

/// Everything the reporter needs to know about one finished case.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub path: PathBuf,
    pub verdict: Verdict,
    pub expected: ExpectedOutput,
    /// Empty when the interpreter never ran.
    pub actual: ExecutionResult,
    pub malformed: Vec<MalformedAnnotation>,
}

/// Running pass/fail tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    /// Failing scripts, in run order.
    pub failed: Vec<PathBuf>,
}

impl Summary {
    pub fn record(&mut self, outcome: &TestOutcome) {
        if outcome.verdict.is_ok() {
            self.passed += 1;
        } else {
            self.failed.push(outcome.path.clone());
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs one script through load, execute and compare.
///
/// Never fails: load and spawn errors become verdicts.
pub fn run_test_case(path: &Path, executor: &Executor) -> TestOutcome {
    let case = match TestCase::load(path) {
        Ok(case) => case,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "could not load test file");
            return TestOutcome {
                path: path.to_path_buf(),
                verdict: Verdict::FailedToLoad(err.to_string()),
                expected: ExpectedOutput::default(),
                actual: ExecutionResult::default(),
                malformed: Vec::new(),
            };
        }
    };

    let (verdict, actual) = match executor.run(&case.path) {
        Ok(actual) => (verdict::compare(&case.expected, &actual), actual),
        Err(err) => {
            warn!(file = %path.display(), error = %err, "could not run interpreter");
            (Verdict::FailedToStart(err.to_string()), ExecutionResult::default())
        }
    };
    debug!(file = %path.display(), verdict = %verdict, "test case finished");

    TestOutcome {
        path: case.path,
        verdict,
        expected: case.expected,
        actual,
        malformed: case.malformed,
    }
}

/// Discovers and runs every script under the configured root, reporting each
/// verdict as it is decided, then the summary.
///
/// Only discovery and report-writing errors abort the run.
pub fn run_all<W: WriteColor>(config: &HarnessConfig, reporter: &mut Reporter<W>) -> Result<Summary> {
    let files = TestDiscoverer::discover_test_files(&config.test_root, &config.extension)?;
    info!(count = files.len(), root = %config.test_root.display(), "running corpus");

    let executor = Executor::new(&config.binary).with_timeout(config.timeout);
    let mut summary = Summary::default();
    for path in &files {
        let outcome = run_test_case(path, &executor);
        reporter.case(&outcome)?;
        summary.record(&outcome);
    }

    reporter.summary(&summary)?;
    Ok(summary)
}

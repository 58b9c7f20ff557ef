//! Classification of a test case after it has run.

use std::fmt;

use crate::annotation::{ExpectedOutput, Stream};
use crate::executor::ExecutionResult;

/// The outcome of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Both streams matched exactly.
    Ok,
    /// At least one stream differed; the streams are listed stdout first.
    Mismatch(Vec<Stream>),
    /// The interpreter was killed after exceeding the time limit.
    Timeout,
    /// The script could not be read.
    FailedToLoad(String),
    /// The interpreter could not be started or waited on.
    FailedToStart(String),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Verdict::Ok)
    }

    /// Short token printed after the file name in reports.
    pub fn token(&self) -> &'static str {
        match self {
            Verdict::Ok => "OK",
            Verdict::Mismatch(_) => "MISMATCH",
            Verdict::Timeout => "TIMEOUT",
            Verdict::FailedToLoad(_) => "FAILED-TO-LOAD",
            Verdict::FailedToStart(_) => "FAILED-TO-START",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Compares captured output against the annotations, byte for byte.
///
/// No trimming or line normalization is applied. A timed-out run is never
/// compared since its output is incomplete.
pub fn compare(expected: &ExpectedOutput, actual: &ExecutionResult) -> Verdict {
    if actual.timed_out {
        return Verdict::Timeout;
    }
    let differing: Vec<Stream> = Stream::ALL
        .into_iter()
        .filter(|&stream| expected.get(stream) != actual.get(stream))
        .collect();
    if differing.is_empty() {
        Verdict::Ok
    } else {
        Verdict::Mismatch(differing)
    }
}

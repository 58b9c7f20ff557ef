//! Handles all user-facing output of a run.
//!
//! The reporter writes to any [`WriteColor`], so styling is chosen by the
//! caller: a [`termcolor::StandardStream`] for the terminal, a
//! [`termcolor::NoColor`] or [`termcolor::Buffer::no_color`] when escapes
//! must not appear.

use std::io::{self, Write};

use termcolor::{Color, ColorSpec, WriteColor};

use crate::harness::{Summary, TestOutcome};
use crate::verdict::Verdict;

/// The kinds of emphasis used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// A passing verdict.
    Pass,
    /// Any failing verdict.
    Fail,
    /// Section labels around captured output.
    Heading,
    Warning,
    /// Annotations on the report itself, not part of any output.
    Muted,
}

impl Emphasis {
    pub fn spec(self) -> ColorSpec {
        let mut spec = ColorSpec::new();
        match self {
            Emphasis::Pass => {
                spec.set_fg(Some(Color::Green)).set_bold(true);
            }
            Emphasis::Fail => {
                spec.set_fg(Some(Color::Red)).set_bold(true);
            }
            Emphasis::Heading => {
                spec.set_underline(true);
            }
            Emphasis::Warning => {
                spec.set_fg(Some(Color::Yellow));
            }
            Emphasis::Muted => {
                spec.set_dimmed(true);
            }
        }
        spec
    }
}

/// Prints verdicts and the end-of-run summary.
pub struct Reporter<W> {
    out: W,
}

impl<W: WriteColor> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Prints the verdict line for one case, followed by whatever detail its
    /// verdict calls for.
    pub fn case(&mut self, outcome: &TestOutcome) -> io::Result<()> {
        write!(self.out, "### {}: ", outcome.path.display())?;
        let emphasis = if outcome.verdict.is_ok() {
            Emphasis::Pass
        } else {
            Emphasis::Fail
        };
        self.styled(outcome.verdict.token(), emphasis)?;
        writeln!(self.out)?;

        for malformed in &outcome.malformed {
            write!(self.out, "  ")?;
            self.styled("warning", Emphasis::Warning)?;
            writeln!(
                self.out,
                ": line {}: malformed annotation `{}`",
                malformed.line, malformed.text
            )?;
        }

        match &outcome.verdict {
            Verdict::Ok => {}
            Verdict::Mismatch(streams) => {
                for &stream in streams {
                    self.section(&format!("{}:", stream.label()), outcome.actual.get(stream))?;
                    self.section("expected:", outcome.expected.get(stream))?;
                }
            }
            Verdict::Timeout => {
                writeln!(self.out, "  interpreter killed after exceeding the time limit")?;
            }
            Verdict::FailedToLoad(reason) | Verdict::FailedToStart(reason) => {
                writeln!(self.out, "  {reason}")?;
            }
        }
        self.out.flush()
    }

    /// Prints the totals and, if anything failed, the failing paths.
    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        write!(self.out, "\nTest summary: total {}, ", summary.total())?;
        self.styled("passed", Emphasis::Pass)?;
        write!(self.out, " {}, ", summary.passed)?;
        self.styled("failed", Emphasis::Fail)?;
        writeln!(self.out, " {}", summary.failed.len())?;

        if !summary.failed.is_empty() {
            writeln!(self.out, "\nFailed tests:")?;
            for path in &summary.failed {
                writeln!(self.out, "  - {}", path.display())?;
            }
        }
        self.out.flush()
    }

    fn section(&mut self, label: &str, text: &str) -> io::Result<()> {
        self.styled(label, Emphasis::Heading)?;
        writeln!(self.out)?;
        self.out.write_all(text.as_bytes())?;
        if !text.is_empty() && !text.ends_with('\n') {
            writeln!(self.out)?;
            self.styled("\\ no newline at end of text", Emphasis::Muted)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn styled(&mut self, text: &str, emphasis: Emphasis) -> io::Result<()> {
        self.out.set_color(&emphasis.spec())?;
        write!(self.out, "{text}")?;
        self.out.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{ExpectedOutput, MalformedAnnotation, Stream};
    use crate::executor::ExecutionResult;
    use std::path::PathBuf;
    use termcolor::Buffer;

    fn outcome(verdict: Verdict, expected: (&str, &str), actual: (&str, &str)) -> TestOutcome {
        TestOutcome {
            path: PathBuf::from("test/b.lox"),
            verdict,
            expected: ExpectedOutput {
                stdout: expected.0.to_string(),
                stderr: expected.1.to_string(),
            },
            actual: ExecutionResult {
                stdout: actual.0.to_string(),
                stderr: actual.1.to_string(),
                exit_code: Some(0),
                timed_out: false,
            },
            malformed: Vec::new(),
        }
    }

    fn render(f: impl FnOnce(&mut Reporter<Buffer>) -> io::Result<()>) -> String {
        let mut reporter = Reporter::new(Buffer::no_color());
        f(&mut reporter).unwrap();
        String::from_utf8(reporter.into_inner().into_inner()).unwrap()
    }

    #[test]
    fn ok_case_is_one_line() {
        let case = outcome(Verdict::Ok, ("2\n", ""), ("2\n", ""));
        assert_eq!(render(|r| r.case(&case)), "### test/b.lox: OK\n");
    }

    #[test]
    fn mismatch_prints_stdout_section_before_stderr() {
        let case = outcome(
            Verdict::Mismatch(vec![Stream::Stdout, Stream::Stderr]),
            ("", "Undefined variable.\n"),
            ("Undefined variable.\n", ""),
        );
        assert_eq!(
            render(|r| r.case(&case)),
            "### test/b.lox: MISMATCH\n\
             standard output:\n\
             Undefined variable.\n\
             expected:\n\
             standard error:\n\
             expected:\n\
             Undefined variable.\n"
        );
    }

    #[test]
    fn only_differing_streams_are_shown() {
        let case = outcome(Verdict::Mismatch(vec![Stream::Stderr]), ("1\n", "a\n"), ("1\n", "b\n"));
        let text = render(|r| r.case(&case));
        assert!(!text.contains("standard output:"));
        assert!(text.contains("standard error:\nb\nexpected:\na\n"));
    }

    #[test]
    fn missing_final_newline_is_marked() {
        let case = outcome(Verdict::Mismatch(vec![Stream::Stdout]), ("2\n", ""), ("2", ""));
        assert_eq!(
            render(|r| r.case(&case)),
            "### test/b.lox: MISMATCH\n\
             standard output:\n\
             2\n\
             \\ no newline at end of text\n\
             expected:\n\
             2\n"
        );
    }

    #[test]
    fn failure_reasons_and_warnings_are_listed() {
        let mut case = outcome(
            Verdict::FailedToStart("failed to start 'build/lox': not found".to_string()),
            ("", ""),
            ("", ""),
        );
        case.malformed.push(MalformedAnnotation {
            line: 3,
            text: "//out: 1".to_string(),
        });
        assert_eq!(
            render(|r| r.case(&case)),
            "### test/b.lox: FAILED-TO-START\n\
             \x20 warning: line 3: malformed annotation `//out: 1`\n\
             \x20 failed to start 'build/lox': not found\n"
        );
    }

    #[test]
    fn summary_lists_failures() {
        let summary = Summary {
            passed: 2,
            failed: vec![PathBuf::from("test/x.lox")],
        };
        assert_eq!(
            render(|r| r.summary(&summary)),
            "\nTest summary: total 3, passed 2, failed 1\n\nFailed tests:\n  - test/x.lox\n"
        );
    }

    #[test]
    fn ansi_output_styles_the_verdict() {
        let case = outcome(Verdict::Ok, ("", ""), ("", ""));
        let mut reporter = Reporter::new(Buffer::ansi());
        reporter.case(&case).unwrap();
        let text = String::from_utf8(reporter.into_inner().into_inner()).unwrap();
        assert!(text.starts_with("### test/b.lox: \x1b["));
        assert!(text.contains("OK\x1b[0m"));
    }
}

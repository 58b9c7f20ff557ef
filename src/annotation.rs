//! Expected-output annotations embedded in test scripts.
//!
//! A script declares what the interpreter should print with line comments:
//!
//! ```text
//! print 1 + 1; // out: 2
//! print nope;  // err: Undefined variable 'nope'.
//! ```
//!
//! Each `// out: <payload>` line appends `<payload>\n` to the expected
//! standard output, each `// err: <payload>` line to the expected standard
//! error. Payloads keep file order within their own stream. The marker may
//! follow code on the same line; the payload runs to the end of that line.

use std::fmt;

/// One of the two output streams of the interpreter under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    /// Both streams, in report order.
    pub const ALL: [Stream; 2] = [Stream::Stdout, Stream::Stderr];

    /// The exact comment text that starts an annotation for this stream.
    pub fn marker(self) -> &'static str {
        match self {
            Stream::Stdout => "// out: ",
            Stream::Stderr => "// err: ",
        }
    }

    /// Human-readable name used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Stream::Stdout => "standard output",
            Stream::Stderr => "standard error",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A well-formed annotation: one expected line on one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub stream: Stream,
    /// The expected text, without the line terminator.
    pub payload: String,
    /// 1-based line number in the script.
    pub line: usize,
}

/// A comment that looks like an annotation but does not match the grammar,
/// e.g. `//out: 1`, `// OUT: 1` or `// out:` with nothing after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedAnnotation {
    pub line: usize,
    /// The offending line, without the line terminator.
    pub text: String,
}

/// A token produced by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Annotation(Annotation),
    Malformed(MalformedAnnotation),
}

/// Scans a script line by line and returns its annotations in file order.
///
/// A line may yield one annotation per stream. Lines with neither marker are
/// checked for near misses and reported as [`Token::Malformed`].
pub fn scan(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (index, raw) in source.split_inclusive('\n').enumerate() {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let number = index + 1;
        let mut matched = false;
        for stream in Stream::ALL {
            let marker = stream.marker();
            if let Some(start) = line.find(marker) {
                matched = true;
                tokens.push(Token::Annotation(Annotation {
                    stream,
                    payload: line[start + marker.len()..].to_string(),
                    line: number,
                }));
            }
        }
        if !matched && looks_like_annotation(line) {
            tokens.push(Token::Malformed(MalformedAnnotation {
                line: number,
                text: line.to_string(),
            }));
        }
    }
    tokens
}

fn looks_like_annotation(line: &str) -> bool {
    line.match_indices("//").any(|(start, slashes)| {
        let rest = line[start + slashes.len()..].trim_start();
        let keyword = rest.get(..4).map(str::to_ascii_lowercase);
        matches!(keyword.as_deref(), Some("out:") | Some("err:"))
    })
}

/// The output a script expects from the interpreter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ExpectedOutput {
    /// Expected text for one stream.
    pub fn get(&self, stream: Stream) -> &str {
        match stream {
            Stream::Stdout => &self.stdout,
            Stream::Stderr => &self.stderr,
        }
    }

    fn push(&mut self, annotation: &Annotation) {
        let buffer = match annotation.stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        buffer.push_str(&annotation.payload);
        buffer.push('\n');
    }
}

/// Expected output plus any malformed annotations found while building it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub expected: ExpectedOutput,
    pub malformed: Vec<MalformedAnnotation>,
}

/// Translates `\r\n` and lone `\r` line endings to `\n`.
///
/// Applied to scripts and to captured output alike, so a corpus checked out
/// with CRLF endings still matches an interpreter that prints `\n`.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Builds the expected stdout and stderr of a script from its annotations.
pub fn extract(source: &str) -> Extraction {
    let source = normalize_newlines(source);
    let mut extraction = Extraction::default();
    for token in scan(&source) {
        match token {
            Token::Annotation(annotation) => extraction.expected.push(&annotation),
            Token::Malformed(malformed) => extraction.malformed.push(malformed),
        }
    }
    extraction
}

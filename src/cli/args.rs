//! Defines the command-line arguments for the harness.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use termcolor::ColorChoice;

use crate::discovery::DEFAULT_EXTENSION;
use crate::harness::{HarnessConfig, DEFAULT_TEST_ROOT};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "loxtest",
    version,
    about = "Run annotated .lox scripts against an interpreter and check its output."
)]
pub struct HarnessArgs {
    /// The interpreter executable to test.
    pub binary: PathBuf,

    /// Directory searched recursively for test scripts.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TEST_ROOT)]
    pub root: PathBuf,

    /// Extension of test scripts, without the dot.
    #[arg(long, value_name = "EXT", default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Kill the interpreter if a single script runs longer than this.
    #[arg(long, value_name = "SECONDS", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// When to style the report.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

impl HarnessArgs {
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            binary: self.binary.clone(),
            test_root: self.root.clone(),
            extension: self.extension.clone(),
            timeout: self.timeout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Style only when stdout is a terminal.
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got {value}"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

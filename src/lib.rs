pub use crate::error::{HarnessError, Result};

pub mod annotation;
pub mod cli;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod harness;
pub mod report;
pub mod verdict;

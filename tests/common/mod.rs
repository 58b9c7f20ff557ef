//! Shared helpers for the integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Path to the shell stand-in for a Lox interpreter.
pub fn fake_interpreter() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fake-lox")
}

/// Creates a scratch corpus containing the given `(relative path, contents)` files.
pub fn corpus(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, contents) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

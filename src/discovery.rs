use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{HarnessError, Result};

/// Extension of the scripts in a standard Lox corpus.
pub const DEFAULT_EXTENSION: &str = "lox";

/// Discovers test scripts under a corpus root.
#[derive(Debug)]
pub struct TestDiscoverer;

impl TestDiscoverer {
    /// Returns true if the given path has the given extension.
    fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension().is_some_and(|ext| ext == extension)
    }

    /// Recursively scans a directory for files ending in `.<extension>`.
    ///
    /// The returned list of files is sorted to ensure deterministic execution order.
    /// Symlinked files and directories are followed. A missing root is an
    /// error; an empty one is not.
    pub fn discover_test_files<P: AsRef<Path>>(root: P, extension: &str) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(HarnessError::MissingRoot {
                path: root.to_path_buf(),
            });
        }
        if !root.is_dir() {
            return Err(HarnessError::RootNotDirectory {
                path: root.to_path_buf(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_dangling_link(&err) => {
                    warn!(path = ?err.path(), "skipping broken symlink");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !Self::has_extension(path, extension) {
                continue;
            }
            files.push(path.to_path_buf());
        }
        files.sort();
        debug!(root = %root.display(), count = files.len(), "discovered test files");
        Ok(files)
    }
}

/// Symlink loops stay fatal; a link whose target is gone is only skipped.
fn is_dangling_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_none()
        && err.path().is_some_and(|path| {
            path.symlink_metadata()
                .is_ok_and(|meta| meta.file_type().is_symlink())
                && !path.exists()
        })
}

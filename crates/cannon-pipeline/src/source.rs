//! Per-pass file enumeration.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{PipelineError, PipelineResult};

/// Supplies the files for one pass. Called once at the start of every pass.
pub trait FileSource: Send + Sync {
    /// Files to process in this pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the files cannot be enumerated.
    fn files(&self) -> PipelineResult<Vec<PathBuf>>;
}

/// Regular files directly inside a directory, sorted by name.
///
/// Subdirectories are not descended into. Hidden files are included. An
/// entry that cannot be inspected, such as a dangling symlink, is still
/// listed so its unit fails at hashing; only a directory that cannot be read
/// fails the listing.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    directory: PathBuf,
}

impl DirectorySource {
    /// Source listing `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory being listed.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl FileSource for DirectorySource {
    fn files(&self) -> PipelineResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) if source.depth() == 0 => {
                    return Err(PipelineError::Enumerate {
                        path: self.directory.clone(),
                        source,
                    });
                }
                Err(err) => {
                    warn!(error = %err, "sample entry could not be inspected");
                    if let Some(path) = err.path() {
                        files.push(path.to_path_buf());
                    }
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Fixed list of files returned unchanged on every pass.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    files: Vec<PathBuf>,
}

impl StaticSource {
    /// Source yielding `files`.
    #[must_use]
    pub const fn new(files: Vec<PathBuf>) -> Self {
        Self { files }
    }
}

impl FileSource for StaticSource {
    fn files(&self) -> PipelineResult<Vec<PathBuf>> {
        Ok(self.files.clone())
    }
}

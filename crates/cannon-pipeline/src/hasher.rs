//! SHA-256 digests of sample files.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{HashError, HashResult};

const READ_CHUNK: usize = 64 * 1024;

/// A hashed sample, owned by the worker processing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    /// Location of the sample.
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the contents.
    pub digest: String,
    /// Size of the contents that were hashed.
    pub size_bytes: u64,
}

/// Lowercase hex SHA-256 of the file at `path`.
///
/// # Errors
///
/// Returns an error if the path is not a readable regular file.
pub fn digest(path: &Path) -> HashResult<String> {
    hash_file(path).map(|unit| unit.digest)
}

/// Hash the file at `path` into a [`FileUnit`].
///
/// # Errors
///
/// Returns an error if the path is not a readable regular file.
pub fn hash_file(path: &Path) -> HashResult<FileUnit> {
    let io_error = |operation: &'static str| {
        move |source: io::Error| HashError::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    };

    let mut file = File::open(path).map_err(io_error("open"))?;
    let metadata = file.metadata().map_err(io_error("stat"))?;
    if !metadata.is_file() {
        return Err(io_error("hash")(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; READ_CHUNK];
    let mut size_bytes = 0_u64;
    loop {
        let read = file.read(&mut buffer).map_err(io_error("read"))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        size_bytes += read as u64;
    }

    Ok(FileUnit {
        path: path.to_path_buf(),
        digest: format!("{:x}", hasher.finalize()),
        size_bytes,
    })
}

/// Hash on the blocking pool so slow disks do not stall the runtime.
pub(crate) async fn hash_file_blocking(path: PathBuf) -> HashResult<FileUnit> {
    let fallback = path.clone();
    tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .unwrap_or_else(|join_error| {
            Err(HashError::Io {
                operation: "hash",
                path: fallback,
                source: io::Error::other(join_error.to_string()),
            })
        })
}

//! Sample directories and run configuration for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use cannon_config::BatchConfig;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use url::Url;

/// Temporary directory populated with sample files; removed on drop.
pub struct SampleDir {
    dir: TempDir,
}

impl SampleDir {
    /// Create an empty sample directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("cannon-samples-")
            .tempdir()
            .context("failed to create sample directory")?;
        Ok(Self { dir })
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` inside the directory and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents)
            .with_context(|| format!("failed to write sample {}", path.display()))?;
        Ok(path)
    }
}

/// Lowercase hex SHA-256 of `contents`, for asserting digests in tests.
#[must_use]
pub fn sha256_hex(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}

/// Run configuration pointing at `server_url` with short timeouts.
///
/// # Errors
///
/// Returns an error if `server_url` is not a valid URL.
pub fn batch_config(directory: &Path, server_url: &str, concurrency: usize) -> Result<BatchConfig> {
    Ok(BatchConfig {
        directory: directory.to_path_buf(),
        server_url: Url::parse(server_url).context("invalid test server URL")?,
        serial: "C0EAE4000000".to_string(),
        api_key: "test-key".to_string(),
        ignore_verdict: false,
        pass_count: 1,
        concurrency,
        request_timeout: Duration::from_secs(5),
        accept_invalid_certs: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_dir_writes_files() -> Result<()> {
        let samples = SampleDir::new()?;
        let path = samples.write("a.bin", b"alpha")?;
        assert_eq!(fs::read(&path)?, b"alpha");
        assert!(path.starts_with(samples.path()));
        Ok(())
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn batch_config_uses_given_server() -> Result<()> {
        let config = batch_config(Path::new("samples"), "http://127.0.0.1:9000", 3)?;
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.server_url.port(), Some(9000));
        Ok(())
    }
}

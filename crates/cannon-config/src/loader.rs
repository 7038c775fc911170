//! Loading and generating `cannon.toml` documents.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConfigDocument;

/// Read a configuration document from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid document.
pub fn load_document(path: &Path) -> ConfigResult<ConfigDocument> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source,
    })?;
    let document = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration file");
    Ok(document)
}

/// Write the default template document to `path`.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] rather than overwriting an existing
/// file, or an IO error if the file cannot be written.
pub fn write_template(path: &Path) -> ConfigResult<()> {
    let rendered = toml::to_string_pretty(&ConfigDocument::template())
        .map_err(|source| ConfigError::Render { source })?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == ErrorKind::AlreadyExists {
                ConfigError::AlreadyExists {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Io {
                    operation: "create",
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
    file.write_all(rendered.as_bytes())
        .map_err(|source| ConfigError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), "wrote configuration template");
    Ok(())
}

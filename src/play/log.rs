use std::{fs, path::Path};

use tracing::debug;

use crate::error::PlayError;

/// Write `contents` verbatim to `path`, creating its directory and replacing any previous log.
pub fn write_log(path: &Path, contents: &[u8]) -> Result<(), PlayError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| PlayError::Filesystem {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, contents).map_err(|source| PlayError::Filesystem {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "log written");
    Ok(())
}

//! File-based storage implementation.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// One `<id>.json` snapshot per project in a base directory.
///
/// Writes go to a sibling `.tmp` file that is renamed over the snapshot, so a
/// failed write leaves the previous save readable.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create the storage, creating `base_path` if needed.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| io_error("create", &base_path, e))?;
        Ok(Self { base_path })
    }

    /// Create file storage in the default location.
    ///
    /// On Unix: `~/.local/share/inkgraph/projects/`
    /// On Windows: `%LOCALAPPDATA%\inkgraph\projects\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkgraph").join("projects"))
    }

    /// Snapshot path for `id`. Characters outside `[A-Za-z0-9_-]` become `_`.
    fn snapshot_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("Failed to {} {}: {}", action, path.display(), e))
}

impl Storage for FileStorage {
    fn write(&self, id: &str, json: String) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.snapshot_path(id);
        Box::pin(async move {
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json).map_err(|e| io_error("write", &tmp, e))?;
            fs::rename(&tmp, &path).map_err(|e| io_error("replace", &path, e))?;
            log::debug!("Wrote {}", path.display());
            Ok(())
        })
    }

    fn read(&self, id: &str) -> BoxFuture<'_, StorageResult<String>> {
        let path = self.snapshot_path(id);
        let id = id.to_string();
        Box::pin(async move {
            match fs::read_to_string(&path) {
                Ok(json) => Ok(json),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(StorageError::NotFound(id))
                }
                Err(e) => Err(io_error("read", &path, e)),
            }
        })
    }
}

//! Directory-backed store: one `<key>.json` file per key.
//!
//! Writes go to a temp file in the same directory and are renamed over the
//! target, so a crash mid-write leaves the previous blob intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{KvStore, StoreError};

#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for FileKvStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)?;
        debug!(key, path = %path.display(), bytes = value.len(), "saved blob");
        Ok(())
    }
}

//! Store persisted as a single JSON document on disk.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use geocache_core::{KeyValueStore, StoreError, StoreWrite};
use tracing::{debug, info};

use crate::{atomic_io::write_bytes_atomic, memory::apply_batch};

/// Store backed by a JSON object file mapping keys to string values.
///
/// Each batch rewrites the whole file through a temporary sibling, so a
/// failed write leaves the previous document in place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file opens as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no saved session, starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, batch: Vec<StoreWrite>) -> Result<(), StoreError> {
        let mut next = self.values.clone();
        apply_batch(&mut next, batch);

        let bytes = serde_json::to_vec_pretty(&next).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_bytes_atomic(&self.path, &bytes).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), keys = next.len(), "wrote store");
        self.values = next;
        Ok(())
    }
}

//! Filesystem snapshot store confined to a capability directory.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;

use crate::task::ports::{SnapshotStore, SnapshotStoreError, SnapshotStoreResult};

/// Stores each snapshot as `<key>.json` inside a single directory.
///
/// Writes go to a temporary file that is renamed over the record, so a
/// reader never observes a half-written snapshot.
#[derive(Debug, Clone)]
pub struct FilesystemSnapshotStore {
    dir: Arc<Dir>,
}

impl FilesystemSnapshotStore {
    /// Opens an existing directory as the store root.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotStoreError::Persistence`] when the directory cannot
    /// be opened.
    pub fn open(root: &Utf8Path) -> SnapshotStoreResult<Self> {
        let dir =
            Dir::open_ambient_dir(root, ambient_authority()).map_err(SnapshotStoreError::persistence)?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Wraps an already opened capability directory.
    #[must_use]
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir: Arc::new(dir) }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SnapshotStoreResult<T>
    where
        F: FnOnce(&Dir) -> SnapshotStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || f(&dir))
            .await
            .map_err(SnapshotStoreError::persistence)?
    }
}

fn record_name(key: &str) -> SnapshotStoreResult<String> {
    let is_valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
        && !key.starts_with('.');
    if !is_valid {
        return Err(SnapshotStoreError::InvalidKey(key.to_owned()));
    }
    Ok(format!("{key}.json"))
}

#[async_trait]
impl SnapshotStore for FilesystemSnapshotStore {
    async fn read(&self, key: &str) -> SnapshotStoreResult<Option<Vec<u8>>> {
        let name = record_name(key)?;
        self.run_blocking(move |dir| match dir.read(&name) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SnapshotStoreError::persistence(err)),
        })
        .await
    }

    async fn write(&self, key: &str, payload: Vec<u8>) -> SnapshotStoreResult<()> {
        let name = record_name(key)?;
        let staging = format!("{name}.tmp");
        self.run_blocking(move |dir| {
            dir.write(&staging, &payload)
                .map_err(SnapshotStoreError::persistence)?;
            dir.rename(&staging, dir, &name)
                .map_err(SnapshotStoreError::persistence)
        })
        .await
    }
}

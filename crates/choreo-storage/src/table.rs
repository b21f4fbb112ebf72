//! A flat JSON file used as a table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::StorageResult;
use crate::fs_utils::{read_json_or_default, write_json_atomic};

/// A whole-file JSON table.
///
/// Every mutation is a read-modify-write of the full file, serialized through
/// a mutex so concurrent requests in this process never interleave. Writes go
/// through a temp file and rename. Across processes the last write wins.
#[derive(Debug)]
pub struct JsonTable<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for JsonTable<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T> JsonTable<T>
where
    T: Serialize + DeserializeOwned + Default + Send,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; a missing or corrupt file reads as empty.
    pub async fn load(&self) -> StorageResult<T> {
        read_json_or_default(&self.path).await
    }

    /// Load, apply `f`, and write the result back under the table lock.
    pub async fn update<F, R>(&self, f: F) -> StorageResult<R>
    where
        F: FnOnce(&mut T) -> R + Send,
        R: Send,
    {
        let _guard = self.lock.lock().await;
        let mut value = read_json_or_default(&self.path).await?;
        let result = f(&mut value);
        write_json_atomic(&self.path, &value).await?;
        Ok(result)
    }
}

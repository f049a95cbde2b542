use crate::infrastructure::{KeyValueStore, StoreResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Key-value store kept as a single JSON object on disk.
///
/// Every write rewrites the whole document to a sibling temp file and renames
/// it over the original, so a batch is either fully on disk or not at all.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileKeyValueStore {
    /// Opens (without yet creating) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        info!(path = %path.display(), "opened json file store");
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_document(&self) -> StoreResult<Map<String, Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKeyValueStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        let mut document = self.read_document().await?;
        Ok(document.remove(key))
    }

    #[instrument(skip_all, fields(count = entries.len()))]
    async fn put_many(&self, entries: Vec<(String, Value)>) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        for (key, value) in entries {
            document.insert(key, value);
        }

        let json = serde_json::to_string_pretty(&document)?;
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), "saved store to disk");
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let document = self.read_document().await?;
        Ok(document.keys().cloned().collect())
    }
}

use crate::errors::AppError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

/// Small persistent key/value store backed by one JSON object file. Every
/// write is flushed straight to disk.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStore {
    pub async fn open(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            entries: load_entries(path).await,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Memory is only updated once the file write succeeded.
    pub async fn set(&mut self, key: &str, value: Value) -> Result<(), AppError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value);
        self.commit(next).await
    }

    pub async fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let mut next = self.entries.clone();
        if next.remove(key).is_none() {
            return Ok(());
        }
        self.commit(next).await
    }

    async fn commit(&mut self, next: Map<String, Value>) -> Result<(), AppError> {
        persist_entries(&self.path, &next).await?;
        self.entries = next;
        Ok(())
    }
}

async fn persist_entries(path: &Path, entries: &Map<String, Value>) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let payload = serde_json::to_vec_pretty(entries).map_err(AppError::internal)?;
    fs::write(path, payload).await?;
    Ok(())
}

async fn load_entries(path: &Path) -> Map<String, Value> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(err) => {
                error!("failed to parse local storage file: {err}");
                Map::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
        Err(err) => {
            error!("failed to read local storage file: {err}");
            Map::new()
        }
    }
}

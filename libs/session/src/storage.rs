//! Durable token storage
//!
//! A single slot holding the bearer token between runs. Writes replace the
//! previous value; the last writer wins.

use async_trait::async_trait;
use std::{
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn load(&self) -> io::Result<Option<String>>;
    async fn store(&self, token: &str) -> io::Result<()>;
    async fn clear(&self) -> io::Result<()>;
}

/// Token kept in a file on disk
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write `token` to a fresh staging file next to `path`, then move it into place
fn write_atomically(path: &Path, token: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut staging = NamedTempFile::new_in(dir)?;
    staging.write_all(token.as_bytes())?;
    staging.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn store(&self, token: &str) -> io::Result<()> {
        // Each write stages its own file; the rename is atomic, so the last writer wins
        let path = self.path.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || write_atomically(&path, &token))
            .await
            .map_err(io::Error::other)??;
        debug!("Stored token at {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Process-local storage, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn load(&self) -> io::Result<Option<String>> {
        Ok(self.slot.lock().await.clone())
    }

    async fn store(&self, token: &str) -> io::Result<()> {
        *self.slot.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> io::Result<()> {
        *self.slot.lock().await = None;
        Ok(())
    }
}

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};

use crate::{domain::Credential, ports::TokenStore, Result};

/// Distinguishes temp files of saves running at the same time.
static SAVE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Credential persisted as a pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileTokenStore {
    path: PathBuf,
}

impl JsonFileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling temp file, unique per call so concurrent saves never share one.
    fn temp_path(&self) -> PathBuf {
        let seq = SAVE_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "tokens.json".into());
        name.push(format!(".{}.{seq}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Temp files left next to the target (used by tests).
    #[cfg(test)]
    fn leftover_temp_files(&self) -> usize {
        let Some(prefix) = self.path.file_name().and_then(|n| n.to_str()) else {
            return 0;
        };
        let prefix = format!("{prefix}.{}.", std::process::id());
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| {
                        let name = e.file_name();
                        let name = name.to_string_lossy();
                        name.starts_with(&prefix) && name.ends_with(".tmp")
                    })
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl TokenStore for JsonFileTokenStore {
    async fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)?;

        // Write atomically
        let temp_path = self.temp_path();
        let write = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        };
        if let Err(e) = write.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::info!(path = %self.path.display(), domain = %credential.domain, "credential saved");
        Ok(())
    }

    async fn load(&self) -> Option<Credential> {
        let txt = fs::read_to_string(&self.path).await.ok()?;
        if txt.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(&txt) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring malformed credential file: {e}");
                None
            }
        }
    }
}

/// In-process credential store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<Credential>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            inner: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, credential: &Credential) -> Result<()> {
        *self.inner.write().await = Some(credential.clone());
        Ok(())
    }

    async fn load(&self) -> Option<Credential> {
        self.inner.read().await.clone()
    }
}

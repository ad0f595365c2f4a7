use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::leads::domain::LeadRecord;

/// Last listing successfully read from the hosted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub saved_at: DateTime<Utc>,
    pub leads: Vec<LeadRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("lead cache io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("lead cache could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// JSON file cache used by the dashboard when the hosted table is down.
///
/// Clones share one write lock, so concurrent listings never race on the
/// staging file.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot back. A missing file yields `None`; unreadable or
    /// malformed content is logged and also yields `None`.
    pub async fn load(&self) -> Option<CachedSnapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "lead cache unreadable");
                return None;
            }
        };

        match serde_json::from_slice::<CachedSnapshot>(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "discarding malformed lead cache");
                None
            }
        }
    }

    pub async fn store(&self, leads: &[LeadRecord], saved_at: DateTime<Utc>) -> Result<(), CacheError> {
        let snapshot = CachedSnapshot {
            saved_at,
            leads: leads.to_vec(),
        };
        let encoded = serde_json::to_vec_pretty(&snapshot)?;
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        // Write-then-rename so a crash never leaves a truncated snapshot.
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, encoded)
            .await
            .map_err(|source| self.io_error(source))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|source| self.io_error(source))
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

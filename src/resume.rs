//! Checkpoint state for interrupted chunked transfers
//!
//! One JSON state file per (local path, remote key) pair, kept under the
//! platform cache directory and removed once the transfer completes.

use crate::error::{Error, Result};
use crate::storage::CompletedPart;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// State of an interrupted multipart upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadState {
    /// S3 upload ID
    pub upload_id: String,
    /// Remote object key
    pub remote_key: String,
    /// Local file path
    pub local_path: PathBuf,
    /// Local file size at start
    pub local_size: u64,
    /// Local file modification time (Unix timestamp)
    pub local_mtime: u64,
    /// Part size used
    pub part_size: u64,
    /// Completed parts
    pub completed_parts: Vec<PartInfo>,
    /// Timestamp when the upload started
    pub started_at: u64,
}

/// State of an interrupted ranged download
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadState {
    /// Remote object key
    pub remote_key: String,
    /// Final local destination path
    pub local_path: PathBuf,
    /// Remote object size at start
    pub remote_size: u64,
    /// Remote object ETag at start
    pub remote_etag: Option<String>,
    /// Bytes already written to the partial file
    pub bytes_written: u64,
    /// Timestamp when the download started
    pub started_at: u64,
}

impl DownloadState {
    /// Whether this checkpoint still applies to the remote object
    pub fn matches_remote(&self, size: u64, etag: Option<&str>) -> bool {
        self.remote_size == size
            && self.remote_etag.as_deref() == etag
            && self.bytes_written <= size
    }
}

/// Information about a completed part
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartInfo {
    pub part_number: i32,
    pub etag: String,
    pub size: u64,
}

impl From<&PartInfo> for CompletedPart {
    fn from(info: &PartInfo) -> Self {
        Self {
            part_number: info.part_number,
            etag: info.etag.clone(),
        }
    }
}

/// Checkpoint state manager
pub struct ResumeManager {
    /// Directory holding checkpoint files
    cache_dir: PathBuf,
}

impl ResumeManager {
    /// Create a manager rooted at the default cache directory
    pub fn new() -> Result<Self> {
        Self::with_cache_dir(Self::default_cache_dir()?)
    }

    /// Create a manager rooted at a specific directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| Error::io("creating cache directory", e))?;
        Ok(Self { cache_dir })
    }

    /// Get the default cache directory
    pub fn default_cache_dir() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join("bucketeer").join("transfers"))
            .ok_or_else(|| Error::config("could not determine cache directory"))
    }

    /// Generate a unique key for a state file
    fn state_key(local_path: &Path, remote_key: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        local_path.hash(&mut hasher);
        remote_key.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    fn state_path(&self, kind: &str, local_path: &Path, remote_key: &str) -> PathBuf {
        let key = Self::state_key(local_path, remote_key);
        self.cache_dir.join(format!("{}-{}.json", kind, key))
    }

    /// Save upload checkpoint state
    pub fn save_upload(&self, state: &UploadState) -> Result<()> {
        let path = self.state_path("up", &state.local_path, &state.remote_key);
        self.write_state(&path, state)
    }

    /// Load upload checkpoint state if it exists and still matches the file
    pub fn load_upload(&self, local_path: &Path, remote_key: &str) -> Result<Option<UploadState>> {
        let path = self.state_path("up", local_path, remote_key);
        let Some(state) = self.read_state::<UploadState>(&path)? else {
            return Ok(None);
        };

        // Stale if the local file changed since the upload started
        let meta = match std::fs::metadata(local_path) {
            Ok(m) => m,
            Err(_) => {
                self.remove(&path);
                return Ok(None);
            }
        };
        let mtime = unix_mtime(&meta);
        if meta.len() != state.local_size || mtime != state.local_mtime {
            tracing::debug!(path = ?local_path, "Local file changed, discarding upload checkpoint");
            self.remove(&path);
            return Ok(None);
        }

        Ok(Some(state))
    }

    /// Remove upload checkpoint state
    pub fn remove_upload(&self, local_path: &Path, remote_key: &str) {
        self.remove(&self.state_path("up", local_path, remote_key));
    }

    /// Save download checkpoint state
    pub fn save_download(&self, state: &DownloadState) -> Result<()> {
        let path = self.state_path("down", &state.local_path, &state.remote_key);
        self.write_state(&path, state)
    }

    /// Load download checkpoint state if it exists
    pub fn load_download(
        &self,
        local_path: &Path,
        remote_key: &str,
    ) -> Result<Option<DownloadState>> {
        let path = self.state_path("down", local_path, remote_key);
        self.read_state(&path)
    }

    /// Remove download checkpoint state
    pub fn remove_download(&self, local_path: &Path, remote_key: &str) {
        self.remove(&self.state_path("down", local_path, remote_key));
    }

    fn write_state<T: Serialize>(&self, path: &Path, state: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| Error::config(format!("serializing checkpoint state: {}", e)))?;
        std::fs::write(path, json).map_err(|e| Error::io("writing checkpoint state", e))?;
        tracing::debug!(path = ?path, "Saved checkpoint state");
        Ok(())
    }

    fn read_state<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let json =
            std::fs::read_to_string(path).map_err(|e| Error::io("reading checkpoint state", e))?;
        match serde_json::from_str(&json) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // Corrupt state is discarded rather than blocking the transfer
                tracing::warn!(path = ?path, error = %e, "Discarding unreadable checkpoint state");
                self.remove(path);
                Ok(None)
            }
        }
    }

    fn remove(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = ?path, error = %e, "Failed to remove checkpoint state");
            }
        }
    }
}

/// Modification time as a Unix timestamp, zero when unavailable
pub fn unix_mtime(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Current time as a Unix timestamp
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(tmp: &TempDir) -> ResumeManager {
        ResumeManager::with_cache_dir(tmp.path().join("state")).unwrap()
    }

    #[test]
    fn test_upload_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);

        let local = tmp.path().join("big.bin");
        std::fs::write(&local, b"0123456789").unwrap();
        let meta = std::fs::metadata(&local).unwrap();

        let state = UploadState {
            upload_id: "upload-1".to_string(),
            remote_key: "big.bin".to_string(),
            local_path: local.clone(),
            local_size: meta.len(),
            local_mtime: unix_mtime(&meta),
            part_size: 8 * 1024 * 1024,
            completed_parts: vec![PartInfo {
                part_number: 1,
                etag: "etag-1".to_string(),
                size: 8 * 1024 * 1024,
            }],
            started_at: unix_now(),
        };
        mgr.save_upload(&state).unwrap();

        let loaded = mgr.load_upload(&local, "big.bin").unwrap().unwrap();
        assert_eq!(loaded.upload_id, "upload-1");
        assert_eq!(loaded.completed_parts.len(), 1);

        mgr.remove_upload(&local, "big.bin");
        assert!(mgr.load_upload(&local, "big.bin").unwrap().is_none());
    }

    #[test]
    fn test_upload_state_invalidated_by_size_change() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);

        let local = tmp.path().join("big.bin");
        std::fs::write(&local, b"0123456789").unwrap();
        let meta = std::fs::metadata(&local).unwrap();

        let state = UploadState {
            upload_id: "upload-1".to_string(),
            remote_key: "big.bin".to_string(),
            local_path: local.clone(),
            local_size: meta.len(),
            local_mtime: unix_mtime(&meta),
            part_size: 8 * 1024 * 1024,
            completed_parts: Vec::new(),
            started_at: unix_now(),
        };
        mgr.save_upload(&state).unwrap();

        std::fs::write(&local, b"different length content").unwrap();
        assert!(mgr.load_upload(&local, "big.bin").unwrap().is_none());
    }

    #[test]
    fn test_download_state_matches_remote() {
        let state = DownloadState {
            remote_key: "big.bin".to_string(),
            local_path: PathBuf::from("/tmp/big.bin"),
            remote_size: 100,
            remote_etag: Some("abc".to_string()),
            bytes_written: 50,
            started_at: unix_now(),
        };
        assert!(state.matches_remote(100, Some("abc")));
        assert!(!state.matches_remote(101, Some("abc")));
        assert!(!state.matches_remote(100, Some("def")));
        assert!(!state.matches_remote(100, None));
    }

    #[test]
    fn test_download_state_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);

        let dest = tmp.path().join("out.bin");
        let state = DownloadState {
            remote_key: "out.bin".to_string(),
            local_path: dest.clone(),
            remote_size: 1024,
            remote_etag: None,
            bytes_written: 512,
            started_at: unix_now(),
        };
        mgr.save_download(&state).unwrap();

        let loaded = mgr.load_download(&dest, "out.bin").unwrap().unwrap();
        assert_eq!(loaded.bytes_written, 512);

        mgr.remove_download(&dest, "out.bin");
        assert!(mgr.load_download(&dest, "out.bin").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_state_is_discarded() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(&tmp);

        let dest = tmp.path().join("out.bin");
        let path = mgr.state_path("down", &dest, "out.bin");
        std::fs::write(&path, b"not json").unwrap();

        assert!(mgr.load_download(&dest, "out.bin").unwrap().is_none());
        assert!(!path.exists());
    }
}

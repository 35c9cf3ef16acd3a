//! Rotating on-disk store for scraped pages, prompts, and raw model output.
//!
//! Scraped page sets live directly under `data_dir`, model transcripts under
//! `data_dir/debug`. The debug area has its own caps. The data area's caps
//! cover the whole tree, debug files included. The oldest `.json` files are
//! evicted first after every write.

use crate::config::DebugStoreConfig;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const DEBUG_SUBDIR: &str = "debug";

/// Which area of the store a document belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Data,
    Debug,
}

#[derive(Debug, Clone)]
pub struct DebugStore {
    config: DebugStoreConfig,
}

impl DebugStore {
    pub fn new(config: DebugStoreConfig) -> Self {
        Self { config }
    }

    pub fn dir(&self, area: Area) -> PathBuf {
        match area {
            Area::Data => self.config.data_dir.clone(),
            Area::Debug => self.config.data_dir.join(DEBUG_SUBDIR),
        }
    }

    /// Write `data` as pretty JSON under a timestamped name, then rotate
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        data: &T,
        name: &str,
        area: Area,
    ) -> io::Result<PathBuf> {
        let dir = self.dir(area);
        tokio::fs::create_dir_all(&dir).await?;

        let stem = name.strip_suffix(".json").unwrap_or(name);
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%6f");
        let path = dir.join(format!("{stem}_{timestamp}.json"));

        let body = serde_json::to_vec_pretty(data)?;
        tokio::fs::write(&path, body).await?;

        let (max_bytes, max_files, include_subdirs) = match area {
            Area::Data => (self.config.data_max_bytes, self.config.data_max_files, true),
            Area::Debug => (self.config.debug_max_bytes, self.config.debug_max_files, false),
        };
        rotate(&dir, max_bytes, max_files, include_subdirs).await?;

        Ok(path)
    }

    /// Like [`save`](Self::save) but only logs failures
    pub async fn save_quietly<T: Serialize + ?Sized>(&self, data: &T, name: &str, area: Area) {
        match self.save(data, name, area).await {
            Ok(path) => ::log::debug!("Saved {} to {}", name, path.display()),
            Err(e) => ::log::error!("Error saving {}: {}", name, e),
        }
    }
}

/// Delete the oldest `.json` files in `dir` until both limits hold.
///
/// With `include_subdirs`, files one level down count against the same limits.
/// Files that vanish mid-scan are skipped. Returns the number of files removed.
pub async fn rotate(
    dir: &Path,
    max_bytes: u64,
    max_files: usize,
    include_subdirs: bool,
) -> io::Result<usize> {
    let mut files: Vec<(SystemTime, PathBuf, u64)> = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    let mut top_level = true;

    while let Some(current) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&current).await {
            Ok(entries) => entries,
            Err(e) if !top_level && e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(metadata) = stat(&path).await? else {
                continue;
            };
            if metadata.is_dir() {
                if include_subdirs && top_level {
                    pending.push(path);
                }
                continue;
            }
            if !metadata.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path, metadata.len()));
        }
        top_level = false;
    }

    // Names embed the write timestamp, so they break mtime ties in order.
    files.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut total: u64 = files.iter().map(|(_, _, size)| size).sum();
    let mut count = files.len();
    let mut removed = 0;
    for (_, path, size) in files {
        if total <= max_bytes && count <= max_files {
            break;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                ::log::info!("Rotated out old file: {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                ::log::debug!("Already rotated: {}", path.display());
            }
            Err(e) => ::log::error!("Error removing file {}: {}", path.display(), e),
        }
        total = total.saturating_sub(size);
        count -= 1;
    }
    Ok(removed)
}

/// Metadata for `path`, or `None` if another writer already removed it
async fn stat(path: &Path) -> io::Result<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(dir: &Path, max_files: usize, max_bytes: u64) -> DebugStore {
        DebugStore::new(DebugStoreConfig {
            data_dir: dir.to_path_buf(),
            data_max_bytes: max_bytes,
            data_max_files: max_files,
            debug_max_bytes: max_bytes,
            debug_max_files: max_files,
        })
    }

    async fn json_files(dir: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                out.push(entry.path());
            }
        }
        out.sort();
        out
    }

    #[tokio::test]
    async fn test_file_count_ceiling_evicts_oldest() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), 3, u64::MAX);

        let mut written = Vec::new();
        for i in 0..5 {
            let path = store
                .save(&json!({ "n": i }), "page.json", Area::Data)
                .await
                .unwrap();
            written.push(path);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let remaining = json_files(tmp.path()).await;
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining, written[2..].to_vec());
    }

    #[tokio::test]
    async fn test_size_ceiling_holds() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), 100, 200);
        let payload = json!({ "text": "x".repeat(80) });

        for _ in 0..6 {
            store.save(&payload, "blob", Area::Debug).await.unwrap();
        }

        let dir = store.dir(Area::Debug);
        let mut total = 0;
        for path in json_files(&dir).await {
            total += tokio::fs::metadata(path).await.unwrap().len();
        }
        assert!(total <= 200, "directory holds {total} bytes");
    }

    #[tokio::test]
    async fn test_data_ceiling_counts_debug_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = DebugStore::new(DebugStoreConfig {
            data_dir: tmp.path().to_path_buf(),
            data_max_bytes: u64::MAX,
            data_max_files: 2,
            debug_max_bytes: u64::MAX,
            debug_max_files: 5,
        });

        for _ in 0..2 {
            store.save(&json!({}), "response", Area::Debug).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(json_files(&store.dir(Area::Debug)).await.len(), 2);

        store.save(&json!({}), "pages", Area::Data).await.unwrap();

        assert_eq!(json_files(&store.dir(Area::Data)).await.len(), 1);
        assert_eq!(json_files(&store.dir(Area::Debug)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_debug_rotation_leaves_data_files_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), 1, u64::MAX);

        store.save(&json!({}), "pages", Area::Data).await.unwrap();
        store.save(&json!({}), "response", Area::Debug).await.unwrap();
        store.save(&json!({}), "response", Area::Debug).await.unwrap();

        assert_eq!(json_files(&store.dir(Area::Data)).await.len(), 1);
        assert_eq!(json_files(&store.dir(Area::Debug)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_succeed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path(), 1, u64::MAX);

        let mut set = tokio::task::JoinSet::new();
        for i in 0..16 {
            let store = store.clone();
            set.spawn(async move {
                store
                    .save(&json!({ "n": i }), &format!("job{i}"), Area::Debug)
                    .await
            });
        }
        while let Some(joined) = set.join_next().await {
            assert!(joined.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_vanished_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(stat(&tmp.path().join("gone.json")).await.unwrap().is_none());
    }
}

//! Object-storage seam for uploaded media.
//!
//! Uploads go through [`MediaStore`] so the HTTP layer never cares where the
//! bytes land; the bundled implementation writes to a local directory and
//! serves URLs under a configured public base.

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist one blob and return its public URL.
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredObject>;
}

/// Filesystem-backed store: objects under `root`, URLs under `public_base`.
pub struct DiskStore {
    root: PathBuf,
    public_base: String,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

fn sanitize(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl MediaStore for DiskStore {
    async fn put(
        &self,
        filename: &str,
        _content_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredObject> {
        let key = format!("{}-{}", Uuid::now_v7(), sanitize(filename));
        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create media root")?;
        tokio::fs::write(self.root.join(&key), bytes)
            .await
            .with_context(|| format!("write media object {key}"))?;
        let url = format!("{}/{}", self.public_base.trim_end_matches('/'), key);
        Ok(StoredObject { key, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_path_separators() {
        assert_eq!(sanitize("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize(""), "upload.bin");
        assert_eq!(sanitize("photo-1.png"), "photo-1.png");
    }

    #[tokio::test]
    async fn disk_store_writes_and_builds_url() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", Uuid::new_v4()));
        let store = DiskStore::new(&dir, "http://localhost:8083/media/");
        let stored = store.put("a.png", "image/png", b"png-bytes").await.unwrap();
        assert!(stored.url.starts_with("http://localhost:8083/media/"));
        assert!(stored.url.ends_with("a.png"));
        let on_disk = tokio::fs::read(dir.join(&stored.key)).await.unwrap();
        assert_eq!(on_disk, b"png-bytes");
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}

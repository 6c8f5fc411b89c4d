use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use memento_core::{BodyFormat, CacheEntry, CacheKey, Store, StoreResult, StoredEntry};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

const INDEX_FILE: &str = "index";
const META_FILE: &str = "meta";
const BODY_FILE: &str = "body";

/// Directory-per-key cache store.
///
/// ```no_run
/// use memento_fs::FsStore;
///
/// let store = FsStore::builder().root("/var/cache/memento").build();
/// ```
///
/// Cloning is cheap enough for per-request use; clones address the same
/// directory tree.
#[derive(Clone, Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Starts building a new store.
    pub fn builder() -> FsStoreBuilder {
        FsStoreBuilder::default()
    }

    /// Creates a store rooted at the given directory.
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsStore { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the append-only index artifact.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn namespace(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }
}

/// Builder for [`FsStore`].
#[derive(Debug, Default)]
pub struct FsStoreBuilder {
    root: Option<PathBuf>,
}

impl FsStoreBuilder {
    /// Sets the cache root directory.
    ///
    /// Defaults to the OS temporary directory.
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Creates the store.
    pub fn build(self) -> FsStore {
        FsStore {
            root: self.root.unwrap_or_else(std::env::temp_dir),
        }
    }
}

#[async_trait]
impl Store for FsStore {
    async fn read(&self, key: &CacheKey) -> StoredEntry {
        let namespace = self.namespace(key);

        let meta = match fs::read(namespace.join(META_FILE)).await {
            Ok(raw) => match serde_json::from_slice(&raw) {
                Ok(meta) => Some(meta),
                Err(error) => {
                    tracing::debug!(key = %key, %error, "discarding unparsable cache metadata");
                    None
                }
            },
            Err(_) => None,
        };

        let body = fs::read(namespace.join(BODY_FILE)).await.ok().map(Bytes::from);

        match &body {
            Some(body) => tracing::debug!(key = %key, bytes = body.len(), "cache read hit"),
            None => tracing::debug!(key = %key, "cache read miss"),
        }

        StoredEntry { meta, body }
    }

    async fn write(&self, entry: &CacheEntry) -> StoreResult<bool> {
        if entry.meta.status != 200 {
            return Ok(false);
        }

        // Index artifact first, then the per-key namespace.
        fs::create_dir_all(&self.root).await?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.index_path())
            .await?;

        let namespace = self.namespace(&entry.meta.key);
        fs::create_dir_all(&namespace).await?;
        fs::write(namespace.join(META_FILE), entry.meta.to_pretty_json()?).await?;

        if !entry.body.is_empty() {
            let format = BodyFormat::for_content_type(entry.meta.content_type());
            let encoded = format.encode(&entry.meta, &entry.body)?;
            fs::write(namespace.join(BODY_FILE), encoded).await?;

            let mut index = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.index_path())
                .await?;
            index
                .write_all(format!("{} {}\n", entry.meta.key, entry.meta.url).as_bytes())
                .await?;
        }

        tracing::debug!(
            key = %entry.meta.key,
            url = %entry.meta.url,
            bytes = entry.body.len(),
            "cache write"
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memento_core::body::parse_annotated;
    use memento_core::{CacheMeta, HeaderRecord, HeaderValues};
    use tempfile::TempDir;

    fn entry(key: &str, url: &str, status: u16, content_type: &str, body: &[u8]) -> CacheEntry {
        let mut headers = HeaderRecord::new();
        headers.insert(
            "Content-Type".into(),
            HeaderValues::One(content_type.into()),
        );
        CacheEntry::new(
            CacheMeta::new(CacheKey::new(key), url, status, headers),
            body.to_vec(),
        )
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let written = store
            .write(&entry("abc", "http://x", 200, "text/plain", b"hello"))
            .await
            .unwrap();
        assert!(written);

        let stored = store.read(&CacheKey::new("abc")).await;
        assert_eq!(stored.body.unwrap().as_ref(), b"hello");
        let meta = stored.meta.unwrap();
        assert_eq!(meta.status, 200);
        assert_eq!(meta.url, "http://x");
    }

    #[tokio::test]
    async fn non_200_write_is_rejected_without_side_effects() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        store
            .write(&entry("abc", "http://x", 200, "text/plain", b"hello"))
            .await
            .unwrap();

        let written = store
            .write(&entry("abc", "http://x", 404, "text/plain", b"x"))
            .await
            .unwrap();
        assert!(!written);

        // Prior stored state is unchanged.
        let stored = store.read(&CacheKey::new("abc")).await;
        assert_eq!(stored.body.unwrap().as_ref(), b"hello");
        assert_eq!(stored.meta.unwrap().status, 200);
    }

    #[tokio::test]
    async fn non_200_write_on_empty_cache_creates_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let written = store
            .write(&entry("abc", "http://x", 500, "text/plain", b"x"))
            .await
            .unwrap();
        assert!(!written);
        assert!(!store.index_path().exists());
        assert!(!tmp.path().join("abc").exists());
    }

    #[tokio::test]
    async fn unknown_key_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let stored = store.read(&CacheKey::new("missing")).await;
        assert!(stored.meta.is_none());
        assert!(stored.body.is_none());
        assert!(!stored.is_hit());
    }

    #[tokio::test]
    async fn corrupt_metadata_degrades_to_miss() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        store
            .write(&entry("abc", "http://x", 200, "text/plain", b"hello"))
            .await
            .unwrap();
        std::fs::write(tmp.path().join("abc").join("meta"), b"{ not json").unwrap();

        let stored = store.read(&CacheKey::new("abc")).await;
        assert!(stored.meta.is_none());
        // The body survives; the dispatcher falls back to default metadata.
        assert_eq!(stored.body.unwrap().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn html_body_carries_its_metadata() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let written_entry = entry(
            "abc",
            "http://x",
            200,
            "text/html; charset=utf-8",
            b"<html>hi</html>",
        );
        store.write(&written_entry).await.unwrap();

        let blob = std::fs::read(tmp.path().join("abc").join("body")).unwrap();
        let (annotation, body) = parse_annotated(&blob).unwrap();
        assert_eq!(annotation, written_entry.meta);
        assert_eq!(body, b"<html>hi</html>");

        // A hit serves the annotated blob verbatim.
        let stored = store.read(&CacheKey::new("abc")).await;
        assert_eq!(stored.body.unwrap().as_ref(), blob.as_slice());
    }

    #[tokio::test]
    async fn empty_body_persists_metadata_only() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let written = store
            .write(&entry("abc", "http://x", 200, "text/plain", b""))
            .await
            .unwrap();
        assert!(written);

        assert!(tmp.path().join("abc").join("meta").exists());
        assert!(!tmp.path().join("abc").join("body").exists());
        // The index exists but no record was appended.
        let index = std::fs::read_to_string(store.index_path()).unwrap();
        assert!(index.is_empty());

        let stored = store.read(&CacheKey::new("abc")).await;
        assert!(stored.meta.is_some());
        assert!(!stored.is_hit());
    }

    #[tokio::test]
    async fn index_accumulates_duplicates() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let e = entry("abc", "http://x", 200, "text/plain", b"hello");
        store.write(&e).await.unwrap();
        store.write(&e).await.unwrap();

        let index = std::fs::read_to_string(store.index_path()).unwrap();
        let lines: Vec<&str> = index.lines().collect();
        assert_eq!(lines, vec!["abc http://x", "abc http://x"]);
    }

    #[tokio::test]
    async fn overwrite_keeps_only_the_latest_body() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        store
            .write(&entry("abc", "http://x", 200, "text/plain", b"one"))
            .await
            .unwrap();
        store
            .write(&entry("abc", "http://x", 200, "text/plain", b"two"))
            .await
            .unwrap();

        let stored = store.read(&CacheKey::new("abc")).await;
        assert_eq!(stored.body.unwrap().as_ref(), b"two");
    }

    #[tokio::test]
    async fn binary_bodies_are_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let store = FsStore::builder().root(tmp.path()).build();

        let payload = [0u8, 159, 146, 150, 255];
        store
            .write(&entry(
                "bin",
                "http://x/blob",
                200,
                "application/octet-stream",
                &payload,
            ))
            .await
            .unwrap();

        let stored = store.read(&CacheKey::new("bin")).await;
        assert_eq!(stored.body.unwrap().as_ref(), payload);
    }

    #[tokio::test]
    async fn entries_survive_a_new_store_instance() {
        let tmp = TempDir::new().unwrap();
        {
            let store = FsStore::builder().root(tmp.path()).build();
            store
                .write(&entry("abc", "http://x", 200, "text/plain", b"hello"))
                .await
                .unwrap();
        }

        let reopened = FsStore::new(tmp.path());
        let stored = reopened.read(&CacheKey::new("abc")).await;
        assert_eq!(stored.body.unwrap().as_ref(), b"hello");
    }
}

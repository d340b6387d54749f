//! Async key-value store with shared lazy initialization
//!
//! `KeyValueStore` is a cheap-to-clone handle. Every operation first awaits
//! the one shared initialization of the backend, so callers never need to
//! sequence `init()` themselves and can never observe a backend that is not
//! open yet.
//!
//! Reads fail soft: a backend error, a failed initialization or a value that
//! does not deserialize is logged and reported as absent. Writes return the
//! error.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::backend::{FileBackend, MemoryBackend, StorageBackend};
use crate::error::{LedgerError, LedgerResult};

struct StoreInner {
    backend: Arc<dyn StorageBackend>,
    ready: OnceCell<()>,
}

/// Handle to the process-wide key-value store
#[derive(Clone)]
pub struct KeyValueStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for KeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueStore")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl KeyValueStore {
    /// Wrap a backend. Nothing is opened until the first operation.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend: Arc::new(backend),
                ready: OnceCell::new(),
            }),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn file(path: std::path::PathBuf) -> Self {
        Self::new(FileBackend::new(path))
    }

    /// Open the backend once
    ///
    /// Concurrent callers all wait on the same in-flight open. A failed open
    /// is not cached, so the next call tries again.
    pub async fn init(&self) -> LedgerResult<()> {
        self.inner
            .ready
            .get_or_try_init(|| async {
                let backend = Arc::clone(&self.inner.backend);
                tokio::task::spawn_blocking(move || backend.open())
                    .await
                    .map_err(|e| LedgerError::Storage(format!("Backend open panicked: {}", e)))??;
                info!("key-value store ready");
                Ok::<(), LedgerError>(())
            })
            .await
            .map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.initialized()
    }

    async fn backend(&self) -> LedgerResult<&dyn StorageBackend> {
        self.init().await?;
        Ok(self.inner.backend.as_ref())
    }

    /// Get a raw value; absent on any failure
    pub async fn get(&self, key: &str) -> Option<Value> {
        let backend = match self.backend().await {
            Ok(backend) => backend,
            Err(e) => {
                warn!(key, error = %e, "store not ready, reporting key as absent");
                return None;
            }
        };

        match backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "read failed, reporting key as absent");
                None
            }
        }
    }

    /// Get and deserialize a value; absent when missing or malformed
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    /// Run a backend write on the blocking pool once the store is open
    async fn write<R, F>(&self, op: F) -> LedgerResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&dyn StorageBackend) -> LedgerResult<R> + Send + 'static,
    {
        self.init().await?;
        let backend = Arc::clone(&self.inner.backend);
        tokio::task::spawn_blocking(move || op(backend.as_ref()))
            .await
            .map_err(|e| LedgerError::Storage(format!("Backend write panicked: {}", e)))?
    }

    /// Insert or overwrite a value
    pub async fn set(&self, key: &str, value: Value) -> LedgerResult<()> {
        let key = key.to_string();
        self.write(move |backend| backend.set(&key, value)).await
    }

    /// Serialize and store a value
    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T) -> LedgerResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }

    /// Remove a key; removing a missing key succeeds
    pub async fn remove(&self, key: &str) -> LedgerResult<()> {
        let key = key.to_string();
        self.write(move |backend| backend.remove(&key)).await
    }

    pub async fn clear(&self) -> LedgerResult<()> {
        self.write(|backend| backend.clear()).await?;
        info!("store cleared");
        Ok(())
    }

    /// All keys in no particular order; empty on failure
    pub async fn keys(&self) -> Vec<String> {
        let backend = match self.backend().await {
            Ok(backend) => backend,
            Err(e) => {
                warn!(error = %e, "store not ready, reporting no keys");
                return Vec::new();
            }
        };

        backend.keys().unwrap_or_else(|e| {
            warn!(error = %e, "listing keys failed, reporting no keys");
            Vec::new()
        })
    }

    pub async fn length(&self) -> usize {
        self.keys().await.len()
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .await
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect()
    }

    /// Fetch every present value in `keys` concurrently
    ///
    /// Fetches that come back absent, or whose task fails, are dropped.
    async fn fetch_all(&self, keys: Vec<String>) -> Vec<(String, Value)> {
        let mut tasks = JoinSet::new();
        for key in keys {
            let store = self.clone();
            tasks.spawn(async move {
                let value = store.get(&key).await;
                (key, value)
            });
        }

        let mut found = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, Some(value))) => found.push((key, value)),
                Ok((key, None)) => debug!(key, "dropping absent entry from scan"),
                Err(e) => warn!(error = %e, "fetch task failed, skipping entry"),
            }
        }
        found
    }

    /// Every value whose key starts with `prefix` (exact, case-sensitive)
    pub async fn get_all_by_prefix(&self, prefix: &str) -> Vec<Value> {
        let keys = self.keys_with_prefix(prefix).await;
        self.fetch_all(keys)
            .await
            .into_iter()
            .map(|(_, value)| value)
            .collect()
    }

    /// Every value under `prefix`, deserialized; malformed entries are skipped
    pub async fn get_all_by_prefix_as<T: DeserializeOwned>(&self, prefix: &str) -> Vec<T> {
        let keys = self.keys_with_prefix(prefix).await;
        self.fetch_all(keys)
            .await
            .into_iter()
            .filter_map(|(key, value)| match serde_json::from_value(value) {
                Ok(typed) => Some(typed),
                Err(e) => {
                    warn!(key, error = %e, "skipping malformed entry in prefix scan");
                    None
                }
            })
            .collect()
    }

    /// Delete every key under `prefix` and return how many went
    ///
    /// The backend decides how the batch is applied: the file backend
    /// rewrites once and keeps every key if that write fails, the default
    /// skips keys that fail individually.
    pub async fn remove_by_prefix(&self, prefix: &str) -> LedgerResult<usize> {
        self.init().await?;
        let keys = self.keys_with_prefix(prefix).await;
        if keys.is_empty() {
            return Ok(0);
        }

        let removed = self.write(move |backend| backend.remove_many(&keys)).await?;
        debug!(prefix, removed, "removed keys by prefix");
        Ok(removed)
    }

    /// Every present entry as one JSON object keyed by store key
    pub async fn export_document(&self) -> LedgerResult<Map<String, Value>> {
        self.init().await?;
        let keys = self.keys().await;

        let mut document = Map::new();
        for (key, value) in self.fetch_all(keys).await {
            document.insert(key, value);
        }
        Ok(document)
    }

    /// Serialize the whole store as one JSON object keyed by store key
    pub async fn export_all(&self) -> LedgerResult<String> {
        let document = self.export_document().await?;
        info!(entries = document.len(), "exported store");
        serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| LedgerError::Export(e.to_string()))
    }

    /// Merge an exported document into the store
    ///
    /// Returns false without touching the store when `blob` is not a JSON
    /// object. Otherwise every entry is written, overwriting existing keys;
    /// an entry that fails to write is logged and the rest still go in, and
    /// the call then returns false. Nothing already written is rolled back.
    pub async fn import_all(&self, blob: &str) -> bool {
        let document: Map<String, Value> = match serde_json::from_str(blob) {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, "import rejected: not a JSON object");
                return false;
            }
        };

        if let Err(e) = self.init().await {
            warn!(error = %e, "import rejected: store not ready");
            return false;
        }

        let total = document.len();
        let mut failed = 0;
        for (key, value) in document {
            if let Err(e) = self.set(&key, value).await {
                warn!(key, error = %e, "failed to import entry");
                failed += 1;
            }
        }

        info!(total, failed, "imported store entries");
        failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory backend that can fail on open or on selected keys
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        opens: Arc<AtomicUsize>,
        failing_opens: AtomicUsize,
        poisoned_marker: Option<&'static str>,
    }

    impl FlakyBackend {
        fn poisoned(&self, key: &str) -> bool {
            self.poisoned_marker.is_some_and(|m| key.contains(m))
        }
    }

    impl StorageBackend for FlakyBackend {
        fn open(&self) -> Result<(), LedgerError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.failing_opens.load(Ordering::SeqCst) > 0 {
                self.failing_opens.fetch_sub(1, Ordering::SeqCst);
                return Err(LedgerError::Storage("backend unavailable".into()));
            }
            Ok(())
        }

        fn get(&self, key: &str) -> Result<Option<Value>, LedgerError> {
            if self.poisoned(key) {
                return Err(LedgerError::Storage("read failed".into()));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: Value) -> Result<(), LedgerError> {
            if self.poisoned(key) {
                return Err(LedgerError::Storage("write failed".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), LedgerError> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), LedgerError> {
            self.inner.clear()
        }

        fn keys(&self) -> Result<Vec<String>, LedgerError> {
            self.inner.keys()
        }
    }

    async fn snapshot(store: &KeyValueStore) -> Map<String, Value> {
        serde_json::from_str(&store.export_all().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_operations_wait_for_init() {
        let store = KeyValueStore::in_memory();
        assert!(!store.is_ready());

        store.set("k", json!("v")).await.unwrap();

        assert!(store.is_ready());
        assert_eq!(store.get("k").await, Some(json!("v")));
    }

    #[tokio::test]
    async fn test_concurrent_init_opens_backend_once() {
        let opens = Arc::new(AtomicUsize::new(0));
        let backend = FlakyBackend {
            opens: Arc::clone(&opens),
            ..Default::default()
        };
        let store = KeyValueStore::new(backend);

        let mut tasks = JoinSet::new();
        for i in 0..16 {
            let store = store.clone();
            tasks.spawn(async move {
                if i % 2 == 0 {
                    store.init().await.unwrap();
                } else {
                    store.get("anything").await;
                }
            });
        }
        while tasks.join_next().await.is_some() {}

        store.init().await.unwrap();
        assert_eq!(opens.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_reads_absent_writes_fail_then_retries() {
        let backend = FlakyBackend {
            failing_opens: AtomicUsize::new(2),
            ..Default::default()
        };
        let store = KeyValueStore::new(backend);

        assert_eq!(store.get("k").await, None);
        assert!(store.set("k", json!(1)).await.is_err());
        assert!(!store.is_ready());

        store.set("k", json!(1)).await.unwrap();
        assert_eq!(store.get("k").await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_get_fails_soft_on_backend_error() {
        let backend = FlakyBackend {
            poisoned_marker: Some("bad"),
            ..Default::default()
        };
        let store = KeyValueStore::new(backend);

        assert_eq!(store.get("bad_key").await, None);
        assert!(store.set("bad_key", json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_get_as_treats_wrong_shape_as_absent() {
        let store = KeyValueStore::in_memory();
        store.set("n", json!("not a number")).await.unwrap();

        assert_eq!(store.get_as::<i64>("n").await, None);
        assert_eq!(store.get_as::<String>("n").await.as_deref(), Some("not a number"));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove_is_idempotent() {
        let store = KeyValueStore::in_memory();
        store.set("k", json!(1)).await.unwrap();
        store.set("k", json!(2)).await.unwrap();
        assert_eq!(store.get("k").await, Some(json!(2)));
        assert_eq!(store.length().await, 1);

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await, None);
        assert_eq!(store.length().await, 0);
    }

    #[tokio::test]
    async fn test_prefix_isolation() {
        let store = KeyValueStore::in_memory();
        store.set("expenses_1", json!({"n": 1})).await.unwrap();
        store.set("expenses_2", json!({"n": 2})).await.unwrap();
        store.set("incomes_1", json!({"n": 3})).await.unwrap();
        store.set("expense_categories", json!([])).await.unwrap();

        let expenses = store.get_all_by_prefix("expenses_").await;
        let numbers: HashSet<i64> = expenses.iter().map(|v| v["n"].as_i64().unwrap()).collect();
        assert_eq!(numbers, HashSet::from([1, 2]));

        assert_eq!(store.get_all_by_prefix("incomes_").await.len(), 1);
        assert!(store.get_all_by_prefix("budgets_").await.is_empty());
        assert!(store.get_all_by_prefix("EXPENSES_").await.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_scan_drops_failed_fetches() {
        let backend = FlakyBackend {
            poisoned_marker: Some("bad"),
            ..Default::default()
        };
        backend.inner.set("items_ok", json!(1)).unwrap();
        backend.inner.set("items_bad", json!(2)).unwrap();
        let store = KeyValueStore::new(backend);

        assert_eq!(store.get_all_by_prefix("items_").await, vec![json!(1)]);
    }

    #[tokio::test]
    async fn test_typed_prefix_scan_skips_malformed() {
        let store = KeyValueStore::in_memory();
        store.set("nums_a", json!(10)).await.unwrap();
        store.set("nums_b", json!("ten")).await.unwrap();

        let nums: Vec<i64> = store.get_all_by_prefix_as("nums_").await;
        assert_eq!(nums, vec![10]);
    }

    #[tokio::test]
    async fn test_remove_by_prefix() {
        let store = KeyValueStore::in_memory();
        store.set("budgets_1", json!(1)).await.unwrap();
        store.set("budgets_2", json!(2)).await.unwrap();
        store.set("expenses_1", json!(3)).await.unwrap();

        assert_eq!(store.remove_by_prefix("budgets_").await.unwrap(), 2);
        assert!(store.get_all_by_prefix("budgets_").await.is_empty());
        assert_eq!(store.keys().await, vec!["expenses_1".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_remove_by_prefix_persists() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = KeyValueStore::file(path.clone());
        store.set("budgets_1", json!(1)).await.unwrap();
        store.set("budgets_2", json!(2)).await.unwrap();
        store.set("expenses_1", json!(3)).await.unwrap();

        assert_eq!(store.remove_by_prefix("budgets_").await.unwrap(), 2);
        assert_eq!(store.remove_by_prefix("budgets_").await.unwrap(), 0);

        let reopened = KeyValueStore::file(path);
        assert_eq!(reopened.keys().await, vec!["expenses_1".to_string()]);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let store = KeyValueStore::in_memory();
        store.set("expenses_1", json!({"amount": 100})).await.unwrap();
        store.set("session_active", json!(true)).await.unwrap();
        store.set("expense_categories", json!([{"id": "1"}])).await.unwrap();
        let before = snapshot(&store).await;

        let blob = store.export_all().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.length().await, 0);

        assert!(store.import_all(&blob).await);
        assert_eq!(snapshot(&store).await, before);
    }

    #[tokio::test]
    async fn test_import_over_existing_state_is_identity() {
        let store = KeyValueStore::in_memory();
        store.set("a", json!(1)).await.unwrap();
        store.set("b", json!({"x": [1, 2]})).await.unwrap();
        let before = snapshot(&store).await;

        let blob = store.export_all().await.unwrap();
        assert!(store.import_all(&blob).await);
        assert_eq!(snapshot(&store).await, before);
    }

    #[tokio::test]
    async fn test_import_merges_and_overwrites() {
        let store = KeyValueStore::in_memory();
        store.set("keep", json!("old")).await.unwrap();
        store.set("replace", json!("old")).await.unwrap();

        assert!(store.import_all(r#"{"replace": "new", "added": 5}"#).await);

        assert_eq!(store.get("keep").await, Some(json!("old")));
        assert_eq!(store.get("replace").await, Some(json!("new")));
        assert_eq!(store.get("added").await, Some(json!(5)));
    }

    #[tokio::test]
    async fn test_malformed_import_changes_nothing() {
        let store = KeyValueStore::in_memory();
        store.set("keep", json!(1)).await.unwrap();

        assert!(!store.import_all("{\"keep\": 2, ").await);
        assert!(!store.import_all("[1, 2, 3]").await);

        assert_eq!(store.get("keep").await, Some(json!(1)));
        assert_eq!(store.length().await, 1);
    }

    #[tokio::test]
    async fn test_import_continues_past_failed_entry() {
        let backend = FlakyBackend {
            poisoned_marker: Some("bad"),
            ..Default::default()
        };
        let store = KeyValueStore::new(backend);

        assert!(!store.import_all(r#"{"bad_one": 1, "good_one": 2}"#).await);
        assert_eq!(store.get("good_one").await, Some(json!(2)));
    }
}

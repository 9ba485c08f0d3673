//! In-memory store and reporter used by the unit tests.

use super::outcome::SyncOutcome;
use super::reporter::SyncReporter;
use crate::store::{SecretDocument, SecretStore, StoreError, StoredSecret};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub fn doc(value: serde_json::Value) -> SecretDocument {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<(String, String), (SecretDocument, u64)>,
    fail_writes: HashSet<String>,
    fail_reads: HashSet<String>,
    panic_reads: HashSet<String>,
    tampered: HashMap<String, SecretDocument>,
    fail_list: bool,
    delay: Option<Duration>,
    reads: usize,
    writes: usize,
}

/// A KV store that lists like Vault: sorted, folders suffixed with `/`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn insert(&self, mount: &str, path: &str, document: SecretDocument) {
        self.lock()
            .data
            .insert((mount.to_string(), path.to_string()), (document, 1));
    }

    pub fn get(&self, mount: &str, path: &str) -> Option<SecretDocument> {
        self.lock()
            .data
            .get(&(mount.to_string(), path.to_string()))
            .map(|(doc, _)| doc.clone())
    }

    pub fn fail_writes_to(&self, path: &str) {
        self.lock().fail_writes.insert(path.to_string());
    }

    pub fn fail_reads_of(&self, path: &str) {
        self.lock().fail_reads.insert(path.to_string());
    }

    /// Make reads of `path` panic, as a bug in a store implementation would.
    pub fn panic_reads_of(&self, path: &str) {
        self.lock().panic_reads.insert(path.to_string());
    }

    pub fn tamper_reads_of(&self, path: &str, document: SecretDocument) {
        self.lock().tampered.insert(path.to_string(), document);
    }

    pub fn fail_listing(&self) {
        self.lock().fail_list = true;
    }

    pub fn delay_calls(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn list(&self, mount: &str, path: &str) -> Result<Vec<String>, StoreError> {
        self.pause().await;
        let inner = self.lock();
        if inner.fail_list {
            return Err(StoreError::Status {
                status: 500,
                body: "list unavailable".into(),
            });
        }

        let prefix = match path.trim_matches('/') {
            "" => String::new(),
            p => format!("{p}/"),
        };
        let mut entries = BTreeSet::new();
        for (m, p) in inner.data.keys() {
            if m != mount {
                continue;
            }
            if let Some(rest) = p.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((folder, _)) => entries.insert(format!("{folder}/")),
                    None => entries.insert(rest.to_string()),
                };
            }
        }
        Ok(entries.into_iter().collect())
    }

    async fn read(&self, mount: &str, path: &str) -> Result<StoredSecret, StoreError> {
        self.pause().await;
        // Checked with the guard released so the mutex is not poisoned.
        let panics = self.lock().panic_reads.contains(path);
        if panics {
            panic!("store read of {path} panicked");
        }
        let mut inner = self.lock();
        inner.reads += 1;
        if inner.fail_reads.contains(path) {
            return Err(StoreError::Status {
                status: 503,
                body: "read unavailable".into(),
            });
        }
        if let Some(document) = inner.tampered.get(path) {
            return Ok(StoredSecret {
                document: document.clone(),
                version: None,
            });
        }
        inner
            .data
            .get(&(mount.to_string(), path.to_string()))
            .map(|(document, version)| StoredSecret {
                document: document.clone(),
                version: Some(*version),
            })
            .ok_or_else(|| StoreError::NotFound(format!("{mount}/{path}")))
    }

    async fn write(
        &self,
        mount: &str,
        path: &str,
        document: &SecretDocument,
    ) -> Result<Option<u64>, StoreError> {
        self.pause().await;
        let mut inner = self.lock();
        if inner.fail_writes.contains(path) {
            return Err(StoreError::Status {
                status: 503,
                body: "write unavailable".into(),
            });
        }
        inner.writes += 1;
        let entry = inner
            .data
            .entry((mount.to_string(), path.to_string()))
            .or_insert_with(|| (SecretDocument::new(), 0));
        entry.0 = document.clone();
        entry.1 += 1;
        Ok(Some(entry.1))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

pub struct NullReporter;

impl SyncReporter for NullReporter {
    fn key_finished(&self, _outcome: &SyncOutcome) {}
}

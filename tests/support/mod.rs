//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hvm::store::{SecretDocument, SecretStore, StoreError, StoredSecret};
use hvm::sync::{SyncOutcome, SyncReporter};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn doc(value: serde_json::Value) -> SecretDocument {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

/// One call made against a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub store: String,
    pub op: &'static str,
    pub path: String,
}

/// Ordered log shared by every store in a scenario.
#[derive(Default, Clone)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// Positions of every event whose path ends with `/{key}`.
    pub fn positions_of(&self, key: &str) -> Vec<usize> {
        let suffix = format!("/{key}");
        self.events()
            .iter()
            .enumerate()
            .filter(|(_, e)| e.op != "list" && e.path.ends_with(&suffix))
            .map(|(i, _)| i)
            .collect()
    }
}

/// A single-mount KV store that logs every call.
pub struct RecordingStore {
    name: String,
    log: EventLog,
    data: Mutex<BTreeMap<String, SecretDocument>>,
    fail_writes: Mutex<HashSet<String>>,
    delays: Mutex<HashMap<String, Duration>>,
}

impl RecordingStore {
    pub fn new(name: &str, log: &EventLog) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            log: log.clone(),
            data: Mutex::new(BTreeMap::new()),
            fail_writes: Mutex::new(HashSet::new()),
            delays: Mutex::new(HashMap::new()),
        })
    }

    pub fn insert(&self, path: &str, document: SecretDocument) {
        self.data.lock().unwrap().insert(path.to_string(), document);
    }

    pub fn get(&self, path: &str) -> Option<SecretDocument> {
        self.data.lock().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.data.lock().unwrap().len()
    }

    pub fn fail_writes_to(&self, path: &str) {
        self.fail_writes.lock().unwrap().insert(path.to_string());
    }

    /// Slow down reads and writes of `path`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }

    fn record(&self, op: &'static str, path: &str) {
        self.log.push(Event {
            store: self.name.clone(),
            op,
            path: path.to_string(),
        });
    }

    async fn pause(&self, path: &str) {
        let delay = self.delays.lock().unwrap().get(path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SecretStore for RecordingStore {
    async fn list(&self, _mount: &str, path: &str) -> Result<Vec<String>, StoreError> {
        self.record("list", path);
        let prefix = match path.trim_matches('/') {
            "" => String::new(),
            p => format!("{p}/"),
        };
        let mut keys: Vec<String> = self
            .data
            .lock()
            .unwrap()
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(|rest| match rest.split_once('/') {
                Some((folder, _)) => format!("{folder}/"),
                None => rest.to_string(),
            })
            .collect();
        keys.dedup();
        Ok(keys)
    }

    async fn read(&self, _mount: &str, path: &str) -> Result<StoredSecret, StoreError> {
        self.record("read", path);
        self.pause(path).await;
        let document = self
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(StoredSecret {
            document,
            version: Some(1),
        })
    }

    async fn write(
        &self,
        _mount: &str,
        path: &str,
        document: &SecretDocument,
    ) -> Result<Option<u64>, StoreError> {
        self.record("write", path);
        self.pause(path).await;
        if self.fail_writes.lock().unwrap().contains(path) {
            return Err(StoreError::Status {
                status: 403,
                body: "permission denied".to_string(),
            });
        }
        self.insert(path, document.clone());
        Ok(Some(1))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Keeps every outcome handed to `key_finished`.
#[derive(Default)]
pub struct CollectingReporter {
    outcomes: Mutex<Vec<SyncOutcome>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl CollectingReporter {
    pub fn outcomes(&self) -> Vec<SyncOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

impl SyncReporter for CollectingReporter {
    fn batch_started(&self, _index: usize, keys: &[String]) {
        self.batches.lock().unwrap().push(keys.to_vec());
    }

    fn key_finished(&self, outcome: &SyncOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

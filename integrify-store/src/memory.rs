//! In-memory document store.
//!
//! Backs the test suites and the replay tool. Documents live in a single
//! ordered map guarded by an async `RwLock`, so queries return documents in
//! path order and a commit is applied under one write lock.

use crate::batch::{WriteBatch, WriteOp, apply_update};
use crate::error::{StoreError, StoreResult};
use crate::query::Query;
use crate::DocumentStore;
use async_trait::async_trait;
use integrify_types::{CollectionPath, DocumentPath, DocumentSnapshot, Fields};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Operation counters of a [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub reads: usize,
    pub queries: usize,
    pub commits: usize,
}

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    queries: AtomicUsize,
    commits: AtomicUsize,
}

/// A [`DocumentStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<DocumentPath, Fields>>,
    /// Injected failures keyed by commit sequence number.
    failures: Mutex<BTreeMap<usize, StoreError>>,
    counters: Counters,
}

fn object(path: &str, data: Value) -> StoreResult<Fields> {
    match data {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidData(format!(
            "document [{path}] must be an object, got {other}"
        ))),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a JSON object mapping document paths to their
    /// field objects, e.g. `{"master/m1": {"name": "x"}}`.
    pub fn from_json(seed: &Value) -> StoreResult<Self> {
        let Value::Object(entries) = seed else {
            return Err(StoreError::InvalidData(
                "seed must be an object of path -> fields".to_string(),
            ));
        };
        let mut documents = BTreeMap::new();
        for (path, data) in entries {
            let fields = object(path, data.clone())?;
            documents.insert(DocumentPath::parse(path)?, fields);
        }
        Ok(Self {
            documents: RwLock::new(documents),
            ..Self::default()
        })
    }

    /// Creates or overwrites a document.
    pub async fn set(&self, path: &str, data: Value) -> StoreResult<DocumentPath> {
        let doc_path = DocumentPath::parse(path)?;
        let fields = object(path, data)?;
        self.documents.write().await.insert(doc_path.clone(), fields);
        Ok(doc_path)
    }

    /// Creates a document with a generated id inside `collection`.
    pub async fn add(&self, collection: &str, data: Value) -> StoreResult<DocumentPath> {
        let collection = CollectionPath::parse(collection)?;
        let doc_path = collection.doc(&Uuid::now_v7().simple().to_string())?;
        let fields = object(doc_path.as_str(), data)?;
        self.documents.write().await.insert(doc_path.clone(), fields);
        Ok(doc_path)
    }

    /// Removes a document, returning its last snapshot.
    pub async fn remove(&self, path: &str) -> StoreResult<Option<DocumentSnapshot>> {
        let doc_path = DocumentPath::parse(path)?;
        let removed = self.documents.write().await.remove(&doc_path);
        Ok(removed.map(|data| DocumentSnapshot::new(doc_path, data)))
    }

    /// Current fields of a document. Does not count as a read.
    pub async fn document(&self, path: &str) -> Option<Fields> {
        let doc_path = DocumentPath::parse(path).ok()?;
        self.documents.read().await.get(&doc_path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Every document as a `{path: fields}` object, in path order.
    pub async fn to_json(&self) -> Value {
        let documents = self.documents.read().await;
        Value::Object(
            documents
                .iter()
                .map(|(path, fields)| (path.to_string(), Value::Object(fields.clone())))
                .collect(),
        )
    }

    /// Makes the next commit fail with `err` without applying anything.
    pub fn fail_next_commit(&self, err: StoreError) {
        self.fail_commit_in(0, err);
    }

    /// Lets `skip` commits through, then fails the one after with `err`.
    pub fn fail_commit_in(&self, skip: usize, err: StoreError) {
        let at = self.counters.commits.load(Ordering::SeqCst) + skip;
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(at, err);
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            reads: self.counters.reads.load(Ordering::SeqCst),
            queries: self.counters.queries.load(Ordering::SeqCst),
            commits: self.counters.commits.load(Ordering::SeqCst),
        }
    }

    fn take_failure(&self, seq: usize) -> Option<StoreError> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&seq)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        self.counters.reads.fetch_add(1, Ordering::SeqCst);
        let documents = self.documents.read().await;
        Ok(documents
            .get(path)
            .map(|data| DocumentSnapshot::new(path.clone(), data.clone())))
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        self.counters.queries.fetch_add(1, Ordering::SeqCst);
        let documents = self.documents.read().await;
        let results: Vec<DocumentSnapshot> = documents
            .iter()
            .map(|(path, data)| DocumentSnapshot::new(path.clone(), data.clone()))
            .filter(|snapshot| query.matches(snapshot))
            .collect();
        debug!("query {query} matched {} document(s)", results.len());
        Ok(results)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        let seq = self.counters.commits.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.take_failure(seq) {
            debug!("commit of {} op(s) failed: {err}", batch.len());
            return Err(err);
        }

        let mut documents = self.documents.write().await;

        // Stage every op against the current state so a failing op leaves
        // the store untouched.
        let mut staged: BTreeMap<DocumentPath, Option<Fields>> = BTreeMap::new();
        let op_count = batch.len();
        for op in batch.into_ops() {
            match op {
                WriteOp::Update { path, fields } => {
                    let current = match staged.get(&path) {
                        Some(entry) => entry.clone(),
                        None => documents.get(&path).cloned(),
                    };
                    let Some(mut data) = current else {
                        return Err(StoreError::NotFound(path.to_string()));
                    };
                    apply_update(&mut data, &fields);
                    staged.insert(path, Some(data));
                }
                WriteOp::Delete { path } => {
                    staged.insert(path, None);
                }
            }
        }

        for (path, data) in staged {
            match data {
                Some(data) => {
                    documents.insert(path, data);
                }
                None => {
                    documents.remove(&path);
                }
            }
        }
        debug!("committed {op_count} op(s)");
        Ok(())
    }
}

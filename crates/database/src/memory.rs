//! In-memory document store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::merge::merge_patch;
use crate::path::DocPath;
use crate::{Document, DocumentStore};

/// Store operation kinds, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Delete,
    List,
}

#[derive(Debug, Default)]
struct State {
    docs: BTreeMap<String, Document>,
    faults: Vec<(StoreOp, String)>,
}

/// A [`DocumentStore`] kept entirely in memory.
///
/// Faults can be injected per operation kind and path prefix, which makes
/// the store useful for exercising error paths in callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `op` on a path starting with `prefix` fail.
    pub async fn fail_on(&self, op: StoreOp, prefix: impl Into<String>) {
        self.state.write().await.faults.push((op, prefix.into()));
    }

    /// Remove all injected faults.
    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    /// Number of successful writes (set, merge, successful compare-and-set).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// All stored paths, sorted.
    pub async fn paths(&self) -> Vec<String> {
        self.state.read().await.docs.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.docs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.docs.is_empty()
    }

    fn check(state: &State, op: StoreOp, path: &str) -> Result<()> {
        let injected = state
            .faults
            .iter()
            .any(|(fault_op, prefix)| *fault_op == op && path.starts_with(prefix.as_str()));
        if injected {
            return Err(StoreError::Unavailable(format!(
                "injected {:?} fault at {}",
                op, path
            )));
        }
        Ok(())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
        let key = path.to_string();
        let state = self.state.read().await;
        Self::check(&state, StoreOp::Read, &key)?;
        Ok(state.docs.get(&key).cloned())
    }

    async fn set(&self, path: &DocPath, doc: Document) -> Result<()> {
        let key = path.to_string();
        let mut state = self.state.write().await;
        Self::check(&state, StoreOp::Write, &key)?;
        state.docs.insert(key, doc);
        self.record_write();
        Ok(())
    }

    async fn merge(&self, path: &DocPath, doc: Document) -> Result<()> {
        let key = path.to_string();
        let mut state = self.state.write().await;
        Self::check(&state, StoreOp::Write, &key)?;
        let target = state.docs.entry(key).or_default();
        merge_patch(target, doc);
        self.record_write();
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<bool> {
        let key = path.to_string();
        let mut state = self.state.write().await;
        Self::check(&state, StoreOp::Delete, &key)?;
        Ok(state.docs.remove(&key).is_some())
    }

    async fn list_children(&self, parent: &DocPath) -> Result<Vec<String>> {
        let prefix = parent.descendant_prefix();
        let state = self.state.read().await;
        Self::check(&state, StoreOp::List, &parent.to_string())?;

        let children: BTreeSet<String> = state
            .docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter_map(|(path, _)| parent.child_segment_of(path))
            .map(str::to_string)
            .collect();

        Ok(children.into_iter().collect())
    }

    async fn compare_and_set(
        &self,
        path: &DocPath,
        expected: Option<&Document>,
        doc: Document,
    ) -> Result<bool> {
        let key = path.to_string();
        let mut state = self.state.write().await;
        Self::check(&state, StoreOp::Write, &key)?;

        if state.docs.get(&key) != expected {
            return Ok(false);
        }
        state.docs.insert(key, doc);
        self.record_write();
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

//! In-memory tree store backend.
//!
//! This module provides a thread-safe in-memory implementation of [`TreeStore`].
//! It is intended for embedded usage, tests, and as a reference implementation
//! of realtime-database write semantics:
//! - `set` replaces a subtree, and writing `null` deletes it
//! - `update` writes each child of an object independently, keys may be paths
//! - nulls inside written objects are dropped and empty parents are pruned

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::trace;

use crate::path;
use crate::storage::push_id::PushIdGenerator;
use crate::storage::traits::{PushRef, StoreError, TreeStore};

const FORBIDDEN_KEY_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

fn lock_err(context: &'static str) -> StoreError {
    StoreError::BackendError(format!("poisoned lock: {context}"))
}

fn parse_path(raw: &str) -> Result<Vec<String>, StoreError> {
    path::segments(raw)
        .map(|seg| {
            if seg.contains(FORBIDDEN_KEY_CHARS) {
                Err(StoreError::InvalidPath(raw.to_string()))
            } else {
                Ok(seg.to_string())
            }
        })
        .collect()
}

/// Drop null children and collapse empty objects to null.
fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let out: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if out.is_empty() {
                Value::Null
            } else {
                Value::Object(out)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        other => other,
    }
}

fn write_at(node: &mut Value, segs: &[String], value: Value) {
    let Some((head, rest)) = segs.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            // Nothing stored below a scalar; deleting is a no-op.
            return;
        }
        *node = Value::Object(Map::new());
    }
    let Value::Object(map) = node else {
        return;
    };

    let emptied = {
        let child = map.entry(head.clone()).or_insert(Value::Null);
        write_at(child, rest, value);
        child.is_null()
    };
    if emptied {
        map.remove(head);
    }
    if map.is_empty() {
        *node = Value::Null;
    }
}

fn read_at<'a>(node: &'a Value, segs: &[String]) -> Option<&'a Value> {
    segs.iter().try_fold(node, |current, seg| current.get(seg))
}

/// Thread-safe in-memory tree store.
#[derive(Debug, Default)]
pub struct InMemoryTreeStore {
    root: RwLock<Value>,
    ids: PushIdGenerator,
}

impl InMemoryTreeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `data` at the root.
    #[must_use]
    pub fn with_data(data: Value) -> Self {
        Self {
            root: RwLock::new(normalize(data)),
            ids: PushIdGenerator::new(),
        }
    }

    /// Read the value at `path`; missing nodes read as `null`.
    ///
    /// # Errors
    /// - `InvalidPath` if a segment contains a forbidden character
    /// - `BackendError` if the lock is poisoned
    pub fn get(&self, path: &str) -> Result<Value, StoreError> {
        let segs = parse_path(path)?;
        let root = self.root.read().map_err(|_| lock_err("tree.get"))?;
        Ok(read_at(&root, &segs).cloned().unwrap_or(Value::Null))
    }

    /// Clone of the whole tree.
    ///
    /// # Errors
    /// `BackendError` if the lock is poisoned.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        let root = self.root.read().map_err(|_| lock_err("tree.snapshot"))?;
        Ok(root.clone())
    }
}

#[async_trait]
impl TreeStore for InMemoryTreeStore {
    async fn update(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let Value::Object(children) = value else {
            return Err(StoreError::InvalidValue {
                path: path.to_string(),
                reason: format!("update expects an object, found {}", path::json_type_name(&value)),
            });
        };

        let base = parse_path(path)?;
        let mut writes = Vec::with_capacity(children.len());
        for (key, child) in children {
            let rel = parse_path(&key)?;
            if rel.is_empty() {
                return Err(StoreError::InvalidPath(format!("{path} + '{key}'")));
            }
            let mut segs = base.clone();
            segs.extend(rel);
            writes.push((segs, normalize(child)));
        }

        let mut root = self.root.write().map_err(|_| lock_err("tree.update"))?;
        for (segs, child) in writes {
            trace!(path = %segs.join("/"), "update child");
            write_at(&mut root, &segs, child);
        }
        Ok(())
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segs = parse_path(path)?;
        let value = normalize(value);
        let mut root = self.root.write().map_err(|_| lock_err("tree.set"))?;
        trace!(path, deleting = value.is_null(), "set");
        write_at(&mut root, &segs, value);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segs = parse_path(path)?;
        let mut root = self.root.write().map_err(|_| lock_err("tree.remove"))?;
        trace!(path, "remove");
        write_at(&mut root, &segs, Value::Null);
        Ok(())
    }

    async fn push(&self, path: &str) -> Result<PushRef, StoreError> {
        parse_path(path)?;
        let key = self.ids.next_id()?;
        trace!(path, key = %key, "push");
        Ok(PushRef::new(path, key))
    }
}

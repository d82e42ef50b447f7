#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rtdbql::{InMemoryTreeStore, PushRef, StoreError, TreeStore};
use serde_json::Value;

/// One call observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Update(String, Value),
    Set(String, Value),
    Remove(String),
    Push(String),
}

/// Wraps an in-memory store, recording every call and optionally failing writes.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub inner: InMemoryTreeStore,
    calls: Mutex<Vec<StoreCall>>,
    fail_writes: Mutex<Option<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every following write fail with `PermissionDenied(message)`.
    pub fn deny_writes(&self, message: &str) {
        *self.fail_writes.lock().unwrap() = Some(message.to_string());
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_writes.lock().unwrap().as_ref() {
            Some(msg) => Err(StoreError::PermissionDenied(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TreeStore for RecordingStore {
    async fn update(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.record(StoreCall::Update(path.to_string(), value.clone()))?;
        self.inner.update(path, value).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.record(StoreCall::Set(path.to_string(), value.clone()))?;
        self.inner.set(path, value).await
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Remove(path.to_string()))?;
        self.inner.remove(path).await
    }

    async fn push(&self, path: &str) -> Result<PushRef, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Push(path.to_string()));
        self.inner.push(path).await
    }
}

//! In-memory store for testing and a recording decorator for asserting on
//! the exact sequence of store calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::StoreClient;
use crate::error::{Result, StoreError};
use crate::object::{Object, ObjectKey, Uid};

/// In-memory object store with optimistic concurrency.
///
/// Create assigns a uid and resource version 1; every write bumps the
/// version; an update or status write carrying a stale version is rejected
/// with [`StoreError::Conflict`].
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, ObjectKey), Object>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory store wrapped in an Arc.
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of stored objects.
    pub async fn count(&self) -> usize {
        self.objects.read().await.len()
    }

    fn check_version(stored: &Object, submitted: &Object) -> Result<()> {
        if let (Some(current), Some(sent)) = (
            stored.metadata.resource_version,
            submitted.metadata.resource_version,
        ) {
            if current != sent {
                return Err(StoreError::conflict(
                    &submitted.kind,
                    submitted.key(),
                    format!("resource version {sent} is stale (current {current})"),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get(&self, kind: &str, key: &ObjectKey) -> Result<Object> {
        let objects = self.objects.read().await;
        objects
            .get(&(kind.to_string(), key.clone()))
            .cloned()
            .ok_or_else(|| StoreError::not_found(kind, key.clone()))
    }

    async fn create(&self, obj: &Object) -> Result<Object> {
        if obj.metadata.name.is_empty() {
            return Err(StoreError::invalid("object name must not be empty"));
        }

        let mut objects = self.objects.write().await;
        let slot = (obj.kind.clone(), obj.key());
        if objects.contains_key(&slot) {
            return Err(StoreError::conflict(
                &obj.kind,
                obj.key(),
                "object already exists",
            ));
        }

        let mut stored = obj.clone();
        stored.metadata.uid.get_or_insert_with(Uid::new);
        stored.metadata.resource_version = Some(1);
        objects.insert(slot, stored.clone());
        Ok(stored)
    }

    async fn update(&self, obj: &Object) -> Result<Object> {
        let mut objects = self.objects.write().await;
        let slot = (obj.kind.clone(), obj.key());
        let stored = objects
            .get_mut(&slot)
            .ok_or_else(|| StoreError::not_found(&obj.kind, obj.key()))?;

        Self::check_version(stored, obj)?;

        let mut replacement = obj.clone();
        replacement.metadata.uid = stored.metadata.uid;
        replacement.metadata.resource_version =
            Some(stored.metadata.resource_version.unwrap_or(0).saturating_add(1));
        *stored = replacement.clone();
        Ok(replacement)
    }

    async fn delete(&self, obj: &Object) -> Result<()> {
        let mut objects = self.objects.write().await;
        objects
            .remove(&(obj.kind.clone(), obj.key()))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(&obj.kind, obj.key()))
    }

    async fn update_status(&self, obj: &Object) -> Result<Object> {
        let mut objects = self.objects.write().await;
        let slot = (obj.kind.clone(), obj.key());
        let stored = objects
            .get_mut(&slot)
            .ok_or_else(|| StoreError::not_found(&obj.kind, obj.key()))?;

        Self::check_version(stored, obj)?;

        stored.status = obj.status.clone();
        stored.metadata.resource_version =
            Some(stored.metadata.resource_version.unwrap_or(0).saturating_add(1));
        Ok(stored.clone())
    }
}

/// A store operation observed by [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Get(ObjectKey),
    Create(ObjectKey),
    Update(ObjectKey),
    Delete(ObjectKey),
    UpdateStatus(ObjectKey),
}

/// A wrapper that records every call made to the inner store, in order.
///
/// Tests assert on the op log to prove which writes did and did not happen.
pub struct RecordingStore<S: StoreClient> {
    inner: S,
    ops: Mutex<Vec<StoreOp>>,
}

impl<S: StoreClient> RecordingStore<S> {
    /// Wrap a store client.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            ops: Mutex::new(Vec::new()),
        }
    }

    /// The operations observed so far, in call order.
    pub fn ops(&self) -> Vec<StoreOp> {
        match self.ops.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, op: StoreOp) {
        match self.ops.lock() {
            Ok(mut guard) => guard.push(op),
            Err(poisoned) => poisoned.into_inner().push(op),
        }
    }
}

#[async_trait]
impl<S: StoreClient> StoreClient for RecordingStore<S> {
    async fn get(&self, kind: &str, key: &ObjectKey) -> Result<Object> {
        self.record(StoreOp::Get(key.clone()));
        self.inner.get(kind, key).await
    }

    async fn create(&self, obj: &Object) -> Result<Object> {
        self.record(StoreOp::Create(obj.key()));
        self.inner.create(obj).await
    }

    async fn update(&self, obj: &Object) -> Result<Object> {
        self.record(StoreOp::Update(obj.key()));
        self.inner.update(obj).await
    }

    async fn delete(&self, obj: &Object) -> Result<()> {
        self.record(StoreOp::Delete(obj.key()));
        self.inner.delete(obj).await
    }

    async fn update_status(&self, obj: &Object) -> Result<Object> {
        self.record(StoreOp::UpdateStatus(obj.key()));
        self.inner.update_status(obj).await
    }
}

//! The store-client capability surface the engine executes actions against.

use async_trait::async_trait;

use crate::error::Result;
use crate::object::{Object, ObjectKey};

/// Capability set of a remote, versioned, namespaced object store.
///
/// Every call is a real round trip: there is no caching layer here, and
/// concurrent writers are arbitrated by the store's optimistic-concurrency
/// mechanism (surfaced as [`StoreError::Conflict`](crate::StoreError)).
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Fetch an object by kind and namespaced key.
    async fn get(&self, kind: &str, key: &ObjectKey) -> Result<Object>;

    /// Submit a new object. Returns the stored copy with uid and resource
    /// version assigned.
    async fn create(&self, obj: &Object) -> Result<Object>;

    /// Full replacement of an existing object. Returns the stored copy with
    /// a bumped resource version.
    async fn update(&self, obj: &Object) -> Result<Object>;

    /// Remove an object.
    async fn delete(&self, obj: &Object) -> Result<()>;

    /// Write only the status subresource of an existing object.
    async fn update_status(&self, obj: &Object) -> Result<Object>;
}

/// A wrapper that adds tracing to a store client.
pub struct TracingStore<S: StoreClient> {
    inner: S,
}

impl<S: StoreClient> TracingStore<S> {
    /// Create a new tracing store.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: StoreClient> StoreClient for TracingStore<S> {
    async fn get(&self, kind: &str, key: &ObjectKey) -> Result<Object> {
        tracing::debug!(kind, key = %key, "Getting object");
        let result = self.inner.get(kind, key).await;
        if let Err(ref err) = result {
            tracing::debug!(kind, key = %key, error = %err, "Get failed");
        }
        result
    }

    async fn create(&self, obj: &Object) -> Result<Object> {
        tracing::debug!(kind = %obj.kind, key = %obj.key(), "Creating object");
        self.inner.create(obj).await
    }

    async fn update(&self, obj: &Object) -> Result<Object> {
        tracing::debug!(kind = %obj.kind, key = %obj.key(), "Updating object");
        self.inner.update(obj).await
    }

    async fn delete(&self, obj: &Object) -> Result<()> {
        tracing::debug!(kind = %obj.kind, key = %obj.key(), "Deleting object");
        self.inner.delete(obj).await
    }

    async fn update_status(&self, obj: &Object) -> Result<Object> {
        tracing::debug!(kind = %obj.kind, key = %obj.key(), "Updating object status");
        self.inner.update_status(obj).await
    }
}

//! Store client.
//!
//! [`StoreClient`] owns a transport and the object cache shared by every
//! query issued through it.

use crate::core::{ObjectCache, Query};
use crate::error::Result;
use crate::store::results::ResultSet;
use crate::transport::Transport;
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use uuid::Uuid;

#[cfg(feature = "http")]
use crate::config::ClientConfig;
#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// Tracing target for client operations.
pub const TRACING_TARGET: &str = "rengu_store::store::client";

/// Client for a Rengu store.
///
/// Objects seen by any query are kept in a cache for the lifetime of the
/// client and can be looked up with [`get`](Self::get), including while a
/// query is still being iterated. The cache is single-threaded; share a
/// client across threads only behind external synchronization.
pub struct StoreClient<T> {
    transport: T,
    cache: RefCell<ObjectCache>,
}

impl<T: Transport> StoreClient<T> {
    /// Creates a client with an empty cache.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: RefCell::new(ObjectCache::new()),
        }
    }

    /// Borrows the transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Records a query. Nothing is sent until the results are iterated.
    pub const fn query(&self, query: Query) -> ResultSet<'_, T> {
        ResultSet::new(self, query)
    }

    /// Looks up an object seen by a query on this client.
    pub fn get(&self, id: &Uuid) -> Option<Value> {
        self.cache.borrow().get(id).cloned()
    }

    /// Number of cached objects.
    pub fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Identifiers of all cached objects, in no particular order.
    pub fn cached_ids(&self) -> Vec<Uuid> {
        self.cache.borrow().ids().copied().collect()
    }

    /// Stores an object and returns the identifier assigned by the store.
    ///
    /// The object is not added to the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the store
    /// rejects the object or cannot be reached.
    pub fn save(&self, object: &Value) -> Result<Uuid> {
        let id = self.transport.save(object)?;
        tracing::debug!(target: TRACING_TARGET, %id, "object saved");
        Ok(id)
    }

    /// Deletes an object from the store. Returns `false` if the store did
    /// not delete it.
    ///
    /// Cached copies are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the store
    /// cannot be reached.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.transport.delete(id)?;
        tracing::debug!(target: TRACING_TARGET, %id, deleted, "delete requested");
        Ok(deleted)
    }

    pub(crate) fn cache_object(&self, id: Uuid, object: Value) {
        if self.cache.borrow_mut().insert(id, object).is_some() {
            tracing::trace!(target: TRACING_TARGET, %id, "replaced cached object");
        }
    }
}

#[cfg(feature = "http")]
impl StoreClient<HttpTransport> {
    /// Creates a client for an HTTP store.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> fmt::Debug for StoreClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreClient")
            .field("store", &self.transport.location())
            .field("cached", &self.cached_len())
            .finish_non_exhaustive()
    }
}

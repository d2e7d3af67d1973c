//! In-process transport.
//!
//! [`MemoryTransport`] keeps objects in memory and serves every stored
//! object for any query, serialized back to back and cut into fixed-size
//! chunks. It is meant for tests and offline use; filter terms are recorded
//! but not evaluated.

use crate::core::{ID_FIELD, Query, object_id};
use crate::error::TransportError;
use crate::io::ChunkResult;
use crate::transport::Transport;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use uuid::Uuid;

/// Default chunk size for query responses.
pub const DEFAULT_MEMORY_CHUNK_SIZE: usize = 64;

/// Chunk source handed out by [`MemoryTransport::query`].
pub type MemoryChunks = std::vec::IntoIter<ChunkResult>;

/// Transport backed by an in-memory object list.
///
/// # Examples
///
/// ```
/// use rengu_store::transport::{MemoryTransport, Transport};
/// use serde_json::json;
///
/// let transport = MemoryTransport::new().with_chunk_size(4);
/// let id = transport.save(&json!({"title": "Zhuangzi"})).unwrap();
/// assert_eq!(transport.len(), 1);
/// assert!(transport.delete(id).unwrap());
/// assert!(transport.is_empty());
/// ```
#[derive(Debug)]
pub struct MemoryTransport {
    /// Stored objects, in insertion order.
    objects: RefCell<Vec<(Uuid, Value)>>,
    /// Raw response body served instead of the stored objects.
    body: Option<Vec<u8>>,
    /// Size of each response chunk.
    chunk_size: usize,
    /// Number of chunks after which a transport failure is injected.
    fail_after: Option<usize>,
    /// Queries received so far.
    queries: RefCell<Vec<Query>>,
    /// Number of chunks handed out across all queries.
    chunks_served: Cell<usize>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            objects: RefCell::new(Vec::new()),
            body: None,
            chunk_size: DEFAULT_MEMORY_CHUNK_SIZE,
            fail_after: None,
            queries: RefCell::new(Vec::new()),
            chunks_served: Cell::new(0),
        }
    }

    /// Creates a transport holding `objects`.
    ///
    /// # Errors
    ///
    /// Returns an error if an object has no valid `ID`.
    pub fn with_objects<I>(objects: I) -> Result<Self, TransportError>
    where
        I: IntoIterator<Item = Value>,
    {
        let stored = objects
            .into_iter()
            .map(|object| {
                object_id(&object, 0)
                    .map(|id| (id, object))
                    .map_err(|e| TransportError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let transport = Self::new();
        *transport.objects.borrow_mut() = stored;
        Ok(transport)
    }

    /// Serves `body` verbatim for every query instead of the stored objects.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the response chunk size. Zero is treated as one.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Ends every response with a transport error after `chunks` chunks.
    #[must_use]
    pub const fn with_failure_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Returns `true` if no objects are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.borrow().is_empty()
    }

    /// Queries received so far, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<Query> {
        self.queries.borrow().clone()
    }

    /// Number of chunks handed out across all queries.
    #[must_use]
    pub fn chunks_served(&self) -> usize {
        self.chunks_served.get()
    }

    /// Response body for a query.
    fn response_body(&self) -> Result<Vec<u8>, TransportError> {
        if let Some(body) = &self.body {
            return Ok(body.clone());
        }
        let mut body = Vec::new();
        for (_, object) in self.objects.borrow().iter() {
            serde_json::to_writer(&mut body, object)?;
            body.push(b'\n');
        }
        Ok(body)
    }
}

impl Transport for MemoryTransport {
    type Chunks = MemoryChunks;

    fn query(&self, query: &Query) -> Result<Self::Chunks, TransportError> {
        self.queries.borrow_mut().push(query.clone());

        let body = self.response_body()?;
        let mut chunks: Vec<ChunkResult> = body
            .chunks(self.chunk_size)
            .map(|c| Ok(c.to_vec()))
            .collect();
        if let Some(limit) = self.fail_after {
            chunks.truncate(limit);
            chunks.push(Err(TransportError::Body("connection reset".to_string())));
        }

        self.chunks_served
            .set(self.chunks_served.get() + chunks.len());
        Ok(chunks.into_iter())
    }

    fn save(&self, object: &Value) -> Result<Uuid, TransportError> {
        let mut object = object.clone();
        let fields = object
            .as_object_mut()
            .ok_or_else(|| TransportError::Decode("object must be a JSON object".to_string()))?;

        let id = match fields.get(ID_FIELD).and_then(Value::as_str) {
            Some(raw) => Uuid::try_parse(raw).map_err(|e| TransportError::Decode(e.to_string()))?,
            None => {
                let id = Uuid::new_v4();
                fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                id
            }
        };

        let mut objects = self.objects.borrow_mut();
        match objects.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = object,
            None => objects.push((id, object)),
        }
        Ok(id)
    }

    fn delete(&self, id: Uuid) -> Result<bool, TransportError> {
        let mut objects = self.objects.borrow_mut();
        let before = objects.len();
        objects.retain(|(existing, _)| *existing != id);
        Ok(objects.len() != before)
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ID: &str = "b2e2a0c4-5d6e-4f70-9a1b-2c3d4e5f6a7b";

    fn collect(chunks: MemoryChunks) -> Vec<u8> {
        chunks.flat_map(|c| c.unwrap()).collect()
    }

    #[test]
    fn test_query_serves_all_objects_in_chunks() {
        let transport = MemoryTransport::with_objects([json!({"ID": ID, "v": 1})])
            .unwrap()
            .with_chunk_size(5);
        let chunks = transport.query(&Query::new(["anything"])).unwrap();
        assert!(chunks.as_slice().iter().all(|c| c.as_ref().unwrap().len() <= 5));

        let body = collect(chunks);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["v"], 1);
        assert_eq!(transport.queries(), vec![Query::new(["anything"])]);
    }

    #[test]
    fn test_with_objects_requires_id() {
        let err = MemoryTransport::with_objects([json!({"v": 1})]).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn test_raw_body() {
        let transport = MemoryTransport::new().with_body("  [1] ");
        assert_eq!(collect(transport.query(&Query::default()).unwrap()), b"  [1] ");
    }

    #[test]
    fn test_injected_failure() {
        let transport = MemoryTransport::new()
            .with_body("0123456789")
            .with_chunk_size(2)
            .with_failure_after(3);
        let chunks: Vec<ChunkResult> = transport.query(&Query::default()).unwrap().collect();
        assert_eq!(chunks.len(), 4);
        assert!(chunks[2].is_ok());
        assert!(matches!(chunks[3], Err(TransportError::Body(_))));
        assert_eq!(transport.chunks_served(), 4);
    }

    #[test]
    fn test_save_assigns_id() {
        let transport = MemoryTransport::new();
        let id = transport.save(&json!({"title": "Analects"})).unwrap();

        let body = collect(transport.query(&Query::default()).unwrap());
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value[ID_FIELD], id.to_string());
    }

    #[test]
    fn test_save_keeps_existing_id_and_replaces() {
        let transport = MemoryTransport::new();
        let id = transport.save(&json!({"ID": ID, "v": 1})).unwrap();
        assert_eq!(id.to_string(), ID);
        transport.save(&json!({"ID": ID, "v": 2})).unwrap();
        assert_eq!(transport.len(), 1);
    }

    #[test]
    fn test_save_rejects_non_objects() {
        let transport = MemoryTransport::new();
        assert!(transport.save(&json!([1, 2])).is_err());
        assert!(transport.save(&json!({"ID": "nope"})).is_err());
    }

    #[test]
    fn test_delete() {
        let transport = MemoryTransport::with_objects([json!({"ID": ID})]).unwrap();
        let id = Uuid::try_parse(ID).unwrap();
        assert!(transport.delete(id).unwrap());
        assert!(!transport.delete(id).unwrap());
        assert_eq!(transport.location(), "memory");
    }
}

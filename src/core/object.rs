//! Rengu objects and the client-side object cache.
//!
//! Objects are JSON documents carrying a top-level `ID` field with a UUID.
//! The cache maps those identifiers to the decoded documents and is never
//! evicted.

use crate::error::DocumentError;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Name of the identifier field every object carries.
pub const ID_FIELD: &str = "ID";

/// Extracts and parses the `ID` field of a decoded object.
///
/// `offset` is the stream offset of the document, used in error reports.
///
/// # Errors
///
/// Returns [`DocumentError::NotAnObject`], [`DocumentError::MissingId`] or
/// [`DocumentError::InvalidId`].
pub fn object_id(object: &Value, offset: usize) -> Result<Uuid, DocumentError> {
    let fields = object
        .as_object()
        .ok_or(DocumentError::NotAnObject { offset })?;
    let raw = fields
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or(DocumentError::MissingId { offset })?;
    Uuid::try_parse(raw).map_err(|e| DocumentError::InvalidId {
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Parses one document span into its identifier and object.
///
/// # Errors
///
/// Returns [`DocumentError::InvalidJson`] if the bytes are not JSON, and the
/// errors of [`object_id`] otherwise.
///
/// # Examples
///
/// ```
/// use rengu_store::core::decode_object;
///
/// let bytes = br#"{"ID":"6f1c2d3e-4a5b-4c6d-8e7f-0a1b2c3d4e5f","v":1}"#;
/// let (id, object) = decode_object(bytes, 0).unwrap();
/// assert_eq!(id.to_string(), "6f1c2d3e-4a5b-4c6d-8e7f-0a1b2c3d4e5f");
/// assert_eq!(object["v"], 1);
/// ```
pub fn decode_object(bytes: &[u8], offset: usize) -> Result<(Uuid, Value), DocumentError> {
    let object: Value = serde_json::from_slice(bytes).map_err(|e| DocumentError::InvalidJson {
        offset,
        reason: e.to_string(),
    })?;
    let id = object_id(&object, offset)?;
    Ok((id, object))
}

/// Unbounded map from identifier to decoded object.
///
/// Inserting an identifier that is already present replaces the stored
/// object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectCache {
    objects: HashMap<Uuid, Value>,
}

impl ObjectCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `object` under `id`, returning the object it replaced.
    pub fn insert(&mut self, id: Uuid, object: Value) -> Option<Value> {
        self.objects.insert(id, object)
    }

    /// Looks up an object.
    #[must_use]
    pub fn get(&self, id: &Uuid) -> Option<&Value> {
        self.objects.get(id)
    }

    /// Returns `true` if `id` has been cached.
    #[must_use]
    pub fn contains(&self, id: &Uuid) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of cached objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if nothing has been cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Cached identifiers, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &Uuid> {
        self.objects.keys()
    }
}

//! Transport layer for rengu-store.
//!
//! The [`Transport`] trait is the seam between the streaming query
//! pipeline and whatever carries bytes to and from the store. Query
//! responses are delivered as an ordered source of byte chunks; saves and
//! deletes are single request/response calls.

#[cfg(feature = "http")]
pub mod http;
pub mod memory;

#[cfg(feature = "http")]
pub use http::{HttpChunks, HttpTransport};
pub use memory::MemoryTransport;

use crate::core::Query;
use crate::error::TransportError;
use crate::io::ChunkResult;
use serde_json::Value;
use uuid::Uuid;

/// A connection to a Rengu store.
///
/// Implementations handle connection management, timeouts, and any
/// authentication; the query pipeline only consumes the chunk source.
pub trait Transport {
    /// Chunk source returned for a query.
    ///
    /// May yield an error at any point; the pipeline treats it as fatal
    /// for that query.
    type Chunks: Iterator<Item = ChunkResult>;

    /// Starts a streaming query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or is rejected.
    fn query(&self, query: &Query) -> Result<Self::Chunks, TransportError>;

    /// Stores an object, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no
    /// identifier.
    fn save(&self, object: &Value) -> Result<Uuid, TransportError>;

    /// Deletes an object. Returns `false` if the store refused or did not
    /// know the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent.
    fn delete(&self, id: Uuid) -> Result<bool, TransportError>;

    /// Human-readable location of the store.
    fn location(&self) -> String;
}

//! # rengu-store
//!
//! Streaming client for Rengu object stores.
//!
//! A Rengu store answers queries with a stream of concatenated JSON
//! objects. This crate consumes that stream incrementally: bytes are
//! pulled from the transport only as far as needed to find the next
//! complete document, each document is cached by its `ID`, and the
//! identifier is handed to the caller before the rest of the response
//! has arrived.
//!
//! ## Features
//!
//! - **Buffered streams**: seekable, lazily filled buffer over chunked sources
//! - **Document splitting**: incremental boundary detection for concatenated JSON
//! - **Lazy queries**: nothing is sent until results are iterated
//! - **Object cache**: every object seen by a query is available by identifier
//!
//! ## Example
//!
//! ```
//! use rengu_store::{MemoryTransport, Query, StoreClient};
//! use serde_json::json;
//!
//! let transport = MemoryTransport::with_objects([
//!     json!({"ID": "b2e2a0c4-5d6e-4f70-9a1b-2c3d4e5f6a7b", "title": "Daodejing"}),
//! ])
//! .unwrap();
//! let client = StoreClient::new(transport);
//!
//! for id in &client.query(Query::new(["title"])) {
//!     let id = id.unwrap();
//!     assert_eq!(client.get(&id).unwrap()["title"], "Daodejing");
//! }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod store;
pub mod transport;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{ObjectCache, Operator, Query};

// Re-export streaming types
pub use io::{BufferedByteStream, DocumentSpan, DocumentSplitter, ReadSize};

// Re-export client types
pub use config::ClientConfig;
pub use store::{IterState, QueryResultIterator, ResultSet, StoreClient};

// Re-export transport types
#[cfg(feature = "http")]
pub use transport::HttpTransport;
pub use transport::{MemoryTransport, Transport};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

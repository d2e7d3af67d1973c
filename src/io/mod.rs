//! Streaming ingestion for rengu-store.
//!
//! Provides a seekable buffer over chunked byte sources, an incremental
//! JSON value boundary scanner, and a splitter that turns a stream of
//! concatenated JSON documents into individual spans.

pub mod scanner;
pub mod splitter;
pub mod stream;

pub use scanner::{DocumentScanner, Finish, Scan, is_separator};
pub use splitter::{DocumentSpan, DocumentSplitter};
pub use stream::{BufferedByteStream, ChunkResult, ReadSize};

//! Store client and lazy query results.
//!
//! A [`StoreClient`] issues queries through a
//! [`Transport`](crate::transport::Transport) and caches every object it
//! sees. Query results are produced one identifier at a time as the
//! response streams in.

pub mod client;
pub mod results;

pub use client::StoreClient;
pub use results::{IterState, QueryResultIterator, ResultSet};

//! Core domain models for rengu-store.
//!
//! Queries, objects, and the object cache. These are pure domain models
//! with no I/O dependencies.

pub mod object;
pub mod query;

pub use object::{ID_FIELD, ObjectCache, decode_object, object_id};
pub use query::{Operator, Query};

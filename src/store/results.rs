//! Lazy query results.
//!
//! A [`ResultSet`] records a query without touching the network. Each call
//! to [`ResultSet::iter`] starts an independent pass: the first step sends
//! the request, and every following step decodes one document, caches it on
//! the owning [`StoreClient`], and yields its identifier.

use crate::core::{Query, decode_object};
use crate::error::Result;
use crate::io::{BufferedByteStream, DocumentSplitter};
use crate::store::client::StoreClient;
use crate::transport::Transport;
use std::fmt;
use uuid::Uuid;

/// Tracing target for result iteration.
pub const TRACING_TARGET: &str = "rengu_store::store::results";

/// An unstarted query bound to a client.
///
/// # Examples
///
/// ```
/// use rengu_store::core::Query;
/// use rengu_store::store::StoreClient;
/// use rengu_store::transport::MemoryTransport;
/// use serde_json::json;
///
/// let transport = MemoryTransport::with_objects([
///     json!({"ID": "a4f1e0c2-1b2c-4d3e-8f40-5a6b7c8d9e0f", "v": 1}),
/// ])
/// .unwrap();
/// let client = StoreClient::new(transport);
///
/// let results = client.query(Query::new(["v"]));
/// let ids: Vec<_> = results.iter().collect::<Result<_, _>>().unwrap();
/// assert_eq!(ids.len(), 1);
/// assert_eq!(client.get(&ids[0]).unwrap()["v"], 1);
/// ```
pub struct ResultSet<'a, T> {
    client: &'a StoreClient<T>,
    query: Query,
}

impl<'a, T: Transport> ResultSet<'a, T> {
    pub(crate) const fn new(client: &'a StoreClient<T>, query: Query) -> Self {
        Self { client, query }
    }

    /// Returns the recorded query.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Starts a fresh pass over the results.
    ///
    /// Each pass sends its own request and yields every result again.
    #[must_use]
    pub fn iter(&self) -> QueryResultIterator<'a, T> {
        QueryResultIterator::new(self.client, self.query.clone())
    }
}

impl<T> fmt::Display for ResultSet<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.query, f)
    }
}

impl<T> fmt::Debug for ResultSet<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultSet")
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Transport> IntoIterator for &ResultSet<'a, T> {
    type Item = Result<Uuid>;
    type IntoIter = QueryResultIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Transport> IntoIterator for ResultSet<'a, T> {
    type Item = Result<Uuid>;
    type IntoIter = QueryResultIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        QueryResultIterator::new(self.client, self.query)
    }
}

/// Observable state of a [`QueryResultIterator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterState {
    /// No request has been sent yet.
    Unstarted,
    /// The response is being consumed.
    Streaming,
    /// The stream ended normally.
    Done,
    /// A transport or document error ended the pass.
    Failed,
}

enum State<C> {
    Unstarted,
    Streaming(DocumentSplitter<C>),
    Done,
    Failed,
}

/// One pass over a query's results, yielding object identifiers.
///
/// Yields `Ok(id)` for every document, in stream order, after the object
/// has been stored in the client's cache. Normal end of the stream is
/// `None`; a malformed document or transport failure is yielded once as
/// `Err` and the iterator then returns `None`. Dropping the iterator
/// releases the underlying response.
pub struct QueryResultIterator<'a, T: Transport> {
    client: &'a StoreClient<T>,
    query: Query,
    state: State<T::Chunks>,
    yielded: usize,
}

impl<'a, T: Transport> QueryResultIterator<'a, T> {
    const fn new(client: &'a StoreClient<T>, query: Query) -> Self {
        Self {
            client,
            query,
            state: State::Unstarted,
            yielded: 0,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> IterState {
        match self.state {
            State::Unstarted => IterState::Unstarted,
            State::Streaming(_) => IterState::Streaming,
            State::Done => IterState::Done,
            State::Failed => IterState::Failed,
        }
    }

    /// Number of identifiers yielded by this pass.
    #[must_use]
    pub const fn yielded(&self) -> usize {
        self.yielded
    }

    /// Returns the query being iterated.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    fn start(&mut self) -> Result<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            store = %self.client.transport().location(),
            query = %self.query,
            "starting query"
        );
        let chunks = self.client.transport().query(&self.query)?;
        self.state = State::Streaming(DocumentSplitter::new(BufferedByteStream::new(chunks)));
        Ok(())
    }

    fn step(&mut self) -> Result<Option<Uuid>> {
        if matches!(self.state, State::Unstarted) {
            self.start()?;
        }
        let State::Streaming(splitter) = &mut self.state else {
            return Ok(None);
        };

        let Some(span) = splitter.next_span()? else {
            tracing::debug!(
                target: TRACING_TARGET,
                query = %self.query,
                documents = self.yielded,
                bytes = splitter.stream().len(),
                chunks = splitter.stream().chunks_pulled(),
                "query complete"
            );
            self.state = State::Done;
            return Ok(None);
        };

        let (id, object) = decode_object(span.as_bytes(), span.offset())?;
        self.client.cache_object(id, object);
        self.yielded += 1;
        tracing::trace!(target: TRACING_TARGET, %id, offset = span.offset(), "document cached");
        Ok(Some(id))
    }
}

impl<T: Transport> Iterator for QueryResultIterator<'_, T> {
    type Item = Result<Uuid>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(id) => id.map(Ok),
            Err(err) => {
                self.state = State::Failed;
                Some(Err(err))
            }
        }
    }
}

impl<T: Transport> std::iter::FusedIterator for QueryResultIterator<'_, T> {}

impl<T: Transport> fmt::Debug for QueryResultIterator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResultIterator")
            .field("query", &self.query)
            .field("state", &self.state())
            .field("yielded", &self.yielded)
            .finish_non_exhaustive()
    }
}

//! Splitting a byte stream of concatenated JSON values into documents.
//!
//! [`DocumentSplitter`] drives a [`BufferedByteStream`] with bounded reads
//! and a [`DocumentScanner`], yielding one [`DocumentSpan`] per top-level
//! value as soon as its last byte has arrived.

use crate::error::{DocumentError, Result};
use crate::io::scanner::{DocumentScanner, Finish, Scan};
use crate::io::stream::{BufferedByteStream, ChunkResult, ReadSize};
use serde::de::IgnoredAny;
use std::io::SeekFrom;

/// The exact bytes of one top-level JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSpan {
    /// Stream offset of the first byte.
    offset: usize,
    /// Value bytes, without surrounding separators.
    bytes: Vec<u8>,
}

impl DocumentSpan {
    /// Creates a span from its stream offset and bytes.
    #[must_use]
    pub const fn new(offset: usize, bytes: Vec<u8>) -> Self {
        Self { offset, bytes }
    }

    /// Stream offset of the first byte.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Stream offset one past the last byte.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.bytes.len()
    }

    /// Length of the span in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` for an empty span.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrows the span bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the span, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Lazy, forward-only sequence of document spans over a byte stream.
///
/// Each advance reads only what is needed: bytes already buffered past the
/// cursor, otherwise a single further byte (which pulls one chunk). A value
/// that ends mid-slice rewinds the cursor to the byte after it, so no bytes
/// are skipped between documents.
///
/// The sequence ends after the stream is exhausted with only separators
/// left. A value cut off by end of stream, a stray byte at the top level, or
/// a bare token that is not a JSON number or literal is returned as an error
/// and ends the sequence; partial spans are never emitted.
///
/// # Examples
///
/// ```
/// use rengu_store::io::{BufferedByteStream, DocumentSplitter};
///
/// let chunks = vec![Ok(br#"{"a":1} [2"#.to_vec()), Ok(b",3] 4".to_vec())];
/// let splitter = DocumentSplitter::new(BufferedByteStream::new(chunks.into_iter()));
/// let docs: Vec<Vec<u8>> = splitter
///     .map(|span| span.map(|s| s.into_bytes()))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(docs, vec![br#"{"a":1}"#.to_vec(), b"[2,3]".to_vec(), b"4".to_vec()]);
/// ```
#[derive(Debug)]
pub struct DocumentSplitter<S> {
    stream: BufferedByteStream<S>,
    scanner: DocumentScanner,
    finished: bool,
}

impl<S> DocumentSplitter<S>
where
    S: Iterator<Item = ChunkResult>,
{
    /// Creates a splitter reading from the stream's current cursor.
    pub const fn new(stream: BufferedByteStream<S>) -> Self {
        Self {
            stream,
            scanner: DocumentScanner::new(),
            finished: false,
        }
    }

    /// Borrows the underlying stream.
    pub const fn stream(&self) -> &BufferedByteStream<S> {
        &self.stream
    }

    /// Returns `true` once the sequence has ended, normally or by error.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advances to the next document.
    ///
    /// Returns `Ok(None)` at the normal end of the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Truncated`] or
    /// [`DocumentError::UnexpectedByte`] for input that can never form a
    /// complete value, and propagates transport failures. Every error ends
    /// the sequence.
    pub fn next_span(&mut self) -> Result<Option<DocumentSpan>> {
        if self.finished {
            return Ok(None);
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<DocumentSpan>> {
        loop {
            let offset = self.stream.tell();
            let want = self.stream.available().max(1);
            let bytes = self.stream.read_slice(ReadSize::UpTo(want))?;
            if bytes.is_empty() {
                return self.finish_at_end();
            }

            match self.scanner.feed(bytes, offset) {
                Scan::NeedMore => {}
                Scan::Complete { start, end } => {
                    let terminator = bytes.get(end - offset).copied();
                    let span = self.take_span(start, end)?;
                    return check_scalar(span, terminator).map(Some);
                }
                Scan::Unexpected { byte, offset } => {
                    return Err(DocumentError::UnexpectedByte { byte, offset }.into());
                }
            }
        }
    }

    fn finish_at_end(&mut self) -> Result<Option<DocumentSpan>> {
        match self.scanner.finish() {
            Finish::Idle => Ok(None),
            Finish::Complete { start } => {
                let end = self.stream.len();
                let span = self.take_span(start, end)?;
                check_scalar(span, None).map(Some)
            }
            Finish::Truncated { start } => Err(DocumentError::Truncated { offset: start }.into()),
        }
    }

    /// Re-reads `start..end` from the accumulator, leaving the cursor at `end`.
    fn take_span(&mut self, start: usize, end: usize) -> Result<DocumentSpan> {
        self.stream.seek(SeekFrom::Start(start as u64))?;
        let bytes = self.stream.read(ReadSize::UpTo(end - start))?;
        Ok(DocumentSpan::new(start, bytes))
    }
}

/// Rejects a bare top-level token unless it is a whole number or literal.
///
/// `terminator` is the byte that ended the token, or `None` at end of
/// stream.
fn check_scalar(span: DocumentSpan, terminator: Option<u8>) -> Result<DocumentSpan> {
    let bytes = span.as_bytes();
    if matches!(bytes.first(), Some(b'{' | b'[' | b'"')) {
        return Ok(span);
    }
    let Err(err) = serde_json::from_slice::<IgnoredAny>(bytes) else {
        return Ok(span);
    };

    let error = match (err.is_eof(), terminator) {
        (true, None) => DocumentError::Truncated {
            offset: span.offset(),
        },
        (true, Some(byte)) => DocumentError::UnexpectedByte {
            byte,
            offset: span.end(),
        },
        (false, _) => {
            let index = err.column().saturating_sub(1).min(bytes.len().saturating_sub(1));
            DocumentError::UnexpectedByte {
                byte: bytes.get(index).copied().unwrap_or_default(),
                offset: span.offset() + index,
            }
        }
    };
    Err(error.into())
}

impl<S> Iterator for DocumentSplitter<S>
where
    S: Iterator<Item = ChunkResult>,
{
    type Item = Result<DocumentSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_span().transpose()
    }
}

impl<S> std::iter::FusedIterator for DocumentSplitter<S> where S: Iterator<Item = ChunkResult> {}

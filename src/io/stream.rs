//! Position-addressable buffering over a chunked byte source.
//!
//! [`BufferedByteStream`] wraps a pull-based source of byte chunks (for
//! example an HTTP response body) and exposes `read`/`seek`/`tell` over an
//! append-only accumulator. Chunks are only pulled when a read or seek needs
//! bytes that have not arrived yet, so a caller can probe forward without
//! draining the whole source.

use crate::error::{Result, StreamError, TransportError};
use std::io::SeekFrom;

/// Tracing target for buffered stream operations.
pub const TRACING_TARGET: &str = "rengu_store::io::stream";

/// One delivery from a chunk source.
pub type ChunkResult = std::result::Result<Vec<u8>, TransportError>;

/// How many bytes a [`BufferedByteStream::read`] should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSize {
    /// At most `n` bytes; fewer only at end of stream.
    UpTo(usize),
    /// Everything up to the end of the stream, materializing the source.
    ToEnd,
}

/// Growable, seekable buffer over a chunk source.
///
/// The accumulator never shrinks and the cursor never exceeds its length.
/// Once the source reports exhaustion the stream is sealed and the
/// accumulator holds the complete content.
///
/// # Examples
///
/// ```
/// use rengu_store::io::{BufferedByteStream, ReadSize};
///
/// let chunks = vec![Ok(b"hello ".to_vec()), Ok(b"world".to_vec())];
/// let mut stream = BufferedByteStream::new(chunks.into_iter());
///
/// assert_eq!(stream.read(ReadSize::UpTo(5)).unwrap(), b"hello");
/// assert_eq!(stream.chunks_pulled(), 1);
/// assert_eq!(stream.read(ReadSize::ToEnd).unwrap(), b" world");
/// assert!(stream.is_sealed());
/// ```
#[derive(Debug)]
pub struct BufferedByteStream<S> {
    /// Chunk source; not polled again once sealed.
    source: S,
    /// Every byte received so far.
    buffer: Vec<u8>,
    /// Read position within `buffer`.
    cursor: usize,
    /// Whether the source has reported exhaustion.
    sealed: bool,
    /// Number of chunks received from the source.
    chunks_pulled: usize,
}

impl<S> BufferedByteStream<S>
where
    S: Iterator<Item = ChunkResult>,
{
    /// Wraps a chunk source. Nothing is pulled until the first read.
    pub const fn new(source: S) -> Self {
        Self {
            source,
            buffer: Vec::new(),
            cursor: 0,
            sealed: false,
            chunks_pulled: 0,
        }
    }

    /// Returns the current cursor position.
    #[must_use]
    pub const fn tell(&self) -> usize {
        self.cursor
    }

    /// Returns the number of bytes accumulated so far.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if no bytes have been accumulated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns `true` once the source is exhausted.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Bytes already buffered past the cursor.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    /// Number of chunks received from the source.
    #[must_use]
    pub const fn chunks_pulled(&self) -> usize {
        self.chunks_pulled
    }

    /// Reads from the cursor, pulling chunks only as far as `size` needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`](crate::Error::Transport) if the source
    /// fails while more bytes are needed. The cursor is left unchanged and
    /// bytes received before the failure stay buffered.
    pub fn read(&mut self, size: ReadSize) -> Result<Vec<u8>> {
        self.read_slice(size).map(<[u8]>::to_vec)
    }

    /// Like [`read`](Self::read), but borrows the bytes from the accumulator.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_slice(&mut self, size: ReadSize) -> Result<&[u8]> {
        let start = self.cursor;
        let end = match size {
            ReadSize::ToEnd => {
                self.load_all()?;
                self.buffer.len()
            }
            ReadSize::UpTo(n) => {
                let goal = start.saturating_add(n);
                self.load_until(goal)?;
                goal.min(self.buffer.len())
            }
        };
        self.cursor = end;
        Ok(&self.buffer[start..end])
    }

    /// Moves the cursor and returns its new position.
    ///
    /// `SeekFrom::End` materializes the whole source first so that the end
    /// is known. `Start` and `Current` only pull chunks when the target lies
    /// beyond what has been buffered.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SeekOutOfRange`] for a target before the start
    /// or past the end of the exhausted source, and propagates transport
    /// failures. The cursor is unchanged on error.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<usize> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => as_i128(self.cursor) + i128::from(delta),
            SeekFrom::End(delta) => {
                self.load_all()?;
                as_i128(self.buffer.len()) + i128::from(delta)
            }
        };

        let out_of_range = |len: usize| StreamError::SeekOutOfRange { target, len };
        let target = usize::try_from(target).map_err(|_| out_of_range(self.buffer.len()))?;

        if target > self.buffer.len() {
            self.load_until(target)?;
            if target > self.buffer.len() {
                return Err(out_of_range(self.buffer.len()).into());
            }
        }

        self.cursor = target;
        Ok(target)
    }

    /// Pulls one chunk. Returns `false` once the source is exhausted.
    fn pull(&mut self) -> Result<bool> {
        if self.sealed {
            return Ok(false);
        }
        match self.source.next() {
            Some(Ok(chunk)) => {
                self.chunks_pulled += 1;
                self.buffer.extend_from_slice(&chunk);
                Ok(true)
            }
            Some(Err(err)) => Err(err.into()),
            None => {
                self.sealed = true;
                tracing::trace!(
                    target: TRACING_TARGET,
                    len = self.buffer.len(),
                    chunks = self.chunks_pulled,
                    "chunk source exhausted"
                );
                Ok(false)
            }
        }
    }

    fn load_until(&mut self, goal: usize) -> Result<()> {
        while self.buffer.len() < goal && self.pull()? {}
        Ok(())
    }

    fn load_all(&mut self) -> Result<()> {
        while self.pull()? {}
        Ok(())
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn as_i128(value: usize) -> i128 {
    value as i128
}

impl<S> std::io::Read for BufferedByteStream<S>
where
    S: Iterator<Item = ChunkResult>,
{
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let bytes = self.read_slice(ReadSize::UpTo(buf.len()))?;
        let n = bytes.len();
        buf[..n].copy_from_slice(bytes);
        Ok(n)
    }
}

impl<S> std::io::Seek for BufferedByteStream<S>
where
    S: Iterator<Item = ChunkResult>,
{
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let position = Self::seek(self, pos)?;
        Ok(position as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn stream_of(chunks: &[&[u8]]) -> BufferedByteStream<std::vec::IntoIter<ChunkResult>> {
        let chunks: Vec<ChunkResult> = chunks.iter().map(|c| Ok(c.to_vec())).collect();
        BufferedByteStream::new(chunks.into_iter())
    }

    #[test]
    fn test_new_stream_pulls_nothing() {
        let stream = stream_of(&[b"abc"]);
        assert_eq!(stream.tell(), 0);
        assert_eq!(stream.len(), 0);
        assert!(stream.is_empty());
        assert!(!stream.is_sealed());
        assert_eq!(stream.chunks_pulled(), 0);
    }

    #[test]
    fn test_bounded_read_pulls_only_what_it_needs() {
        let mut stream = stream_of(&[b"ab", b"cd", b"ef"]);

        assert_eq!(stream.read(ReadSize::UpTo(3)).unwrap(), b"abc");
        assert_eq!(stream.chunks_pulled(), 2);
        assert_eq!(stream.tell(), 3);
        assert_eq!(stream.available(), 1);

        assert_eq!(stream.read(ReadSize::UpTo(1)).unwrap(), b"d");
        assert_eq!(stream.chunks_pulled(), 2);
    }

    #[test]
    fn test_bounded_read_short_at_end() {
        let mut stream = stream_of(&[b"abc"]);
        assert_eq!(stream.read(ReadSize::UpTo(10)).unwrap(), b"abc");
        assert!(stream.is_sealed());
        assert!(stream.read(ReadSize::UpTo(10)).unwrap().is_empty());
        assert_eq!(stream.tell(), 3);
    }

    #[test]
    fn test_empty_source() {
        let mut stream = stream_of(&[]);
        assert!(stream.read(ReadSize::UpTo(4)).unwrap().is_empty());
        assert!(stream.is_sealed());
        assert!(stream.read(ReadSize::ToEnd).unwrap().is_empty());
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let mut stream = stream_of(&[b"", b"", b"x", b""]);
        assert_eq!(stream.read(ReadSize::UpTo(1)).unwrap(), b"x");
        assert_eq!(stream.chunks_pulled(), 3);
    }

    #[test]
    fn test_read_to_end_after_partial_read() {
        let mut stream = stream_of(&[b"abc", b"def", b"ghi"]);
        stream.read(ReadSize::UpTo(2)).unwrap();
        assert_eq!(stream.read(ReadSize::ToEnd).unwrap(), b"cdefghi");
        assert_eq!(stream.tell(), 9);
        assert!(stream.is_sealed());
    }

    #[test]
    fn test_seek_start_rereads_buffered_bytes() {
        let mut stream = stream_of(&[b"abcdef"]);
        stream.read(ReadSize::UpTo(4)).unwrap();
        assert_eq!(stream.seek(SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(stream.read(ReadSize::UpTo(2)).unwrap(), b"bc");
    }

    #[test]
    fn test_seek_current() {
        let mut stream = stream_of(&[b"abcdef"]);
        stream.read(ReadSize::UpTo(4)).unwrap();
        assert_eq!(stream.seek(SeekFrom::Current(-3)).unwrap(), 1);
        assert_eq!(stream.read(ReadSize::UpTo(1)).unwrap(), b"b");
    }

    #[test]
    fn test_seek_forward_pulls_until_target() {
        let mut stream = stream_of(&[b"ab", b"cd", b"ef"]);
        assert_eq!(stream.seek(SeekFrom::Start(3)).unwrap(), 3);
        assert_eq!(stream.chunks_pulled(), 2);
        assert!(!stream.is_sealed());
    }

    #[test]
    fn test_seek_end_materializes() {
        let mut stream = stream_of(&[b"ab", b"cd", b"ef"]);
        assert_eq!(stream.seek(SeekFrom::End(-2)).unwrap(), 4);
        assert!(stream.is_sealed());
        assert_eq!(stream.chunks_pulled(), 3);
        assert_eq!(stream.read(ReadSize::UpTo(2)).unwrap(), b"ef");
    }

    #[test]
    fn test_seek_before_start_is_rejected() {
        let mut stream = stream_of(&[b"abc"]);
        stream.read(ReadSize::UpTo(2)).unwrap();
        let err = stream.seek(SeekFrom::Current(-5)).unwrap_err();
        assert!(matches!(
            err,
            Error::Stream(StreamError::SeekOutOfRange { target: -3, .. })
        ));
        assert_eq!(stream.tell(), 2);
    }

    #[test]
    fn test_seek_past_sealed_end_is_rejected() {
        let mut stream = stream_of(&[b"abc"]);
        assert!(stream.seek(SeekFrom::Start(4)).is_err());
        assert!(stream.seek(SeekFrom::End(1)).is_err());
        assert_eq!(stream.tell(), 0);
        assert_eq!(stream.seek(SeekFrom::End(0)).unwrap(), 3);
    }

    #[test]
    fn test_transport_failure_keeps_cursor_and_bytes() {
        let chunks: Vec<ChunkResult> = vec![
            Ok(b"abc".to_vec()),
            Err(TransportError::Body("connection reset".to_string())),
        ];
        let mut stream = BufferedByteStream::new(chunks.into_iter());

        assert_eq!(stream.read(ReadSize::UpTo(2)).unwrap(), b"ab");
        let err = stream.read(ReadSize::UpTo(5)).unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Body(_))));
        assert_eq!(stream.tell(), 2);
        assert_eq!(stream.len(), 3);
    }

    #[test]
    fn test_io_traits() {
        use std::io::{Read, Seek};

        let mut stream = stream_of(&[b"hello ", b"world"]);
        let mut buf = [0u8; 4];
        assert_eq!(Read::read(&mut stream, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"hell");

        assert_eq!(Seek::seek(&mut stream, SeekFrom::End(-5)).unwrap(), 6);
        let mut rest = String::new();
        stream.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "world");

        let err = Seek::seek(&mut stream, SeekFrom::Current(-100)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}

//! Incremental detection of top-level JSON value boundaries.
//!
//! The scanner does not validate JSON. It only tracks enough state (nesting
//! depth, string and escape state) to tell where one top-level value ends,
//! so it can be fed arbitrary slices of a stream as they arrive. Full
//! validation happens when the span is decoded.

/// ASCII record separator, accepted between values for RFC 7464 streams.
const RECORD_SEPARATOR: u8 = 0x1E;

/// Returns `true` for bytes allowed between top-level values.
#[must_use]
pub const fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | RECORD_SEPARATOR)
}

/// Returns `true` for bytes that end a bare scalar.
const fn ends_scalar(byte: u8) -> bool {
    is_separator(byte) || matches!(byte, b'{' | b'}' | b'[' | b']' | b'"' | b',' | b':')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Between values, skipping separators.
    Between,
    /// Inside an object or array.
    Container {
        depth: usize,
        in_string: bool,
        escaped: bool,
    },
    /// Inside a top-level string.
    String { escaped: bool },
    /// Inside a bare number or literal.
    Scalar,
}

/// Result of feeding a slice to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scan {
    /// The slice was consumed without completing a value.
    NeedMore,
    /// A value spanning `start..end` (stream offsets) is complete.
    ///
    /// Bytes of the slice at or after `end` were not consumed.
    Complete {
        /// Offset of the first byte of the value.
        start: usize,
        /// Offset one past the last byte of the value.
        end: usize,
    },
    /// `byte` at `offset` cannot appear at the top level.
    Unexpected {
        /// The offending byte.
        byte: u8,
        /// Its stream offset.
        offset: usize,
    },
}

/// Outcome of reaching end of stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finish {
    /// Only separators remained.
    Idle,
    /// A bare scalar ran up to the end of stream.
    Complete {
        /// Offset of the first byte of the scalar.
        start: usize,
    },
    /// The stream ended inside a value starting at `start`.
    Truncated {
        /// Offset of the first byte of the unfinished value.
        start: usize,
    },
}

/// Byte-level state machine locating top-level JSON values.
///
/// # Examples
///
/// ```
/// use rengu_store::io::{DocumentScanner, Scan};
///
/// let mut scanner = DocumentScanner::new();
/// assert_eq!(scanner.feed(b"  {\"a\":", 0), Scan::NeedMore);
/// assert_eq!(scanner.feed(b"[1]} {", 7), Scan::Complete { start: 2, end: 11 });
/// ```
#[derive(Debug, Clone)]
pub struct DocumentScanner {
    mode: Mode,
    start: usize,
}

impl Default for DocumentScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentScanner {
    /// Creates a scanner positioned between values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: Mode::Between,
            start: 0,
        }
    }

    /// Returns `true` while a value has been started but not completed.
    #[must_use]
    pub const fn in_value(&self) -> bool {
        !matches!(self.mode, Mode::Between)
    }

    /// Feeds the next slice of the stream; `offset` is the stream offset of
    /// `bytes[0]`.
    ///
    /// After [`Scan::Complete`] the scanner is back between values and the
    /// unconsumed tail of `bytes` must be fed again.
    pub fn feed(&mut self, bytes: &[u8], offset: usize) -> Scan {
        for (i, &byte) in bytes.iter().enumerate() {
            let pos = offset + i;
            match self.mode {
                Mode::Between => match byte {
                    b if is_separator(b) => {}
                    b'{' | b'[' => self.begin(
                        pos,
                        Mode::Container {
                            depth: 1,
                            in_string: false,
                            escaped: false,
                        },
                    ),
                    b'"' => self.begin(pos, Mode::String { escaped: false }),
                    b'}' | b']' | b',' | b':' => return Scan::Unexpected { byte, offset: pos },
                    _ => self.begin(pos, Mode::Scalar),
                },
                Mode::Container {
                    depth,
                    in_string: true,
                    escaped,
                } => {
                    self.mode = Mode::Container {
                        depth,
                        in_string: escaped || byte != b'"',
                        escaped: !escaped && byte == b'\\',
                    };
                }
                Mode::Container { depth, .. } => match byte {
                    b'"' => {
                        self.mode = Mode::Container {
                            depth,
                            in_string: true,
                            escaped: false,
                        };
                    }
                    b'{' | b'[' => {
                        self.mode = Mode::Container {
                            depth: depth + 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    b'}' | b']' if depth == 1 => return self.complete(pos + 1),
                    b'}' | b']' => {
                        self.mode = Mode::Container {
                            depth: depth - 1,
                            in_string: false,
                            escaped: false,
                        };
                    }
                    _ => {}
                },
                Mode::String { escaped: true } => self.mode = Mode::String { escaped: false },
                Mode::String { escaped: false } => match byte {
                    b'\\' => self.mode = Mode::String { escaped: true },
                    b'"' => return self.complete(pos + 1),
                    _ => {}
                },
                Mode::Scalar if ends_scalar(byte) => return self.complete(pos),
                Mode::Scalar => {}
            }
        }
        Scan::NeedMore
    }

    /// Signals end of stream and resets the scanner.
    pub const fn finish(&mut self) -> Finish {
        let start = self.start;
        let outcome = match self.mode {
            Mode::Between => Finish::Idle,
            Mode::Scalar => Finish::Complete { start },
            Mode::Container { .. } | Mode::String { .. } => Finish::Truncated { start },
        };
        self.mode = Mode::Between;
        outcome
    }

    const fn begin(&mut self, pos: usize, mode: Mode) {
        self.start = pos;
        self.mode = mode;
    }

    const fn complete(&mut self, end: usize) -> Scan {
        self.mode = Mode::Between;
        Scan::Complete {
            start: self.start,
            end,
        }
    }
}

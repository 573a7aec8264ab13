//! Outgoing request representation and its replayable body.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fmt::Formatter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;

use bytes::Bytes;
use http::HeaderMap;
use http::Method;

/// An HTTP request under construction, built once per call.
///
/// Headers use case-sensitive storage with case-insensitive lookup (the
/// `http` crate's semantics); query keys are unique. Signing mutates the
/// headers in place to add the Date and Authorization values.
pub struct OutgoingRequest {
    /// HTTP method.
    pub method: Method,
    /// Request path, absolute or relative. Canonicalization enforces the
    /// leading `/`.
    pub path: String,
    /// Query parameters. `None` values are flag-style parameters that emit
    /// no `=` on the wire but still emit one in the signed string.
    pub query: BTreeMap<String, Option<String>>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request payload, if any.
    pub body: Option<Body>,
    /// Byte range requested from the target resource, if any.
    pub range: Option<(u64, u64)>,
}

impl OutgoingRequest {
    /// Create a request for the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: None,
            range: None,
        }
    }

    /// Add a query parameter with a value.
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.insert(key.into(), Some(value.into()));
    }

    /// Add a flag-style query parameter without a value.
    pub fn query_flag(&mut self, key: impl Into<String>) {
        self.query.insert(key.into(), None);
    }
}

impl Debug for OutgoingRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutgoingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("range", &self.range)
            .finish()
    }
}

/// Reader that can be rewound to an earlier position.
pub trait SeekableRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekableRead for T {}

/// Request payload.
///
/// Retrying a request replays its body, so each variant declares whether it
/// can be rewound to its original offset:
///
/// - [`Body::Bytes`] is trivially replayable.
/// - [`Body::Seekable`] records the stream position at construction and
///   seeks back to it before every retry.
/// - [`Body::Streaming`] cannot be replayed; the first transient failure of
///   such a request is terminal instead of retried.
pub enum Body {
    /// An in-memory payload.
    Bytes(Bytes),
    /// A seekable stream, replayed by rewinding to its starting offset.
    Seekable {
        /// The underlying reader.
        reader: Box<dyn SeekableRead>,
        /// Stream position when the body was constructed.
        start: u64,
    },
    /// A one-shot stream that cannot be replayed.
    Streaming(Box<dyn Read + Send>),
}

impl Body {
    /// Create a body from in-memory bytes.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Create a body from a seekable reader, recording its current position
    /// as the replay offset.
    pub fn seekable(mut reader: impl Read + Seek + Send + 'static) -> std::io::Result<Self> {
        let start = reader.stream_position()?;
        Ok(Self::Seekable {
            reader: Box::new(reader),
            start,
        })
    }

    /// Create a body from a one-shot stream.
    pub fn streaming(reader: impl Read + Send + 'static) -> Self {
        Self::Streaming(Box::new(reader))
    }

    /// Whether the body can be replayed for a retry.
    pub fn is_replayable(&self) -> bool {
        !matches!(self, Self::Streaming(_))
    }

    /// Rewind the body to its original offset.
    ///
    /// No-op for in-memory bytes. Fails with `Unsupported` for one-shot
    /// streams.
    pub fn rewind(&mut self) -> std::io::Result<()> {
        match self {
            Self::Bytes(_) => Ok(()),
            Self::Seekable { reader, start } => {
                reader.seek(SeekFrom::Start(*start))?;
                Ok(())
            }
            Self::Streaming(_) => Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "streaming body cannot be rewound",
            )),
        }
    }

    /// Payload size, when known up front.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Self::Bytes(b) => Some(b.len() as u64),
            _ => None,
        }
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Body::Bytes").field(&b.len()).finish(),
            Self::Seekable { start, .. } => {
                f.debug_struct("Body::Seekable").field("start", start).finish()
            }
            Self::Streaming(_) => f.write_str("Body::Streaming"),
        }
    }
}

//! Transport seam between the client core and the actual socket layer.

use std::fmt::Debug;

use bytes::Bytes;
use http::HeaderMap;
use http::StatusCode;

use crate::error::TransportError;
use crate::request::OutgoingRequest;

/// A response as delivered by the transport, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status line.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body bytes.
    pub body: Bytes,
}

impl RawResponse {
    /// Whether the status signals success.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Executes one signed request on the wire.
///
/// The core only ever hands over fully signed requests and interprets the
/// outcome; socket configuration, per-attempt timeouts and connection reuse
/// are the implementation's concern. A failure here means no status code was
/// obtained; responses with an error status are returned as [`RawResponse`]
/// and classified by the caller.
pub trait Transport: Debug + Send + Sync + 'static {
    /// Execute the request, consuming its body stream.
    fn execute(&self, req: &mut OutgoingRequest) -> Result<RawResponse, TransportError>;
}

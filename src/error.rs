//! Error taxonomy for signing and execution.
//!
//! Three kinds exist and the retry executor treats them differently:
//!
//! - [`ClientError`]: malformed input, missing credentials or configuration,
//!   local cryptographic failure. Raised before any network I/O and never
//!   retried.
//! - [`ServiceError`]: a well-formed signed request rejected by the remote
//!   service. Retried only for the whitelisted subset (500, 503 and the
//!   request-expired code).
//! - [`TransportError`]: failure before any status code was obtained. Always
//!   retried up to budget.
//!
//! Errors that exhaust the retry budget are re-raised as their original kind,
//! never as a synthetic "exhausted" error.

use bytes::Bytes;
use http::HeaderMap;
use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::constants::ERROR_CODE_REQUEST_EXPIRED;
use crate::constants::X_BCE_REQUEST_ID;

/// The error type for all signing and execution operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local failure, raised before any network I/O.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The remote service rejected the request.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The transport failed before a status code was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, Error>;

/// Local failures detected on the client side.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No credentials were available at sign time.
    #[error("credentials are required to sign this request")]
    CredentialsRequired,

    /// No endpoint was configured for this request.
    #[error("no endpoint configured for this request")]
    EndpointRequired,

    /// The request itself cannot be signed as given.
    #[error("request cannot be signed: {reason}")]
    RequestInvalid {
        /// What made the request unusable.
        reason: String,
        /// The lower-level cause, if any.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A lower-level failure occurred while computing the signature.
    ///
    /// The original cause is preserved; this is never surfaced as a bare
    /// signature mismatch.
    #[error("signature computation failed: {reason}")]
    Signing {
        /// What went wrong.
        reason: String,
        /// The lower-level cause, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// A rejection produced by the remote service.
#[derive(Debug, Error)]
#[error("service error (status {status}, code {code}, request id {request_id}): {message}")]
pub struct ServiceError {
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Vendor error code, e.g. `AccessDenied` or `RequestExpired`.
    pub code: String,
    /// Human readable message from the service.
    pub message: String,
    /// Server-assigned id of the rejected request.
    pub request_id: String,
}

/// Wire shape of the vendor JSON error body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ServiceErrorBody {
    code: String,
    message: String,
    request_id: String,
}

impl ServiceError {
    /// Build a service error from a non-2xx response.
    ///
    /// The body is expected to be the vendor JSON error document. Responses
    /// that carry no parsable body still produce a usable error with the
    /// status line as the message and the request id taken from the
    /// `x-bce-request-id` header.
    pub fn from_response(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> Self {
        let parsed: ServiceErrorBody = serde_json::from_slice(body).unwrap_or_default();

        let request_id = if parsed.request_id.is_empty() {
            headers
                .get(X_BCE_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        } else {
            parsed.request_id
        };

        let message = if parsed.message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unknown service failure")
                .to_string()
        } else {
            parsed.message
        };

        Self {
            status,
            code: parsed.code,
            message,
            request_id,
        }
    }

    /// Whether this rejection signals that the signature timestamp expired.
    pub fn is_request_expired(&self) -> bool {
        self.code == ERROR_CODE_REQUEST_EXPIRED
    }
}

/// A failure that happened before any status code was obtained.
#[derive(Debug, Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// Description of the connectivity failure.
    pub message: String,
    /// The lower-level cause, if any.
    #[source]
    pub source: Option<anyhow::Error>,
}

impl TransportError {
    /// Create a new transport error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Error {
    /// Create a request invalid error.
    pub fn request_invalid(reason: impl Into<String>) -> Self {
        Self::Client(ClientError::RequestInvalid {
            reason: reason.into(),
            source: None,
        })
    }

    /// Create a signing error.
    pub fn signing(reason: impl Into<String>) -> Self {
        Self::Client(ClientError::Signing {
            reason: reason.into(),
            source: None,
        })
    }

    /// Add a source error to variants that carry one.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        match &mut self {
            Error::Client(
                ClientError::RequestInvalid { source: s, .. }
                | ClientError::Signing { source: s, .. },
            ) => *s = Some(source.into()),
            Error::Transport(t) => t.source = Some(source.into()),
            _ => {}
        }
        self
    }

    /// Whether a retry may observe a different outcome.
    ///
    /// Classification, first match wins:
    ///
    /// 1. transport failure not yet mapped to a service response
    /// 2. service status 500 or 503
    /// 3. the request-expired code (the next attempt re-signs with a fresh
    ///    timestamp)
    /// 4. anything else is permanent
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Service(e) => {
                e.status == StatusCode::INTERNAL_SERVER_ERROR
                    || e.status == StatusCode::SERVICE_UNAVAILABLE
                    || e.is_request_expired()
            }
            Error::Client(_) => false,
        }
    }

    /// Check if this is a client error.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Client(_))
    }

    /// Check if this is a service error.
    pub fn is_service_error(&self) -> bool {
        matches!(self, Error::Service(_))
    }

    /// Check if this is a transport error.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_error(status: StatusCode, code: &str) -> Error {
        Error::Service(ServiceError {
            status,
            code: code.to_string(),
            message: "m".to_string(),
            request_id: "r".to_string(),
        })
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transport(TransportError::new("connection reset")).is_transient());
        assert!(service_error(StatusCode::INTERNAL_SERVER_ERROR, "InternalError").is_transient());
        assert!(service_error(StatusCode::SERVICE_UNAVAILABLE, "SlowDown").is_transient());
        assert!(service_error(StatusCode::BAD_REQUEST, "RequestExpired").is_transient());

        assert!(!service_error(StatusCode::FORBIDDEN, "SignatureDoesNotMatch").is_transient());
        assert!(!service_error(StatusCode::NOT_FOUND, "NoSuchKey").is_transient());
        assert!(!Error::Client(ClientError::CredentialsRequired).is_transient());
    }

    #[test]
    fn test_service_error_from_response() {
        let body = Bytes::from_static(
            br#"{"code":"NoSuchKey","message":"The key does not exist","requestId":"abc-123"}"#,
        );
        let err = ServiceError::from_response(StatusCode::NOT_FOUND, &HeaderMap::new(), &body);
        assert_eq!(err.code, "NoSuchKey");
        assert_eq!(err.message, "The key does not exist");
        assert_eq!(err.request_id, "abc-123");
    }

    #[test]
    fn test_service_error_from_unparsable_body() {
        let mut headers = HeaderMap::new();
        headers.insert(X_BCE_REQUEST_ID, "req-9".parse().unwrap());

        let err = ServiceError::from_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &headers,
            &Bytes::from_static(b"<html>overloaded</html>"),
        );
        assert_eq!(err.message, "Service Unavailable");
        assert_eq!(err.request_id, "req-9");
        assert!(err.code.is_empty());
    }
}

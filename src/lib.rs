//! Request signing and resilient execution for BCE-style cloud APIs.
//!
//! This crate implements the two load-bearing pieces every operation of such
//! an API client goes through:
//!
//! - the `bce-auth-v1` signing protocol: byte-exact canonicalization of
//!   method/path/query/headers, HMAC-SHA256 key derivation and the
//!   authorization token attached to every request;
//! - the retry engine that classifies failures, backs off, and replays
//!   requests without corrupting stream-backed bodies.
//!
//! Domain clients (bucket/object/message wrappers), model serialization and
//! socket configuration live outside this crate; they consume [`Client`],
//! [`Sign`] and [`Transport`].
//!
//! ## Example
//!
//! ```no_run
//! use bce_client::{Client, Config, Credential, OutgoingRequest};
//! use http::Method;
//!
//! # fn run(transport: impl bce_client::Transport) -> bce_client::Result<()> {
//! let config = Config {
//!     endpoint: Some("mybucket.bcebos.com".to_string()),
//!     credentials: Some(Credential::with_static("ak", "sk")),
//!     ..Default::default()
//! };
//! let client = Client::new(config, transport);
//!
//! let mut req = OutgoingRequest::new(Method::GET, "/v1/mybucket/mykey");
//! let resp = client.execute(&mut req, None)?;
//! assert!(resp.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! ## Layers
//!
//! Configuration is resolved per call from three layers: library defaults,
//! the client-level [`Config`] and an optional per-request override. The
//! resolved [`EffectiveConfig`] is immutable; concurrent calls share no
//! mutable state and each call is synchronous end to end, including backoff
//! sleeps.

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod canonical;
pub mod constants;
pub mod hash;
pub mod time;
pub mod utils;

mod credential;
pub use credential::Credential;

mod config;
pub use config::Config;
pub use config::EffectiveConfig;
pub use config::Protocol;

mod request;
pub use request::Body;
pub use request::OutgoingRequest;
pub use request::SeekableRead;

mod signer;
pub use signer::Sign;
pub use signer::SignOptions;
pub use signer::V1Signer;

mod retry;
pub use retry::execute_with_retry;
pub use retry::ExponentialBackoff;
pub use retry::RetryDecision;
pub use retry::RetryExecutor;
pub use retry::RetryPolicy;

mod transport;
pub use transport::RawResponse;
pub use transport::Transport;

mod client;
pub use client::Client;

mod error;
pub use error::ClientError;
pub use error::Error;
pub use error::Result;
pub use error::ServiceError;
pub use error::TransportError;

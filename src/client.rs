//! Orchestration of one call: merge config, sign, execute, classify, retry.

use std::sync::Arc;

use http::header::CONTENT_LENGTH;
use http::header::HOST;
use log::debug;

use crate::config::Config;
use crate::error::ClientError;
use crate::error::ServiceError;
use crate::request::OutgoingRequest;
use crate::retry::execute_with_retry;
use crate::transport::RawResponse;
use crate::transport::Transport;

/// Client core driving signed, retried execution of requests.
///
/// Holds the client-level configuration layer and the transport. Every call
/// resolves its own immutable [`EffectiveConfig`](crate::EffectiveConfig),
/// so concurrent calls share no mutable state.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client from a configuration layer and a transport.
    pub fn new(config: Config, transport: impl Transport) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// Sign a request under the client-level configuration.
    ///
    /// Attaches Date and Authorization (and the session token for temporary
    /// credentials) to the request headers and returns the authorization
    /// token. Performs no network I/O; missing credentials fail here, before
    /// anything is sent.
    pub fn sign(&self, req: &mut OutgoingRequest) -> crate::Result<String> {
        let effective = self.config.resolve();
        let cred = effective
            .credentials
            .as_ref()
            .ok_or(ClientError::CredentialsRequired)?;

        if !req.headers.contains_key(HOST) {
            if let Some(endpoint) = &effective.endpoint {
                req.headers.insert(HOST, endpoint.parse()?);
            }
        }

        effective.signer.sign(req, cred, &effective.sign_options)
    }

    /// Execute a request: sign it, send it, classify the outcome and retry
    /// transient failures under the configured policy.
    ///
    /// `request_config` is the per-request override layer; unset fields
    /// inherit from the client-level configuration and library defaults.
    /// Every attempt re-signs the request, so a retry after a clock-skew
    /// rejection carries a fresh timestamp unless the caller pinned one.
    pub fn execute(
        &self,
        req: &mut OutgoingRequest,
        request_config: Option<&Config>,
    ) -> crate::Result<RawResponse> {
        let layered = match request_config {
            Some(overlay) => Config::merge(&self.config, overlay),
            None => self.config.clone(),
        };
        let effective = layered.resolve();

        // Fail fast, before any I/O.
        let endpoint = effective
            .endpoint
            .clone()
            .ok_or(ClientError::EndpointRequired)?;
        let cred = effective
            .credentials
            .clone()
            .ok_or(ClientError::CredentialsRequired)?;

        if !req.headers.contains_key(HOST) {
            req.headers.insert(HOST, endpoint.parse()?);
        }
        if !req.headers.contains_key(CONTENT_LENGTH) {
            if let Some(len) = req.body.as_ref().and_then(|b| b.size_hint()) {
                req.headers.insert(CONTENT_LENGTH, len.into());
            }
        }

        let signer = Arc::clone(&effective.signer);
        let opts = effective.sign_options.clone();
        let transport = Arc::clone(&self.transport);

        execute_with_retry(&effective, req, |attempt, req| {
            signer.sign(req, &cred, &opts)?;
            debug!("executing {} {} (attempt {attempt})", req.method, req.path);

            let resp = transport.execute(req)?;
            if resp.is_success() {
                return Ok(resp);
            }
            Err(ServiceError::from_response(resp.status, &resp.headers, &resp.body).into())
        })
    }
}

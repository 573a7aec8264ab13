//! Authorization token computation.

use std::collections::HashSet;
use std::fmt::Debug;
use std::time::Duration;

use http::header::AUTHORIZATION;
use http::header::DATE;
use http::HeaderValue;
use log::debug;

use crate::canonical::canonical_request;
use crate::canonical::signed_headers;
use crate::constants::BCE_AUTH_VERSION;
use crate::constants::DEFAULT_EXPIRATION_IN_SECONDS;
use crate::constants::X_BCE_SECURITY_TOKEN;
use crate::credential::Credential;
use crate::error::ClientError;
use crate::hash::hex_hmac_sha256;
use crate::request::OutgoingRequest;
use crate::time::format_iso8601;
use crate::time::now;
use crate::time::DateTime;

/// Per-call signing options.
#[derive(Clone, Debug)]
pub struct SignOptions {
    /// Explicit set of header names to sign. `None` selects the default
    /// set plus vendor-prefixed headers.
    pub headers_to_sign: Option<HashSet<String>>,
    /// Signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests; a pinned
    /// timestamp is only useful for testing. Leaving this unset also lets a
    /// retry after a clock-skew rejection pick up a fresh instant.
    pub timestamp: Option<DateTime>,
    /// Validity window of the signature.
    pub expiration: Duration,
}

impl Default for SignOptions {
    fn default() -> Self {
        Self {
            headers_to_sign: None,
            timestamp: None,
            expiration: Duration::from_secs(DEFAULT_EXPIRATION_IN_SECONDS),
        }
    }
}

impl SignOptions {
    /// Sign exactly the given header names instead of the default set.
    pub fn with_headers_to_sign(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.headers_to_sign = Some(names.into_iter().collect());
        self
    }

    /// Pin the signing time.
    pub fn with_timestamp(mut self, timestamp: DateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Change the validity window of the signature.
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }
}

/// Capability interface for attaching an authorization token to a request.
///
/// One default implementation exists ([`V1Signer`]); alternatives are wired
/// in through [`Config::signer`](crate::Config).
pub trait Sign: Debug + Send + Sync + 'static {
    /// Compute the authorization token for the request and attach it to the
    /// request headers as a side effect. Performs no network I/O.
    fn sign(
        &self,
        req: &mut OutgoingRequest,
        cred: &Credential,
        opts: &SignOptions,
    ) -> crate::Result<String>;
}

/// The default signer.
///
/// Token shape:
///
/// ```shell
/// bce-auth-v1/{accessKeyId}/{timestamp}/{expirationInSeconds}/{signedHeaders}/{signature}
/// ```
///
/// The signature chain is HMAC-SHA256 twice: the secret key signs the auth
/// string to derive the signing key, then the hex signing key (as UTF-8
/// text) signs the canonical request. The raw secret key never touches
/// variable-length request data.
#[derive(Debug, Default)]
pub struct V1Signer;

impl V1Signer {
    /// Create a new signer.
    pub fn new() -> Self {
        Self
    }
}

impl Sign for V1Signer {
    fn sign(
        &self,
        req: &mut OutgoingRequest,
        cred: &Credential,
        opts: &SignOptions,
    ) -> crate::Result<String> {
        if !cred.is_valid() {
            return Err(ClientError::CredentialsRequired.into());
        }

        // The auth string and the Date header must carry the same instant,
        // otherwise the server's clock-skew check and its recomputed
        // signature diverge.
        let timestamp = format_iso8601(opts.timestamp.unwrap_or_else(now));
        req.headers.insert(DATE, timestamp.parse()?);

        // A session token participates in signing through the vendor prefix,
        // so it has to be present before header selection.
        if let Some(token) = cred.session_token() {
            let mut value: HeaderValue = token.parse()?;
            value.set_sensitive(true);
            req.headers.insert(X_BCE_SECURITY_TOKEN, value);
        }

        let selected = signed_headers(&req.headers, opts.headers_to_sign.as_ref())?;
        let creq = canonical_request(req, &selected);
        debug!("calculated canonical request: {creq}");

        let auth_string = format!(
            "{}/{}/{}/{}",
            BCE_AUTH_VERSION,
            cred.access_key_id(),
            timestamp,
            opts.expiration.as_secs()
        );
        let signing_key = hex_hmac_sha256(cred.secret_key().as_bytes(), auth_string.as_bytes());
        let signature = hex_hmac_sha256(signing_key.as_bytes(), creq.as_bytes());

        let signed_names = selected
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let token = format!("{auth_string}/{signed_names}/{signature}");

        let mut value: HeaderValue = token.parse()?;
        value.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, value);

        Ok(token)
    }
}

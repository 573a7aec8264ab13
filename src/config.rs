//! Layered configuration and its resolution.
//!
//! Three layers exist: library defaults, client-level configuration and a
//! per-request override. [`Config::merge`] combines two layers field by
//! field (each field inherits its own layer independently of siblings) and
//! [`Config::resolve`] fills the remaining gaps from library defaults,
//! producing an [`EffectiveConfig`] that is never mutated afterwards.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::BCE_ACCESS_KEY_ID;
use crate::constants::BCE_ENDPOINT;
use crate::constants::BCE_REGION;
use crate::constants::BCE_SECRET_ACCESS_KEY;
use crate::constants::BCE_SESSION_TOKEN;
use crate::constants::DEFAULT_REGION;
use crate::constants::DEFAULT_TIMEOUT;
use crate::credential::Credential;
use crate::retry::ExponentialBackoff;
use crate::retry::RetryPolicy;
use crate::signer::Sign;
use crate::signer::SignOptions;
use crate::signer::V1Signer;

/// Wire protocol of the endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
    /// Plain HTTP, the library default.
    #[default]
    Http,
    /// TLS.
    Https,
}

impl Protocol {
    /// URL scheme of this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configuration layer. Every field is optional; an unset field inherits
/// from the layer below it.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Service endpoint authority, e.g. `mybucket.bcebos.com`.
    pub endpoint: Option<String>,
    /// Wire protocol.
    pub protocol: Option<Protocol>,
    /// Service region.
    pub region: Option<String>,
    /// Credentials used at sign time. Absence is only an error when a
    /// request is actually signed, never at merge time.
    pub credentials: Option<Credential>,
    /// Signer implementation.
    pub signer: Option<Arc<dyn Sign>>,
    /// Default signing options for requests under this config.
    pub sign_options: Option<SignOptions>,
    /// Retry policy driving the executor.
    pub retry_policy: Option<Arc<dyn RetryPolicy>>,
    /// Connect timeout handed to the transport.
    pub connect_timeout: Option<Duration>,
    /// Read timeout handed to the transport.
    pub read_timeout: Option<Duration>,
}

impl Config {
    /// Merge two layers: for every field, an override value wins, otherwise
    /// the base value is inherited. Neither input is mutated.
    pub fn merge(base: &Config, overlay: &Config) -> Config {
        Config {
            endpoint: overlay.endpoint.clone().or_else(|| base.endpoint.clone()),
            protocol: overlay.protocol.or(base.protocol),
            region: overlay.region.clone().or_else(|| base.region.clone()),
            credentials: overlay
                .credentials
                .clone()
                .or_else(|| base.credentials.clone()),
            signer: overlay.signer.clone().or_else(|| base.signer.clone()),
            sign_options: overlay
                .sign_options
                .clone()
                .or_else(|| base.sign_options.clone()),
            retry_policy: overlay
                .retry_policy
                .clone()
                .or_else(|| base.retry_policy.clone()),
            connect_timeout: overlay.connect_timeout.or(base.connect_timeout),
            read_timeout: overlay.read_timeout.or(base.read_timeout),
        }
    }

    /// Load config from environment variables.
    ///
    /// Credentials require both `BCE_ACCESS_KEY_ID` and
    /// `BCE_SECRET_ACCESS_KEY`; `BCE_SESSION_TOKEN` upgrades them to a
    /// session credential.
    pub fn from_env() -> Self {
        let credentials = match (
            std::env::var(BCE_ACCESS_KEY_ID).ok(),
            std::env::var(BCE_SECRET_ACCESS_KEY).ok(),
        ) {
            (Some(ak), Some(sk)) => Some(match std::env::var(BCE_SESSION_TOKEN).ok() {
                Some(token) => Credential::with_session(&ak, &sk, &token),
                None => Credential::with_static(&ak, &sk),
            }),
            _ => None,
        };

        Self {
            endpoint: std::env::var(BCE_ENDPOINT).ok(),
            region: std::env::var(BCE_REGION).ok(),
            credentials,
            ..Default::default()
        }
    }

    /// Resolve this layer against library defaults.
    pub fn resolve(&self) -> EffectiveConfig {
        EffectiveConfig {
            endpoint: self.endpoint.clone(),
            protocol: self.protocol.unwrap_or_default(),
            region: self
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            credentials: self.credentials.clone(),
            signer: self
                .signer
                .clone()
                .unwrap_or_else(|| Arc::new(V1Signer::new())),
            sign_options: self.sign_options.clone().unwrap_or_default(),
            retry_policy: self
                .retry_policy
                .clone()
                .unwrap_or_else(|| Arc::new(ExponentialBackoff::default())),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_TIMEOUT),
            read_timeout: self.read_timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

/// Fully resolved configuration for one call.
///
/// Produced fresh per call by merging and resolving the layers; never
/// mutated after creation, so concurrent calls share nothing mutable.
#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    /// Service endpoint authority, if any layer supplied one.
    pub endpoint: Option<String>,
    /// Wire protocol.
    pub protocol: Protocol,
    /// Service region.
    pub region: String,
    /// Credentials, checked only at sign time.
    pub credentials: Option<Credential>,
    /// Signer implementation.
    pub signer: Arc<dyn Sign>,
    /// Signing options.
    pub sign_options: SignOptions,
    /// Retry policy.
    pub retry_policy: Arc<dyn RetryPolicy>,
    /// Connect timeout handed to the transport.
    pub connect_timeout: Duration,
    /// Read timeout handed to the transport.
    pub read_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn base() -> Config {
        Config {
            endpoint: Some("bj.bcebos.com".to_string()),
            protocol: Some(Protocol::Https),
            region: Some("bj".to_string()),
            credentials: Some(Credential::with_static("base-ak", "base-sk")),
            signer: Some(Arc::new(V1Signer::new())),
            sign_options: Some(SignOptions::default()),
            retry_policy: Some(Arc::new(ExponentialBackoff::default())),
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: Some(Duration::from_secs(20)),
        }
    }

    #[test]
    fn test_merge_with_empty_override_returns_base() {
        let base = base();
        let merged = Config::merge(&base, &Config::default());

        assert_eq!(merged.endpoint, base.endpoint);
        assert_eq!(merged.protocol, base.protocol);
        assert_eq!(merged.region, base.region);
        assert_eq!(
            merged.credentials.as_ref().map(|c| c.access_key_id()),
            Some("base-ak")
        );
        assert!(Arc::ptr_eq(
            merged.signer.as_ref().unwrap(),
            base.signer.as_ref().unwrap()
        ));
        assert!(Arc::ptr_eq(
            merged.retry_policy.as_ref().unwrap(),
            base.retry_policy.as_ref().unwrap()
        ));
        assert_eq!(merged.connect_timeout, base.connect_timeout);
        assert_eq!(merged.read_timeout, base.read_timeout);
    }

    #[test]
    fn test_merge_with_full_override_returns_override() {
        let overlay = Config {
            endpoint: Some("gz.bcebos.com".to_string()),
            protocol: Some(Protocol::Http),
            region: Some("gz".to_string()),
            credentials: Some(Credential::with_static("over-ak", "over-sk")),
            signer: Some(Arc::new(V1Signer::new())),
            sign_options: Some(SignOptions::default().with_expiration(Duration::from_secs(60))),
            retry_policy: Some(Arc::new(ExponentialBackoff::new(1))),
            connect_timeout: Some(Duration::from_secs(1)),
            read_timeout: Some(Duration::from_secs(2)),
        };
        let merged = Config::merge(&base(), &overlay);

        assert_eq!(merged.endpoint, overlay.endpoint);
        assert_eq!(merged.protocol, overlay.protocol);
        assert_eq!(merged.region, overlay.region);
        assert_eq!(
            merged.credentials.as_ref().map(|c| c.access_key_id()),
            Some("over-ak")
        );
        assert!(Arc::ptr_eq(
            merged.signer.as_ref().unwrap(),
            overlay.signer.as_ref().unwrap()
        ));
        assert!(Arc::ptr_eq(
            merged.retry_policy.as_ref().unwrap(),
            overlay.retry_policy.as_ref().unwrap()
        ));
        assert_eq!(merged.connect_timeout, overlay.connect_timeout);
        assert_eq!(merged.read_timeout, overlay.read_timeout);
    }

    #[test]
    fn test_merge_fields_inherit_independently() {
        let overlay = Config {
            region: Some("gz".to_string()),
            ..Default::default()
        };
        let merged = Config::merge(&base(), &overlay);

        // Only region came from the override layer.
        assert_eq!(merged.region.as_deref(), Some("gz"));
        assert_eq!(merged.endpoint.as_deref(), Some("bj.bcebos.com"));
        assert_eq!(merged.protocol, Some(Protocol::Https));
    }

    #[test]
    fn test_resolve_fills_library_defaults() {
        let effective = Config::default().resolve();

        assert_eq!(effective.endpoint, None);
        assert_eq!(effective.protocol, Protocol::Http);
        assert_eq!(effective.region, DEFAULT_REGION);
        assert!(effective.credentials.is_none());
        assert_eq!(
            effective.sign_options.expiration,
            Duration::from_secs(1800)
        );
        assert_eq!(effective.connect_timeout, DEFAULT_TIMEOUT);
        assert_eq!(effective.read_timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_env_loads_session_credentials() {
        temp_env::with_vars(
            [
                (BCE_ACCESS_KEY_ID, Some("env-ak")),
                (BCE_SECRET_ACCESS_KEY, Some("env-sk")),
                (BCE_SESSION_TOKEN, Some("env-token")),
                (BCE_REGION, Some("su")),
                (BCE_ENDPOINT, Some("su.bcebos.com")),
            ],
            || {
                let config = Config::from_env();
                let cred = config.credentials.unwrap();
                assert_eq!(cred.access_key_id(), "env-ak");
                assert_eq!(cred.session_token(), Some("env-token"));
                assert_eq!(config.region.as_deref(), Some("su"));
                assert_eq!(config.endpoint.as_deref(), Some("su.bcebos.com"));
            },
        );
    }

    #[test]
    fn test_from_env_requires_full_key_pair() {
        temp_env::with_vars(
            [
                (BCE_ACCESS_KEY_ID, Some("env-ak")),
                (BCE_SECRET_ACCESS_KEY, None::<&str>),
            ],
            || {
                assert!(Config::from_env().credentials.is_none());
            },
        );
    }
}

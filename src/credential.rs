//! Credentials used to derive signing keys.

use std::fmt::Debug;
use std::fmt::Formatter;

use crate::utils::Redact;

/// Credential for signing requests.
///
/// Modeled as a tagged variant instead of a subclass chain: permanent
/// credentials carry an access key pair, temporary credentials additionally
/// carry a session token that is attached to every signed request. Values are
/// immutable once built and are shared by reference between concurrent calls.
#[derive(Clone)]
pub enum Credential {
    /// Long-lived access key pair.
    Static {
        /// Access key id, embedded verbatim in the authorization token.
        access_key_id: String,
        /// Secret key, used only as HMAC key material.
        secret_key: String,
    },
    /// Temporary credential obtained from a token service.
    Session {
        /// Access key id of the temporary credential.
        access_key_id: String,
        /// Secret key of the temporary credential.
        secret_key: String,
        /// Session token, sent as `x-bce-security-token`.
        session_token: String,
    },
}

impl Credential {
    /// Create a long-lived credential from an access key pair.
    pub fn with_static(access_key_id: &str, secret_key: &str) -> Self {
        Self::Static {
            access_key_id: access_key_id.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    /// Create a temporary credential carrying a session token.
    pub fn with_session(access_key_id: &str, secret_key: &str, session_token: &str) -> Self {
        Self::Session {
            access_key_id: access_key_id.to_string(),
            secret_key: secret_key.to_string(),
            session_token: session_token.to_string(),
        }
    }

    /// The access key id.
    pub fn access_key_id(&self) -> &str {
        match self {
            Self::Static { access_key_id, .. } | Self::Session { access_key_id, .. } => {
                access_key_id
            }
        }
    }

    /// The secret key.
    pub fn secret_key(&self) -> &str {
        match self {
            Self::Static { secret_key, .. } | Self::Session { secret_key, .. } => secret_key,
        }
    }

    /// The session token, if this is a temporary credential.
    pub fn session_token(&self) -> Option<&str> {
        match self {
            Self::Static { .. } => None,
            Self::Session { session_token, .. } => Some(session_token),
        }
    }

    /// Check if the credential carries a usable key pair.
    pub fn is_valid(&self) -> bool {
        !self.access_key_id().is_empty() && !self.secret_key().is_empty()
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Static {
                access_key_id,
                secret_key,
            } => f
                .debug_struct("Credential::Static")
                .field("access_key_id", access_key_id)
                .field("secret_key", &Redact::from(secret_key))
                .finish(),
            Credential::Session {
                access_key_id,
                secret_key,
                session_token,
            } => f
                .debug_struct("Credential::Session")
                .field("access_key_id", access_key_id)
                .field("secret_key", &Redact::from(secret_key))
                .field("session_token", &Redact::from(session_token))
                .finish(),
        }
    }
}

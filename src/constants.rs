//! Process-wide immutable constants shared by the signer and the client.

use std::time::Duration;

use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

/// Version tag that prefixes every authorization token.
pub const BCE_AUTH_VERSION: &str = "bce-auth-v1";

/// Prefix of vendor headers that are always part of the default signed set.
pub const BCE_PREFIX: &str = "x-bce-";

/// Header carrying the session token of temporary credentials.
pub const X_BCE_SECURITY_TOKEN: &str = "x-bce-security-token";

/// Header carrying the server-assigned request id on responses.
pub const X_BCE_REQUEST_ID: &str = "x-bce-request-id";

/// Service error code signalling that the signature timestamp fell outside
/// the server's clock-skew window. Retryable: the next attempt re-signs with
/// a fresh timestamp.
pub const ERROR_CODE_REQUEST_EXPIRED: &str = "RequestExpired";

/// Headers signed by default when the caller supplies no explicit set.
///
/// Headers whose name starts with [`BCE_PREFIX`] are added on top of these.
pub const DEFAULT_HEADERS_TO_SIGN: [&str; 4] =
    ["host", "content-length", "content-type", "content-md5"];

/// Env value holding the access key id.
pub const BCE_ACCESS_KEY_ID: &str = "BCE_ACCESS_KEY_ID";
/// Env value holding the secret key.
pub const BCE_SECRET_ACCESS_KEY: &str = "BCE_SECRET_ACCESS_KEY";
/// Env value holding the session token of temporary credentials.
pub const BCE_SESSION_TOKEN: &str = "BCE_SESSION_TOKEN";
/// Env value holding the region.
pub const BCE_REGION: &str = "BCE_REGION";
/// Env value holding the endpoint authority.
pub const BCE_ENDPOINT: &str = "BCE_ENDPOINT";

/// Default region when none is configured.
pub const DEFAULT_REGION: &str = "bj";

/// Default signature validity window in seconds.
pub const DEFAULT_EXPIRATION_IN_SECONDS: u64 = 1800;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_ERROR_RETRY: u32 = 3;

/// Default backoff scale factor.
pub const DEFAULT_BACKOFF_SCALE: Duration = Duration::from_millis(300);

/// Default upper bound for a single backoff delay.
pub const DEFAULT_MAX_BACKOFF_DELAY: Duration = Duration::from_secs(20);

/// Default connect/read timeouts handed to the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(50);

/// AsciiSet for canonical URIs.
///
/// - URI encode every byte except the unreserved characters: 'A'-'Z',
///   'a'-'z', '0'-'9', '-', '.', '_', and '~'.
/// - `/` is kept verbatim so path segment separators are never
///   double-escaped.
pub static URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for canonical query keys/values and canonical header values.
///
/// Same unreserved table as [`URI_ENCODE_SET`] but `/` is escaped too.
pub static QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

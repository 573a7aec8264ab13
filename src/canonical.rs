//! Canonical request construction.
//!
//! The canonical request is the exact byte string fed to the signature. The
//! server rebuilds it independently from the wire request, so every rule in
//! here must be reproduced byte for byte: one stray escape and the service
//! rejects the request with a signature mismatch that cannot be retried
//! away.

use std::collections::BTreeSet;
use std::collections::HashSet;

use http::header::AUTHORIZATION;
use http::HeaderMap;
use percent_encoding::percent_decode_str;
use percent_encoding::percent_encode;
use percent_encoding::utf8_percent_encode;

use crate::constants::BCE_PREFIX;
use crate::constants::DEFAULT_HEADERS_TO_SIGN;
use crate::constants::QUERY_ENCODE_SET;
use crate::constants::URI_ENCODE_SET;
use crate::request::OutgoingRequest;
use crate::Error;

/// Percent-encode a string through the unreserved-character table.
///
/// Every byte outside `A-Z a-z 0-9 - . _ ~` becomes an uppercase `%XX`
/// escape, including each byte of multi-byte UTF-8 sequences.
pub fn uri_encode(s: &str) -> String {
    utf8_percent_encode(s, &QUERY_ENCODE_SET).to_string()
}

/// Build the canonical URI for a request path.
///
/// The path is percent-decoded exactly once, then every byte is re-encoded
/// through the unreserved table with `/` separators kept verbatim, so
/// segment separators are never double-escaped. A missing or relative path
/// gets its leading `/` enforced first.
pub fn canonical_uri(path: &str) -> String {
    let path = if path.is_empty() {
        "/".to_string()
    } else if !path.starts_with('/') {
        format!("/{path}")
    } else {
        path.to_string()
    };

    let decoded: Vec<u8> = percent_decode_str(&path).collect();
    percent_encode(&decoded, &URI_ENCODE_SET).to_string()
}

/// Build the canonical query string.
///
/// Every key and value is percent-encoded; a flag-style or empty value still
/// emits a trailing `=` here even though the wire query may omit it. Entries
/// are sorted lexicographically by encoded key. The `authorization`
/// parameter never participates.
pub fn canonical_query<'a>(
    query: impl IntoIterator<Item = (&'a String, &'a Option<String>)>,
) -> String {
    let mut entries: Vec<(String, String)> = query
        .into_iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case(AUTHORIZATION.as_str()))
        .map(|(k, v)| {
            (
                uri_encode(k),
                v.as_deref().map(uri_encode).unwrap_or_default(),
            )
        })
        .collect();
    // Sort on the encoded key alone, not on the joined pair: a key that is a
    // prefix of another must order before it regardless of how the longer
    // key's next byte compares to '='.
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    entries
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Select the headers that participate in the signature.
///
/// With an explicit name set the names are case-folded, deduplicated and
/// `authorization` is dropped. Without one, the default set (host,
/// content-length, content-type, content-md5) applies, extended by every
/// header carrying the vendor prefix. Either way only headers present with
/// a non-empty trimmed value are returned, sorted by name.
pub fn signed_headers(
    headers: &HeaderMap,
    to_sign: Option<&HashSet<String>>,
) -> crate::Result<Vec<(String, String)>> {
    let names: BTreeSet<String> = match to_sign {
        Some(set) => set
            .iter()
            .map(|n| n.trim().to_ascii_lowercase())
            .filter(|n| n.as_str() != AUTHORIZATION.as_str())
            .collect(),
        None => {
            let mut names: BTreeSet<String> = DEFAULT_HEADERS_TO_SIGN
                .iter()
                .map(|n| n.to_string())
                .collect();
            // HeaderName is already lower-cased by the http crate.
            names.extend(
                headers
                    .keys()
                    .filter(|k| k.as_str().starts_with(BCE_PREFIX))
                    .map(|k| k.as_str().to_string()),
            );
            names
        }
    };

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let Some(value) = headers.get(&name) else {
            continue;
        };
        let value = value
            .to_str()
            .map_err(|e| {
                Error::request_invalid(format!("header {name} is not visible ascii"))
                    .with_source(e)
            })?
            .trim();
        if value.is_empty() {
            continue;
        }
        selected.push((name, value.to_string()));
    }

    Ok(selected)
}

/// Render the canonical header block from selected header pairs.
///
/// Each line is `name:encoded-value`; lines are sorted and newline-joined.
/// An empty selection yields the empty string, not a blank line.
pub fn canonical_header_block(selected: &[(String, String)]) -> String {
    let mut lines: Vec<String> = selected
        .iter()
        .map(|(name, value)| format!("{name}:{}", uri_encode(value)))
        .collect();
    lines.sort();

    lines.join("\n")
}

/// Assemble the full canonical request.
///
/// ```shell
/// METHOD "\n" CANONICAL_URI "\n" CANONICAL_QUERY "\n" CANONICAL_HEADERS
/// ```
pub fn canonical_request(req: &OutgoingRequest, selected: &[(String, String)]) -> String {
    [
        req.method.as_str().to_string(),
        canonical_uri(&req.path),
        canonical_query(&req.query),
        canonical_header_block(selected),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use http::Method;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_canonical_uri() {
        let cases = vec![
            ("", "/"),
            ("/", "/"),
            ("/v1/mybucket/mykey", "/v1/mybucket/mykey"),
            // relative path gets its leading slash enforced
            ("v1/mybucket", "/v1/mybucket"),
            // multi-byte utf-8 becomes one escape per byte, uppercase hex
            ("/v1/my bucket/中文", "/v1/my%20bucket/%E4%B8%AD%E6%96%87"),
            // already-escaped separators are decoded once and restored
            ("/a%2Fb/c", "/a/b/c"),
            // decode exactly once: an escaped percent re-encodes to itself
            // instead of collapsing into a separator
            ("/a%252Fb", "/a%252Fb"),
            ("/~user/_-.", "/~user/_-."),
        ];

        for (input, expected) in cases {
            assert_eq!(canonical_uri(input), expected, "path: {input}");
        }
    }

    #[test]
    fn test_canonical_query_sorts_and_always_emits_eq() {
        let mut query = BTreeMap::new();
        query.insert("uploadId".to_string(), Some("abc".to_string()));
        query.insert("partNumber".to_string(), Some("9".to_string()));
        query.insert("acl".to_string(), None);
        query.insert("tail".to_string(), Some(String::new()));

        assert_eq!(
            canonical_query(&query),
            "acl=&partNumber=9&tail=&uploadId=abc"
        );
    }

    #[test]
    fn test_canonical_query_excludes_authorization() {
        let mut query = BTreeMap::new();
        query.insert("Authorization".to_string(), Some("secret".to_string()));
        query.insert("marker".to_string(), Some("m 1".to_string()));

        assert_eq!(canonical_query(&query), "marker=m%201");
    }

    #[test]
    fn test_canonical_query_sorts_by_encoded_key() {
        let mut query = BTreeMap::new();
        // "a!" encodes to "a%21" which sorts before "a1"
        query.insert("a!".to_string(), Some("1".to_string()));
        query.insert("a1".to_string(), Some("2".to_string()));

        assert_eq!(canonical_query(&query), "a%21=1&a1=2");
    }

    #[test]
    fn test_canonical_query_orders_prefix_key_first() {
        // "max" is a prefix of "max-keys"; '-' sorts below '=', so sorting
        // the joined "key=value" strings would flip these two.
        let mut query = BTreeMap::new();
        query.insert("max-keys".to_string(), Some("2".to_string()));
        query.insert("max".to_string(), Some("1".to_string()));

        assert_eq!(canonical_query(&query), "max=1&max-keys=2");
    }

    #[test]
    fn test_empty_query_is_empty_string() {
        assert_eq!(canonical_query(&BTreeMap::new()), "");
    }

    #[test]
    fn test_signed_headers_default_set() {
        let mut headers = HeaderMap::new();
        headers.insert("Host", "mybucket.bcebos.com".parse().unwrap());
        headers.insert("Content-Length", "0".parse().unwrap());
        headers.insert("x-bce-date", "2015-04-27T08:23:49Z".parse().unwrap());
        headers.insert("User-Agent", "bce-client/0.1".parse().unwrap());
        headers.insert("Authorization", "should-not-appear".parse().unwrap());

        let selected = signed_headers(&headers, None).unwrap();
        let names: Vec<&str> = selected.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["content-length", "host", "x-bce-date"]);
    }

    #[test]
    fn test_signed_headers_explicit_set_is_folded_and_deduplicated() {
        let mut headers = HeaderMap::new();
        headers.insert("Host", "mybucket.bcebos.com".parse().unwrap());
        headers.insert("Content-Type", "text/plain".parse().unwrap());

        let to_sign: HashSet<String> = ["Host", "HOST", " host ", "Authorization"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let selected = signed_headers(&headers, Some(&to_sign)).unwrap();
        assert_eq!(
            selected,
            vec![("host".to_string(), "mybucket.bcebos.com".to_string())]
        );
    }

    #[test]
    fn test_signed_headers_skips_absent_and_empty_values() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "   ".parse().unwrap());

        let selected = signed_headers(&headers, None).unwrap();
        assert!(selected.is_empty());
        // empty selection renders as the empty string, not a blank line
        assert_eq!(canonical_header_block(&selected), "");
    }

    #[test]
    fn test_canonical_header_block_encodes_values() {
        let selected = vec![
            ("x-bce-date".to_string(), "2015-04-27T08:23:49Z".to_string()),
            ("content-type".to_string(), "text/plain".to_string()),
        ];

        assert_eq!(
            canonical_header_block(&selected),
            "content-type:text%2Fplain\nx-bce-date:2015-04-27T08%3A23%3A49Z"
        );
    }

    #[test]
    fn test_canonical_request_shape() {
        let mut req = OutgoingRequest::new(Method::GET, "/v1/mybucket/mykey");
        req.headers
            .insert("Host", "mybucket.bcebos.com".parse().unwrap());
        req.headers.insert("Content-Length", "0".parse().unwrap());

        let selected = signed_headers(&req.headers, None).unwrap();
        assert_eq!(
            canonical_request(&req, &selected),
            "GET\n/v1/mybucket/mykey\n\ncontent-length:0\nhost:mybucket.bcebos.com"
        );
    }
}

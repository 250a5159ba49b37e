//! URI string helpers.
//!
//! The local graph names subjects and predicates by full URIs; logs, search
//! labels and namespace handling all need the short local name (`…owl#Class`
//! → `Class`) or the namespace part (`…owl#Class` → `…owl#`). Both helpers
//! validate the URL shape first and raise [`UriError`] on anything else.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::UriError;

/// Absolute http/https/ftp URL with a host part (domain, localhost or IPv4)
/// and an optional port and path.
static RE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:http|ftp)s?://(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|localhost|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})(?::\d+)?(?:/?|[/?]\S+)$",
    )
    .unwrap()
});

/// Whether a string is an absolute URL per [`RE_URL`].
pub fn is_url(value: &str) -> bool {
    RE_URL.is_match(value)
}

/// The last path segment of a URI, after any `#` fragment marker.
///
/// An empty input yields an empty name; a non-URL input is an error.
pub fn local_name(uri: &str) -> Result<&str, UriError> {
    if uri.is_empty() {
        return Ok("");
    }
    if !is_url(uri) {
        return Err(UriError::NotAUrl {
            value: uri.to_string(),
        });
    }
    let tail = uri.rsplit('/').next().unwrap_or(uri);
    Ok(match tail.rsplit_once('#') {
        Some((_, frag)) => frag,
        None => tail,
    })
}

/// The namespace part of a URI: up to and including the `#`, or up to and
/// including the last `/` when there is no fragment marker.
pub fn namespace(uri: &str) -> Result<&str, UriError> {
    if !is_url(uri) {
        return Err(UriError::NotAUrl {
            value: uri.to_string(),
        });
    }
    if let Some(pos) = uri.find('#') {
        return Ok(&uri[..=pos]);
    }
    match uri.rfind('/') {
        // Keep the trailing slash.
        Some(pos) => Ok(&uri[..=pos]),
        None => Ok(uri),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_URI: &str = "http://www.w3.org/2002/07/owl#Class";
    const SLASH_URI: &str = "http://www.w3.org/2004/02/skos/core/Concept";

    #[test]
    fn local_name_with_fragment() {
        assert_eq!(local_name(HASH_URI).unwrap(), "Class");
    }

    #[test]
    fn local_name_with_path() {
        assert_eq!(local_name(SLASH_URI).unwrap(), "Concept");
    }

    #[test]
    fn local_name_of_empty_is_empty() {
        assert_eq!(local_name("").unwrap(), "");
    }

    #[test]
    fn local_name_of_non_url_fails() {
        assert!(local_name("not working").is_err());
    }

    #[test]
    fn namespace_with_fragment() {
        assert_eq!(
            namespace("http://www.w3.org/2004/02/skos/core#Concept").unwrap(),
            "http://www.w3.org/2004/02/skos/core#"
        );
    }

    #[test]
    fn namespace_with_path() {
        assert_eq!(
            namespace(SLASH_URI).unwrap(),
            "http://www.w3.org/2004/02/skos/core/"
        );
    }

    #[test]
    fn namespace_of_non_url_fails() {
        assert!(namespace("not working").is_err());
        // Host without a dot or port is not accepted.
        assert!(namespace("http://google").is_err());
    }

    #[test]
    fn url_shapes() {
        assert!(is_url("https://example.org/x?y=1"));
        assert!(is_url("http://localhost:8181/w/api.php"));
        assert!(is_url("http://10.0.0.2/genid/abc"));
        assert!(!is_url("example.org/no-scheme"));
        assert!(!is_url("13:15"));
        assert!(!is_url("2018-12-19"));
    }
}

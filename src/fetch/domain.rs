//! Client domain normalization and import URL construction.

use url::Url;

use crate::error::ImportError;

const DEFAULT_SCHEME: &str = "http://";

/// Normalize a client domain.
///
/// Trailing slashes are trimmed. A domain without an `http://` or
/// `https://` prefix gets `http://`; an existing scheme is kept verbatim.
///
/// # Examples
/// ```
/// use t3monitoring_core::fetch::unify_domain;
/// assert_eq!(unify_domain("example.com/"), "http://example.com");
/// assert_eq!(unify_domain("https://example.com"), "https://example.com");
/// ```
pub fn unify_domain(domain: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.starts_with("http://") || domain.starts_with("https://") {
        domain.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, domain)
    }
}

/// Build the import URL for a client.
///
/// `endpoint` is appended after a slash; the secret is added as a
/// URL-encoded `secret` query parameter.
pub fn build_import_url(domain: &str, endpoint: &str, secret: &str) -> Result<Url, ImportError> {
    let base = format!(
        "{}/{}",
        unify_domain(domain),
        endpoint.trim_start_matches('/')
    );
    let mut url = Url::parse(&base)
        .map_err(|e| ImportError::Transport(format!("Invalid client URL {}: {}", base, e)))?;
    url.query_pairs_mut().append_pair("secret", secret);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ENDPOINT: &str = "index.php?eID=t3monitoring";

    #[test]
    fn test_unify_domain() {
        assert_eq!(unify_domain("example.com/"), "http://example.com");
        assert_eq!(unify_domain("example.com///"), "http://example.com");
        assert_eq!(unify_domain("https://example.com"), "https://example.com");
        assert_eq!(unify_domain("http://example.com/"), "http://example.com");
        assert_eq!(unify_domain("example.com/sub"), "http://example.com/sub");
    }

    #[test]
    fn test_build_import_url() {
        let url = build_import_url("example.com/", ENDPOINT, "s3cr3t").unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.com/index.php?eID=t3monitoring&secret=s3cr3t"
        );
    }

    #[test]
    fn test_build_import_url_encodes_secret() {
        let url = build_import_url("https://example.com", ENDPOINT, "a&b=c/d").unwrap();
        assert_eq!(url.scheme(), "https");
        assert!(url.as_str().ends_with("secret=a%26b%3Dc%2Fd"));

        let secret = url
            .query_pairs()
            .find(|(k, _)| k == "secret")
            .map(|(_, v)| v.into_owned());
        assert_eq!(secret.as_deref(), Some("a&b=c/d"));
    }

    #[test]
    fn test_build_import_url_keeps_path_prefix() {
        let url = build_import_url("example.com/typo3site/", ENDPOINT, "x").unwrap();
        assert_eq!(url.path(), "/typo3site/index.php");
    }

    #[test]
    fn test_build_import_url_invalid() {
        let err = build_import_url("http://exa mple.com", ENDPOINT, "x").unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    proptest! {
        #[test]
        fn prop_unify_domain_has_scheme_and_no_trailing_slash(domain in "[a-z0-9./:]{0,40}") {
            let unified = unify_domain(&domain);
            prop_assert!(unified.starts_with("http://") || unified.starts_with("https://"));
            prop_assert!(!unified.ends_with('/') || unified == "http://" || unified == "https://");
        }

        #[test]
        fn prop_unify_domain_is_idempotent(domain in "(https?://)?[a-z0-9.]{1,30}/*") {
            let once = unify_domain(&domain);
            prop_assert_eq!(unify_domain(&once), once);
        }
    }
}

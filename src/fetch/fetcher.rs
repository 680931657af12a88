//! Remote fetcher.
//!
//! One attempt per client per run; no retries.

use crate::error::ImportError;
use crate::logging::structured::LogContext;

use super::domain::build_import_url;
use super::transport::Transport;

/// Fetches raw report bytes for a client domain.
pub struct RemoteFetcher<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> RemoteFetcher<T> {
    pub fn new(transport: T, endpoint: &str) -> Self {
        Self {
            transport,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the report for `domain`, authenticated with `secret`.
    /// `title` names the client in the empty-response error.
    pub fn fetch(
        &self,
        title: &str,
        domain: &str,
        secret: &str,
        ctx: &LogContext,
    ) -> Result<Vec<u8>, ImportError> {
        let url = build_import_url(domain, &self.endpoint, secret)?;

        log::debug!(
            "{} FETCH_START host={} path={}",
            ctx,
            url.host_str().unwrap_or(""),
            url.path()
        );

        let body = self.transport.get(&url)?;
        if body.is_empty() {
            return Err(ImportError::EmptyResponse {
                client: title.to_string(),
            });
        }

        log::debug!("{} FETCH_COMPLETE bytes={}", ctx, body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use url::Url;

    use super::*;

    struct RecordingTransport {
        body: Vec<u8>,
        seen: RefCell<Vec<String>>,
    }

    impl Transport for RecordingTransport {
        fn get(&self, url: &Url) -> Result<Vec<u8>, ImportError> {
            self.seen.borrow_mut().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn get(&self, _url: &Url) -> Result<Vec<u8>, ImportError> {
            Err(ImportError::Transport("HTTP 503 Service Unavailable".to_string()))
        }
    }

    fn ctx() -> LogContext {
        LogContext::new("run-test").with_client(1)
    }

    #[test]
    fn test_fetch_builds_request() {
        let fetcher = RemoteFetcher::new(
            RecordingTransport {
                body: b"{}".to_vec(),
                seen: RefCell::new(Vec::new()),
            },
            "index.php?eID=t3monitoring",
        );

        let body = fetcher.fetch("Example", "example.com/", "top secret", &ctx()).unwrap();
        assert_eq!(body, b"{}");
        let seen = fetcher.transport().seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            "http://example.com/index.php?eID=t3monitoring&secret=top+secret"
        );
    }

    #[test]
    fn test_fetch_empty_body() {
        let fetcher = RemoteFetcher::new(
            RecordingTransport {
                body: Vec::new(),
                seen: RefCell::new(Vec::new()),
            },
            "index.php?eID=t3monitoring",
        );

        let err = fetcher
            .fetch("Example shop", "https://example.com", "x", &ctx())
            .unwrap_err();
        assert!(matches!(err, ImportError::EmptyResponse { .. }));
        assert_eq!(err.to_string(), "Empty response from client Example shop");
    }

    #[test]
    fn test_fetch_transport_failure_passes_through() {
        let fetcher = RemoteFetcher::new(FailingTransport, "index.php?eID=t3monitoring");
        let err = fetcher.fetch("Example", "example.com", "x", &ctx()).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503 Service Unavailable");
    }
}

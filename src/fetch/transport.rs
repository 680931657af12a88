//! HTTP transport.
//!
//! `Transport` is the seam between the fetcher and the network; the
//! production implementation wraps a blocking reqwest client.

use reqwest::blocking::Client;
use url::Url;

use crate::config::HttpConfig;
use crate::error::ImportError;

/// Performs a single GET and returns the response body.
///
/// Implementations must map any non-OK outcome to `ImportError::Transport`.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<Vec<u8>, ImportError>;
}

/// Blocking HTTP transport with bounded timeouts.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, ImportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ImportError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<Vec<u8>, ImportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| ImportError::Transport(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImportError::Transport(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .map_err(|e| ImportError::Transport(describe_request_error(&e)))?;
        Ok(body.to_vec())
    }
}

/// Render a reqwest error without the URL, which carries the secret.
fn describe_request_error(error: &reqwest::Error) -> String {
    let reason = if error.is_timeout() {
        "Request timed out"
    } else if error.is_connect() {
        "Connection failed"
    } else if error.is_body() || error.is_decode() {
        "Failed to read response body"
    } else {
        "Request failed"
    };

    match std::error::Error::source(error) {
        Some(source) => format!("{}: {}", reason, source),
        None => reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::thread::{self, JoinHandle};

    use super::*;
    use crate::fetch::RemoteFetcher;
    use crate::logging::structured::LogContext;

    /// Answer a single request on a loopback port with `response`.
    fn serve_once(response: &'static str) -> (SocketAddr, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        (addr, handle)
    }

    fn local_transport() -> HttpTransport {
        HttpTransport::new(&HttpConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            ..HttpConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_non_ok_status_is_transport_error() {
        let (addr, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let url = Url::parse(&format!("http://{}/index.php?eID=t3monitoring&secret=abc", addr)).unwrap();

        let err = local_transport().get(&url).unwrap_err();
        server.join().unwrap();

        assert_eq!(err.kind(), "transport");
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error");
    }

    #[test]
    fn test_ok_status_returns_body() {
        let (addr, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        );
        let url = Url::parse(&format!("http://{}/index.php", addr)).unwrap();

        let body = local_transport().get(&url).unwrap();
        server.join().unwrap();

        assert_eq!(body, b"{}");
    }

    #[test]
    fn test_ok_status_with_empty_body_is_empty_response() {
        let (addr, server) =
            serve_once("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let fetcher = RemoteFetcher::new(local_transport(), "index.php?eID=t3monitoring");

        let err = fetcher
            .fetch(
                "Local site",
                &format!("http://{}", addr),
                "abc",
                &LogContext::new("run-test").with_client(1),
            )
            .unwrap_err();
        server.join().unwrap();

        assert_eq!(err.kind(), "empty_response");
        assert_eq!(err.to_string(), "Empty response from client Local site");
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(&HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(&HttpConfig {
            timeout_secs: 2,
            connect_timeout_secs: 1,
            ..HttpConfig::default()
        })
        .unwrap();

        // Port 9 on loopback (discard) is not expected to be listening.
        let url = Url::parse("http://127.0.0.1:9/index.php?secret=abc").unwrap();
        let err = transport.get(&url).unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(!err.to_string().contains("secret=abc"));
    }
}

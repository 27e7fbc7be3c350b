//! HTTP status probe.
//!
//! Sends one HTTP/1.1 request and compares the response status with the
//! expected code. The request runs on a throwaway current-thread tokio
//! runtime so callers stay synchronous.

use std::net::Ipv6Addr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tracing::debug;

/// Why a probe request produced no status. Never leaves this module.
#[derive(Debug, Error)]
enum RequestError {
    #[error("runtime: {0}")]
    Runtime(std::io::Error),
    #[error("invalid method: {0}")]
    Method(String),
    #[error("connect: {0}")]
    Connect(std::io::Error),
    #[error("http: {0}")]
    Http(#[from] hyper::Error),
    #[error("request: {0}")]
    Request(#[from] ::http::Error),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("request thread panicked")]
    Worker,
}

/// A single-request HTTP readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProbe {
    pub host: String,
    pub port: u16,
    pub method: String,
    pub url: String,
    pub expected_status: u16,
    /// Bound on connect plus response headers. `None` waits as long as
    /// the OS allows.
    pub timeout: Option<Duration>,
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 80,
            method: "GET".to_string(),
            url: "/".to_string(),
            expected_status: 200,
            timeout: None,
        }
    }
}

impl HttpProbe {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn expect(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Host without IPv6 literal brackets, as passed to the resolver.
    fn bare_host(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// `host:port` for logs and the Host header; IPv6 literals are bracketed.
    fn authority(&self) -> String {
        let host = self.bare_host();
        if host.parse::<Ipv6Addr>().is_ok() {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        }
    }

    /// Whether the endpoint answers with the expected status.
    pub fn check(&self) -> bool {
        match self.status() {
            Ok(code) if code == self.expected_status => true,
            Ok(code) => {
                debug!(address = %self.authority(), url = %self.url, code, expected = self.expected_status, "http probe status mismatch");
                false
            }
            Err(e) => {
                debug!(address = %self.authority(), url = %self.url, error = %e, "http probe failed");
                false
            }
        }
    }

    fn status(&self) -> Result<u16, RequestError> {
        // A runtime cannot be blocked on from inside another one; issue the
        // request from a plain thread instead.
        if tokio::runtime::Handle::try_current().is_ok() {
            return std::thread::scope(|scope| {
                scope
                    .spawn(|| self.status_on_own_runtime())
                    .join()
                    .unwrap_or(Err(RequestError::Worker))
            });
        }
        self.status_on_own_runtime()
    }

    fn status_on_own_runtime(&self) -> Result<u16, RequestError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RequestError::Runtime)?;

        runtime.block_on(async {
            match self.timeout.filter(|t| !t.is_zero()) {
                Some(limit) => tokio::time::timeout(limit, self.request())
                    .await
                    .unwrap_or(Err(RequestError::TimedOut(limit))),
                None => self.request().await,
            }
        })
    }

    async fn request(&self) -> Result<u16, RequestError> {
        let method = ::http::Method::from_bytes(self.method.as_bytes())
            .map_err(|_| RequestError::Method(self.method.clone()))?;
        let authority = self.authority();

        let stream = tokio::net::TcpStream::connect((self.bare_host(), self.port))
            .await
            .map_err(RequestError::Connect)?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;

        // Drive the connection until the runtime is dropped.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = ::http::Request::builder()
            .method(method)
            .uri(self.url.as_str())
            .header("host", authority.as_str())
            .header("user-agent", concat!("standby/", env!("CARGO_PKG_VERSION")))
            .body(Empty::<Bytes>::new())?;

        let resp = sender.send_request(req).await?;
        Ok(resp.status().as_u16())
    }
}

/// Whether `probe`'s endpoint currently answers with its expected status.
pub fn http(probe: &HttpProbe) -> bool {
    probe.check()
}

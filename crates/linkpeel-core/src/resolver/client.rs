//! HTTP client seam for the resolver.
//!
//! The resolver only talks to [`HttpClient`]; the libcurl implementation lives
//! in `curl_client`, tests inject scripted clients.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Request method of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Get,
}

impl ProbeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeMethod::Head => "HEAD",
            ProbeMethod::Get => "GET",
        }
    }
}

/// One probe request. Redirects are followed by the client.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: ProbeMethod,
    pub url: String,
    pub user_agent: String,
}

/// What is observable after the client followed all redirects.
#[derive(Debug, Clone, Default)]
pub struct ProbeResponse {
    /// URL of the last response in the redirect chain.
    pub final_url: String,
    /// HTTP status of the last response.
    pub status: u32,
    /// Response body (GET only), possibly truncated.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The client's own timeout fired.
    #[error("timeout")]
    Timeout,
    /// The transfer was aborted through the cancel token.
    #[error("request cancelled")]
    Cancelled,
    /// DNS, connect, TLS or protocol failure.
    #[error("{0}")]
    Transport(String),
}

/// Shared cancellation flag handed to the client for the duration of one probe.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Blocking HTTP client. Implementations must follow redirects automatically
/// and should poll `cancel` so an abandoned probe stops promptly.
pub trait HttpClient: Send + Sync {
    fn fetch(&self, request: &ProbeRequest, cancel: &CancelToken) -> Result<ProbeResponse, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn fetch_error_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "timeout");
        assert_eq!(
            FetchError::Transport("could not resolve host".into()).to_string(),
            "could not resolve host"
        );
    }
}

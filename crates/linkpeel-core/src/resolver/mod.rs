//! Shortener resolution: a bounded live probe that discovers where a short link leads.
//!
//! One attempt walks a fixed chain and stops at the first answer:
//!
//! 1. HEAD with redirects followed; a final URL different from the request is the answer.
//! 2. GET with redirects followed; same check.
//! 3. The GET body is searched for a meta refresh, then for a script redirect.
//!
//! Any non-200 status that is not a redirect ends the attempt. The whole chain
//! runs under one deadline; when it fires, the in-flight probe is cancelled and
//! the attempt reports [`FailureReason::Timeout`].

mod client;
mod curl_client;
pub mod html;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

pub use client::{CancelToken, FetchError, HttpClient, ProbeMethod, ProbeRequest, ProbeResponse};
pub use curl_client::{classify_curl_error, CurlClient};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str =
    concat!("linkpeel/", env!("CARGO_PKG_VERSION"), " (link deobfuscator; +shortener-resolution)");

/// How the final destination was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionMethod {
    /// HTTP redirect observed on the HEAD probe.
    Direct,
    /// HTTP redirect observed on the GET probe.
    Get,
    MetaRefresh,
    Script,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Direct => "direct",
            ResolutionMethod::Get => "get",
            ResolutionMethod::MetaRefresh => "meta-refresh",
            ResolutionMethod::Script => "script",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("timeout")]
    Timeout,
    #[error("unexpected status {0}")]
    UnexpectedStatus(u32),
    /// Neither an HTTP redirect nor an HTML redirect was found.
    #[error("requires interactive resolution")]
    RequiresInteraction,
    #[error("{0}")]
    Network(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl FailureReason {
    /// Timeouts get their own "try again" affordance in the UI.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FailureReason::Timeout)
    }
}

impl From<FetchError> for FailureReason {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Timeout | FetchError::Cancelled => FailureReason::Timeout,
            FetchError::Transport(msg) => FailureReason::Network(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved {
        final_url: String,
        method: ResolutionMethod,
    },
    Failed {
        reason: FailureReason,
    },
}

impl ResolutionOutcome {
    fn resolved(final_url: impl Into<String>, method: ResolutionMethod) -> Self {
        ResolutionOutcome::Resolved {
            final_url: final_url.into(),
            method,
        }
    }

    fn failed(reason: FailureReason) -> Self {
        ResolutionOutcome::Failed { reason }
    }

    pub fn final_url(&self) -> Option<&str> {
        match self {
            ResolutionOutcome::Resolved { final_url, .. } => Some(final_url),
            ResolutionOutcome::Failed { .. } => None,
        }
    }
}

/// Which stages of the chain may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// HEAD, GET and HTML inspection.
    #[default]
    Auto,
    /// HEAD and GET only; a page without an HTTP redirect fails.
    Http,
}

/// Resolver and transport parameters.
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Deadline for one whole attempt.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: u32,
    /// Cap on the GET body kept for HTML inspection.
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(15),
            max_redirects: 10,
            max_body_bytes: 512 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// An in-flight attempt: its deadline and the cancel token shared with the probe.
///
/// Dropping it cancels the token, so a probe never outlives the attempt.
#[derive(Debug)]
pub struct PendingResolution {
    token: CancelToken,
    deadline: Instant,
}

impl PendingResolution {
    pub fn start(timeout: Duration) -> Self {
        Self {
            token: CancelToken::new(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }
}

impl Drop for PendingResolution {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct ShortenerResolver {
    client: Arc<dyn HttpClient>,
    options: ResolverOptions,
}

impl ShortenerResolver {
    pub fn new(client: Arc<dyn HttpClient>, options: ResolverOptions) -> Self {
        Self { client, options }
    }

    /// Resolver backed by libcurl.
    pub fn with_curl(options: ResolverOptions) -> Self {
        let client = Arc::new(CurlClient::new(&options));
        Self::new(client, options)
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Full HEAD → GET → HTML chain.
    pub async fn resolve<F>(&self, url: &str, on_progress: F) -> ResolutionOutcome
    where
        F: FnMut(&str),
    {
        self.resolve_with_mode(url, ResolveMode::Auto, on_progress).await
    }

    pub async fn resolve_with_mode<F>(
        &self,
        url: &str,
        mode: ResolveMode,
        mut on_progress: F,
    ) -> ResolutionOutcome
    where
        F: FnMut(&str),
    {
        let request_url = match parse_target(url) {
            Ok(u) => u,
            Err(reason) => return ResolutionOutcome::failed(reason),
        };

        let pending = PendingResolution::start(self.options.timeout);
        let chain = self.run_chain(&request_url, mode, &pending, &mut on_progress);
        let outcome = match tokio::time::timeout_at(pending.deadline(), chain).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(url = %request_url, timeout = ?self.options.timeout, "resolution timed out");
                ResolutionOutcome::failed(FailureReason::Timeout)
            }
        };
        drop(pending);

        match &outcome {
            ResolutionOutcome::Resolved { final_url, method } => {
                tracing::info!(url = %request_url, %final_url, method = method.as_str(), "shortener resolved");
                report(&mut on_progress, "Resolved");
            }
            ResolutionOutcome::Failed { reason } => {
                tracing::info!(url = %request_url, %reason, "shortener resolution failed");
                report(&mut on_progress, &format!("Failed: {reason}"));
            }
        }
        outcome
    }

    async fn run_chain<F>(
        &self,
        request_url: &Url,
        mode: ResolveMode,
        pending: &PendingResolution,
        on_progress: &mut F,
    ) -> ResolutionOutcome
    where
        F: FnMut(&str),
    {
        report(on_progress, "Checking for redirect (HEAD)...");
        let head = match self.probe(ProbeMethod::Head, request_url, pending).await {
            Ok(r) => r,
            Err(e) => return ResolutionOutcome::failed(e.into()),
        };
        if let Some(outcome) = check_response(&head, request_url, ResolutionMethod::Direct) {
            return outcome;
        }

        report(on_progress, "Fetching page (GET)...");
        let get = match self.probe(ProbeMethod::Get, request_url, pending).await {
            Ok(r) => r,
            Err(e) => return ResolutionOutcome::failed(e.into()),
        };
        if let Some(outcome) = check_response(&get, request_url, ResolutionMethod::Get) {
            return outcome;
        }

        if mode == ResolveMode::Http {
            return ResolutionOutcome::failed(FailureReason::RequiresInteraction);
        }

        report(on_progress, "Inspecting page for redirects...");
        let body = get.body.as_deref().unwrap_or_default();
        inspect_html(body, request_url)
            .unwrap_or_else(|| ResolutionOutcome::failed(FailureReason::RequiresInteraction))
    }

    async fn probe(
        &self,
        method: ProbeMethod,
        url: &Url,
        pending: &PendingResolution,
    ) -> Result<ProbeResponse, FetchError> {
        let request = ProbeRequest {
            method,
            url: url.to_string(),
            user_agent: self.options.user_agent.clone(),
        };
        let client = Arc::clone(&self.client);
        let token = pending.token();
        tracing::debug!(method = method.as_str(), url = %request.url, "probing");
        tokio::task::spawn_blocking(move || client.fetch(&request, &token))
            .await
            .map_err(|e| FetchError::Transport(format!("probe task failed: {e}")))?
    }
}

fn parse_target(url: &str) -> Result<Url, FailureReason> {
    let parsed = Url::parse(url.trim()).map_err(|e| FailureReason::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FailureReason::InvalidUrl(format!("unsupported scheme {other}"))),
    }
}

/// `Some` when this stage settles the attempt: redirected, or a non-200 status.
fn check_response(
    response: &ProbeResponse,
    request_url: &Url,
    method: ResolutionMethod,
) -> Option<ResolutionOutcome> {
    if !response.final_url.is_empty() && response.final_url != request_url.as_str() {
        return Some(ResolutionOutcome::resolved(response.final_url.clone(), method));
    }
    if response.status != 200 {
        return Some(ResolutionOutcome::failed(FailureReason::UnexpectedStatus(
            response.status,
        )));
    }
    None
}

fn inspect_html(body: &str, request_url: &Url) -> Option<ResolutionOutcome> {
    if let Some(target) =
        html::find_meta_refresh(body).and_then(|t| html::resolve_against(request_url, &t))
    {
        return Some(ResolutionOutcome::resolved(
            target.to_string(),
            ResolutionMethod::MetaRefresh,
        ));
    }
    html::find_script_redirect(body)
        .and_then(|t| html::resolve_against(request_url, &t))
        .map(|target| ResolutionOutcome::resolved(target.to_string(), ResolutionMethod::Script))
}

/// Progress is UI feedback only; a panicking callback must not abort resolution.
fn report<F: FnMut(&str)>(on_progress: &mut F, status: &str) {
    if catch_unwind(AssertUnwindSafe(|| on_progress(status))).is_err() {
        tracing::warn!(status, "progress callback panicked; continuing");
    }
}

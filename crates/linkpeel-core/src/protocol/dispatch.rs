//! Routes protocol requests to the platform host and the resolver.

use anyhow::Result;
use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{parse_request, ProtocolError, Request, Response};
use crate::cache::DecodeCache;
use crate::decoder::{DecodeResult, Decoder};
use crate::resolver::{ResolutionOutcome, ResolveMode, ShortenerResolver};

/// Platform side effects the core cannot perform itself (browser, windows, UI).
pub trait Host: Send + Sync {
    fn open_url(&self, url: &str) -> Result<()>;
    fn show_popup(&self, original: &str, clean: &str) -> Result<()>;
    /// Receives `resolutionProgress` statuses.
    fn progress(&self, status: &str);
}

/// What the UI should do with a clicked link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Not obfuscated; let navigation proceed.
    Navigate,
    /// Cancel navigation and confirm the unwrapped destination with the user.
    Confirm { original: String, clean: String },
    /// Cancel navigation and offer to resolve the shortener.
    OfferResolve { url: String, service: String },
}

pub struct Dispatcher<H> {
    host: H,
    resolver: ShortenerResolver,
    decoder: Decoder,
    cache: DecodeCache,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(host: H, resolver: ShortenerResolver) -> Self {
        Self::with_decoder(host, resolver, Decoder::builtin().clone())
    }

    pub fn with_decoder(host: H, resolver: ShortenerResolver, decoder: Decoder) -> Self {
        Self {
            host,
            resolver,
            decoder,
            cache: DecodeCache::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Decodes an href, memoized per href.
    pub fn decode(&self, href: &str) -> DecodeResult {
        self.cache.get_or_decode(href, |h| self.decoder.decode(h))
    }

    /// Classifies a clicked link before navigation proceeds.
    pub fn intercept_click(&self, href: &str) -> ClickAction {
        match self.decode(href) {
            DecodeResult::Wrapped { original_url, .. } if original_url != href => ClickAction::Confirm {
                original: href.to_string(),
                clean: original_url,
            },
            DecodeResult::Shortened { service, .. } => ClickAction::OfferResolve {
                url: href.to_string(),
                service,
            },
            _ => ClickAction::Navigate,
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        tracing::debug!(action = request.action(), "handling request");
        match request {
            Request::OpenUrl { url } => match self.host.open_url(&url) {
                Ok(()) => Response::done(),
                Err(e) => {
                    tracing::warn!(%url, "open url failed: {:#}", e);
                    Response::err(e.to_string())
                }
            },
            Request::ShowPopup { original, clean } => match self.host.show_popup(&original, &clean) {
                Ok(()) => Response::done(),
                Err(e) => Response::err(e.to_string()),
            },
            Request::ResolveShortener { url, method } => self.resolve(&url, method).await,
            Request::ResolutionProgress { status } => {
                self.host.progress(&status);
                Response::done()
            }
        }
    }

    async fn resolve(&self, url: &str, mode: ResolveMode) -> Response {
        let outcome = self
            .resolver
            .resolve_with_mode(url, mode, |status| self.host.progress(status))
            .await;
        match outcome {
            ResolutionOutcome::Resolved { final_url, method } => Response::ok(json!({
                "finalUrl": final_url,
                "method": method,
            })),
            ResolutionOutcome::Failed { reason } => Response::err(reason.to_string()),
        }
    }

    /// Serves newline-delimited JSON: one request per input line, one response per output line.
    ///
    /// Malformed lines are answered with an error envelope; blank lines are skipped.
    pub async fn serve_lines<R, W>(&self, reader: R, mut writer: W) -> Result<usize, ProtocolError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut handled = 0usize;
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let response = match parse_request(line) {
                Ok(request) => self.handle(request).await,
                Err(e) => {
                    tracing::warn!("rejecting request: {}", e);
                    Response::err(e.to_string())
                }
            };
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
            handled += 1;
        }
        Ok(handled)
    }
}

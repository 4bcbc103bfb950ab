//! libcurl-backed [`HttpClient`].
//!
//! HEAD uses `nobody`, GET captures the body up to a byte cap. Redirects are
//! followed by curl and only the effective URL is reported. The transfer polls
//! the cancel token from the progress callback and aborts once it is set.

use std::time::Duration;

use super::client::{CancelToken, FetchError, HttpClient, ProbeMethod, ProbeRequest, ProbeResponse};
use super::ResolverOptions;

/// Classify a curl error into the resolver's failure kinds.
pub fn classify_curl_error(e: &curl::Error) -> FetchError {
    if e.is_operation_timedout() {
        return FetchError::Timeout;
    }
    if e.is_aborted_by_callback() {
        return FetchError::Cancelled;
    }
    FetchError::Transport(e.to_string())
}

impl From<curl::Error> for FetchError {
    fn from(e: curl::Error) -> Self {
        classify_curl_error(&e)
    }
}

#[derive(Debug, Clone)]
pub struct CurlClient {
    connect_timeout: Duration,
    timeout: Duration,
    max_redirects: u32,
    max_body_bytes: usize,
}

impl CurlClient {
    pub fn new(options: &ResolverOptions) -> Self {
        Self {
            connect_timeout: options.connect_timeout,
            timeout: options.timeout,
            max_redirects: options.max_redirects,
            max_body_bytes: options.max_body_bytes,
        }
    }
}

impl Default for CurlClient {
    fn default() -> Self {
        Self::new(&ResolverOptions::default())
    }
}

impl HttpClient for CurlClient {
    fn fetch(&self, request: &ProbeRequest, cancel: &CancelToken) -> Result<ProbeResponse, FetchError> {
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        let limit = self.max_body_bytes;

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        match request.method {
            ProbeMethod::Head => easy.nobody(true)?,
            ProbeMethod::Get => easy.get(true)?,
        }
        easy.follow_location(true)?;
        easy.max_redirections(self.max_redirects)?;
        easy.useragent(&request.user_agent)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.progress(true)?;

        // Never serve a cached redirect answer.
        let mut list = curl::easy::List::new();
        list.append("Cache-Control: no-cache")?;
        list.append("Pragma: no-cache")?;
        easy.http_headers(list)?;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.progress_function(|_, _, _, _| !cancel.is_cancelled())?;
            transfer.write_function(|data| {
                let room = limit.saturating_sub(body.len());
                if data.len() > room {
                    body.extend_from_slice(&data[..room]);
                    truncated = true;
                    return Ok(0); // stop reading; enough for pattern matching
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Err(e) = performed {
            if !(e.is_write_error() && truncated) {
                return Err(classify_curl_error(&e));
            }
        }
        if truncated {
            tracing::debug!(url = %request.url, limit, "response body truncated");
        }

        let status = easy.response_code()?;
        let final_url = easy
            .effective_url()?
            .map(str::to_string)
            .unwrap_or_else(|| request.url.clone());
        let body = match request.method {
            ProbeMethod::Head => None,
            ProbeMethod::Get => Some(String::from_utf8_lossy(&body).into_owned()),
        };

        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            %final_url,
            status,
            "probe finished"
        );

        Ok(ProbeResponse {
            final_url,
            status,
            body,
        })
    }
}

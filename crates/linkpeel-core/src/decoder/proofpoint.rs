//! Proofpoint URL Defense payloads.
//!
//! Three layouts are tried in order:
//! - v2: `/v2/url?u=<payload>` where `_` stands for `/` and `-` for `%`;
//! - v3: `/v3/__<payload>__;<signature>$` with a plain percent-encoded payload;
//! - a bare `url` query parameter.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::payload::{decode_uri_component, is_http_url};
use super::rules::{first_http_param, query_param};

static V3_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/v3/__(.+?)__").expect("valid regex"));

pub(crate) fn extract(parsed: &Url) -> Option<String> {
    if let Some(found) = query_param(parsed, "u").and_then(|u| decode_v2(&u)) {
        return Some(found);
    }
    if let Some(found) = v3_payload(parsed.path()).and_then(decode_v3) {
        return Some(found);
    }
    first_http_param(parsed, &["url"])
}

/// Undo the v2 substitution alphabet, then percent-decode.
pub fn decode_v2(encoded: &str) -> Option<String> {
    let substituted: String = encoded
        .chars()
        .map(|c| match c {
            '_' => '/',
            '-' => '%',
            other => other,
        })
        .collect();
    decode_uri_component(&substituted).filter(|decoded| is_http_url(decoded))
}

pub fn decode_v3(payload: &str) -> Option<String> {
    decode_uri_component(payload).filter(|decoded| is_http_url(decoded))
}

fn v3_payload(path: &str) -> Option<&str> {
    V3_PATH
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

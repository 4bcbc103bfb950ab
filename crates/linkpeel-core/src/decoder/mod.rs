//! Wrapper decoder: classifies a link as wrapped by an email-security gateway,
//! shortened by a link shortener, or neither.
//!
//! Decoding is a pure function of the input and the static tables. It never
//! fails: unparseable input and extraction failures both degrade to
//! [`DecodeResult::NotObfuscated`].

pub mod payload;
pub mod proofpoint;
pub mod rules;
pub mod safelinks;

use once_cell::sync::Lazy;
use serde::Serialize;
use url::Url;

use crate::shortener::ShortenerRegistry;
pub use rules::{Extractor, HostMatch, WrapperRule, BUILTIN_RULES};

/// Classification of one input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DecodeResult {
    /// Rewritten by a URL-protection gateway; `original_url` is the destination.
    #[serde(rename_all = "camelCase")]
    Wrapped {
        service: &'static str,
        original_url: String,
    },
    /// Host belongs to a known shortener; `service` is the registry domain.
    Shortened { service: String, hostname: String },
    NotObfuscated,
}

impl DecodeResult {
    pub fn is_obfuscated(&self) -> bool {
        !matches!(self, DecodeResult::NotObfuscated)
    }

    /// The recovered destination, for wrapped links only.
    pub fn original_url(&self) -> Option<&str> {
        match self {
            DecodeResult::Wrapped { original_url, .. } => Some(original_url),
            _ => None,
        }
    }
}

/// Rule table plus shortener registry.
#[derive(Debug, Clone)]
pub struct Decoder {
    rules: &'static [WrapperRule],
    shorteners: ShortenerRegistry,
}

static BUILTIN: Lazy<Decoder> = Lazy::new(|| Decoder::new(BUILTIN_RULES, ShortenerRegistry::builtin()));

/// Decodes `raw` with the built-in tables.
pub fn decode(raw: &str) -> DecodeResult {
    BUILTIN.decode(raw)
}

/// Service label of the first wrapper rule whose host predicate matches `raw`.
pub fn identify_service(raw: &str) -> Option<&'static str> {
    BUILTIN.identify_service(raw)
}

impl Decoder {
    pub fn new(rules: &'static [WrapperRule], shorteners: ShortenerRegistry) -> Self {
        Self { rules, shorteners }
    }

    /// The shared decoder over the built-in tables.
    pub fn builtin() -> &'static Decoder {
        &BUILTIN
    }

    pub fn rules(&self) -> &'static [WrapperRule] {
        self.rules
    }

    pub fn shorteners(&self) -> &ShortenerRegistry {
        &self.shorteners
    }

    pub fn decode(&self, raw: &str) -> DecodeResult {
        let raw = raw.trim();
        let Ok(parsed) = Url::parse(raw) else {
            return DecodeResult::NotObfuscated;
        };
        let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
            return DecodeResult::NotObfuscated;
        };

        if let Some(rule) = self.matching_rule(&host) {
            // First host match is used exclusively, even if extraction fails.
            return match rule.extractor.extract(raw, &parsed) {
                Some(original_url) => {
                    tracing::debug!(service = rule.service, %original_url, "unwrapped link");
                    DecodeResult::Wrapped {
                        service: rule.service,
                        original_url,
                    }
                }
                None => {
                    tracing::debug!(service = rule.service, url = raw, "wrapper matched, nothing to extract");
                    DecodeResult::NotObfuscated
                }
            };
        }

        match self.shorteners.lookup(&host) {
            Some(domain) => DecodeResult::Shortened {
                service: domain.to_string(),
                hostname: host,
            },
            None => DecodeResult::NotObfuscated,
        }
    }

    pub fn identify_service(&self, raw: &str) -> Option<&'static str> {
        let parsed = Url::parse(raw.trim()).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        self.matching_rule(&host).map(|rule| rule.service)
    }

    fn matching_rule(&self, host: &str) -> Option<&'static WrapperRule> {
        self.rules.iter().find(|rule| rule.matches_host(host))
    }
}

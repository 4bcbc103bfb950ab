//! Memoized decode results keyed by the original href.
//!
//! Owned by the caller (UI glue, dispatcher); the decoder itself stays pure.
//! Only hrefs that actually decode to something else are remembered.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::decoder::DecodeResult;

#[derive(Debug, Default)]
pub struct DecodeCache {
    entries: RwLock<HashMap<String, DecodeResult>>,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, href: &str) -> Option<DecodeResult> {
        self.entries.read().ok()?.get(href).cloned()
    }

    /// Returns the cached result for `href`, or runs `decode` and caches an obfuscated result.
    pub fn get_or_decode<F>(&self, href: &str, decode: F) -> DecodeResult
    where
        F: FnOnce(&str) -> DecodeResult,
    {
        if let Some(hit) = self.get(href) {
            return hit;
        }
        let result = decode(href);
        let worth_caching = match &result {
            DecodeResult::Wrapped { original_url, .. } => original_url != href,
            DecodeResult::Shortened { .. } => true,
            DecodeResult::NotObfuscated => false,
        };
        if worth_caching {
            if let Ok(mut entries) = self.entries.write() {
                entries.insert(href.to_string(), result.clone());
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

//! Message scanning: find the links in an HTML or plain-text body and report
//! which of them are wrapped or shortened.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::decoder::{DecodeResult, Decoder};

static HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhttps?://[^\s"'<>]+"#).expect("valid regex"));

/// One link found in the body, with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub link: String,
    pub result: DecodeResult,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub total_links: usize,
    /// Links whose host belongs to a protection service, decodable or not.
    pub protected_links: usize,
    pub findings: Vec<Finding>,
}

impl ScanReport {
    pub fn wrapped(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| matches!(f.result, DecodeResult::Wrapped { .. }))
    }

    pub fn shortened(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| matches!(f.result, DecodeResult::Shortened { .. }))
    }

    /// Banner text, e.g. "2 obfuscated links detected"; `None` when nothing was found.
    pub fn warning_label(&self) -> Option<String> {
        match self.protected_links {
            0 => None,
            1 => Some("1 obfuscated link detected".to_string()),
            n => Some(format!("{n} obfuscated links detected")),
        }
    }
}

/// Distinct link targets in document order: `href` attributes first, then bare URLs.
pub fn extract_links(body: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let hrefs = HREF
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim().replace("&amp;", "&"));
    let bare = BARE_URL
        .find_iter(body)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ')']).replace("&amp;", "&"));
    hrefs
        .chain(bare)
        .filter(|link| !link.is_empty())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

pub fn scan_text(body: &str) -> ScanReport {
    scan_text_with(Decoder::builtin(), body)
}

pub fn scan_text_with(decoder: &Decoder, body: &str) -> ScanReport {
    let links = extract_links(body);
    let mut report = ScanReport {
        total_links: links.len(),
        ..ScanReport::default()
    };
    for link in links {
        if decoder.identify_service(&link).is_some() {
            report.protected_links += 1;
        }
        let result = decoder.decode(&link);
        if result.is_obfuscated() {
            report.findings.push(Finding { link, result });
        }
    }
    tracing::debug!(
        total = report.total_links,
        protected = report.protected_links,
        findings = report.findings.len(),
        "scanned message body"
    );
    report
}

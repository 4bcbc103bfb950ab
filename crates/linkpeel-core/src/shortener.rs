//! Registry of known link-shortener hosts.

use std::collections::BTreeSet;

/// Built-in shortener domains.
pub const BUILTIN_SHORTENERS: &[&str] = &[
    "adf.ly",
    "aka.ms",
    "amzn.to",
    "bit.do",
    "bit.ly",
    "bitly.com",
    "bl.ink",
    "buff.ly",
    "clck.ru",
    "cutt.ly",
    "dlvr.it",
    "fb.me",
    "goo.gl",
    "is.gd",
    "lnkd.in",
    "ow.ly",
    "qr.ae",
    "rb.gy",
    "rebrand.ly",
    "s.id",
    "shorturl.at",
    "snip.ly",
    "t.co",
    "t.ly",
    "tiny.cc",
    "tinyurl.com",
    "tr.im",
    "trib.al",
    "v.gd",
    "youtu.be",
];

/// Set of shortener domains; a host matches a domain exactly or as a subdomain.
#[derive(Debug, Clone, Default)]
pub struct ShortenerRegistry {
    domains: BTreeSet<String>,
}

impl ShortenerRegistry {
    pub fn builtin() -> Self {
        Self::from_domains(BUILTIN_SHORTENERS.iter().copied())
    }

    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .filter_map(|d| normalize(d.as_ref()))
            .collect();
        Self { domains }
    }

    /// Built-in domains plus `extra` (e.g. from configuration).
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.domains
            .extend(extra.into_iter().filter_map(|d| normalize(d.as_ref())));
        self
    }

    /// Returns the registry domain `host` belongs to.
    ///
    /// When several entries match (e.g. `bit.ly` and `go.bit.ly`), the longest wins.
    pub fn lookup(&self, host: &str) -> Option<&str> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.domains
            .iter()
            .filter(|domain| {
                host == domain.as_str()
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .max_by_key(|domain| domain.len())
            .map(String::as_str)
    }

    pub fn contains(&self, host: &str) -> bool {
        self.lookup(host).is_some()
    }

    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

fn normalize(domain: &str) -> Option<String> {
    let d = domain.trim().trim_start_matches('.').trim_end_matches('.');
    if d.is_empty() {
        None
    } else {
        Some(d.to_ascii_lowercase())
    }
}

//! Declarative wrapper-service table.
//!
//! Order matters: the first rule whose host predicate matches is the only one
//! consulted for a given URL.

use url::Url;

use super::payload::{decode_uri_component, is_http_url};
use super::{proofpoint, safelinks};

/// Host predicate of a wrapper rule. Hostnames are lower-cased before matching.
#[derive(Debug, Clone, Copy)]
pub enum HostMatch {
    /// Host contains any of the substrings.
    Contains(&'static [&'static str]),
    /// Host contains every one of the substrings.
    AllOf(&'static [&'static str]),
    /// Host equals the domain or is a subdomain of it.
    Suffix(&'static str),
}

impl HostMatch {
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostMatch::Contains(needles) => needles.iter().any(|n| host.contains(n)),
            HostMatch::AllOf(needles) => needles.iter().all(|n| host.contains(n)),
            HostMatch::Suffix(domain) => {
                host == *domain
                    || host
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            }
        }
    }
}

/// How a matched rule pulls the destination out of the wrapper URL.
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    /// First non-empty query parameter (in order) that decodes to `http(s)://`.
    Params(&'static [&'static str]),
    /// Proofpoint v2, then v3, then the `url` parameter.
    Proofpoint,
    /// Recursive Safe Links unwrapping (percent and base64 payload layers).
    SafeLinks,
}

impl Extractor {
    pub fn extract(&self, raw: &str, parsed: &Url) -> Option<String> {
        match self {
            Extractor::Params(names) => first_http_param(parsed, names),
            Extractor::Proofpoint => proofpoint::extract(parsed),
            Extractor::SafeLinks => safelinks::extract_original_url(raw),
        }
    }
}

/// One wrapper service: a label, a host predicate and an extraction strategy.
#[derive(Debug, Clone, Copy)]
pub struct WrapperRule {
    pub service: &'static str,
    pub hosts: HostMatch,
    pub extractor: Extractor,
}

impl WrapperRule {
    pub fn matches_host(&self, host: &str) -> bool {
        self.hosts.matches(host)
    }
}

pub const SAFE_LINKS_HOST: &str = "safelinks.protection.outlook.com";

const URL_U: &[&str] = &["url", "u"];

pub static BUILTIN_RULES: &[WrapperRule] = &[
    WrapperRule {
        service: "Microsoft Safe Links",
        hosts: HostMatch::Suffix(SAFE_LINKS_HOST),
        extractor: Extractor::SafeLinks,
    },
    WrapperRule {
        service: "Proofpoint URL Defense",
        hosts: HostMatch::Contains(&["urldefense.proofpoint.com", "urldefense.com"]),
        extractor: Extractor::Proofpoint,
    },
    WrapperRule {
        service: "Mimecast URL Protect",
        hosts: HostMatch::AllOf(&["protect", "mimecast"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Barracuda Link Protection",
        hosts: HostMatch::Contains(&["barracuda", "linkprotect.cudasvc.com"]),
        extractor: Extractor::Params(&["url", "u", "a"]),
    },
    WrapperRule {
        service: "Cisco Secure Email",
        hosts: HostMatch::Contains(&["cisco", "iphmx.com"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Check Point Harmony",
        hosts: HostMatch::Contains(&["checkpoint", "urlsand.net"]),
        extractor: Extractor::Params(&["url", "u", "dest"]),
    },
    WrapperRule {
        service: "Egress Defend",
        hosts: HostMatch::Contains(&["egress"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Symantec/Broadcom",
        hosts: HostMatch::Contains(&["symantec", "messagelabs", "broadcom"]),
        extractor: Extractor::Params(&["url", "u", "continue"]),
    },
    WrapperRule {
        service: "Sophos Email Security",
        hosts: HostMatch::Contains(&["sophos", "sandboxsafe.com"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Trend Micro",
        hosts: HostMatch::Contains(&["trendmicro", "tmurl.net"]),
        extractor: Extractor::Params(&["url", "u", "URL"]),
    },
    WrapperRule {
        service: "Trustwave MailMarshal",
        hosts: HostMatch::Contains(&["trustwave", "mailmarshal"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "PostOffice",
        hosts: HostMatch::Contains(&["postoffice", "po.mx"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Intermedia",
        hosts: HostMatch::Contains(&["intermedia"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "Hornetsecurity ATP",
        hosts: HostMatch::Contains(&["hornetsecurity", "atpurl.com"]),
        extractor: Extractor::Params(URL_U),
    },
    WrapperRule {
        service: "OpenText/EdgePilot",
        hosts: HostMatch::Contains(&["opentext", "edgepilot", "websense"]),
        extractor: Extractor::Params(&["url", "u", "dest"]),
    },
    WrapperRule {
        service: "FireEye/Trellix",
        hosts: HostMatch::Contains(&["fireeye", "trellix", "mandiant"]),
        extractor: Extractor::Params(URL_U),
    },
    // Catch-all for small or unknown vendors.
    WrapperRule {
        service: "Generic URL Protection",
        hosts: HostMatch::Contains(&[
            "urlprotect",
            "linkprotect",
            "urldefense",
            "safeurl",
            "securemail",
            "maildefense",
        ]),
        extractor: Extractor::Params(&["url", "u", "dest", "destination", "target", "link"]),
    },
];

/// Reads the first non-empty parameter among `names` that yields an `http(s)://` URL.
///
/// Query parsing already percent-decodes once; a second strict decode is tried
/// for payloads that were encoded twice.
pub(crate) fn first_http_param(parsed: &Url, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        let value = query_param(parsed, name)?;
        if is_http_url(&value) {
            return Some(value);
        }
        decode_uri_component(&value).filter(|decoded| is_http_url(decoded))
    })
}

/// First non-empty value of a query parameter (case-sensitive name).
pub(crate) fn query_param(parsed: &Url, name: &str) -> Option<String> {
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_match_requires_label_boundary() {
        let m = HostMatch::Suffix(SAFE_LINKS_HOST);
        assert!(m.matches("safelinks.protection.outlook.com"));
        assert!(m.matches("nam12.safelinks.protection.outlook.com"));
        assert!(!m.matches("evilsafelinks.protection.outlook.com"));
        assert!(!m.matches("safelinks.protection.outlook.com.evil.net"));
    }

    #[test]
    fn all_of_needs_every_needle() {
        let m = HostMatch::AllOf(&["protect", "mimecast"]);
        assert!(m.matches("protect-eu.mimecast.com"));
        assert!(!m.matches("www.mimecast.com"));
    }

    #[test]
    fn safe_links_rule_is_first_and_catch_all_is_last() {
        assert_eq!(BUILTIN_RULES[0].service, "Microsoft Safe Links");
        assert_eq!(BUILTIN_RULES[1].service, "Proofpoint URL Defense");
        let last = BUILTIN_RULES.last().unwrap();
        assert_eq!(last.service, "Generic URL Protection");
    }

    #[test]
    fn service_labels_are_unique() {
        for (i, a) in BUILTIN_RULES.iter().enumerate() {
            for b in &BUILTIN_RULES[i + 1..] {
                assert_ne!(a.service, b.service);
            }
        }
    }

    #[test]
    fn first_http_param_skips_non_urls() {
        let parsed =
            Url::parse("https://x.test/?url=not-a-url&u=https%3A%2F%2Fexample.com%2Fok").unwrap();
        assert_eq!(
            first_http_param(&parsed, &["url", "u"]).as_deref(),
            Some("https://example.com/ok")
        );
    }

    #[test]
    fn first_http_param_handles_double_encoding() {
        let parsed = Url::parse("https://x.test/?dest=https%253A%252F%252Fexample.com").unwrap();
        assert_eq!(
            first_http_param(&parsed, &["dest"]).as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn query_param_ignores_empty_values() {
        let parsed = Url::parse("https://x.test/?url=&u=https://a.example").unwrap();
        assert!(query_param(&parsed, "url").is_none());
        assert_eq!(query_param(&parsed, "u").as_deref(), Some("https://a.example"));
    }
}

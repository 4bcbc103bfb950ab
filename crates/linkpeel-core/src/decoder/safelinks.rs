//! Recursive Microsoft Safe Links unwrapping.
//!
//! Safe Links hrefs and payloads are sometimes percent-encoded more than once
//! or base64 encoded. The unwrapper walks a bounded worklist of candidate
//! strings, expanding each into its percent-decoded and base64-decoded
//! variants until one of them is a Safe Links URL carrying a usable
//! destination. One layer is removed per call.

use std::collections::{HashSet, VecDeque};

use url::Url;

use super::payload::{is_httpish, lenient_decode, maybe_decode_base64};
use super::rules::{query_param, HostMatch, SAFE_LINKS_HOST};

/// Upper bound on candidates examined for one href.
pub const MAX_EXPANSIONS: usize = 16;

pub fn is_safe_link_host(host: &str) -> bool {
    HostMatch::Suffix(SAFE_LINKS_HOST).matches(&host.to_ascii_lowercase())
}

/// Returns the destination behind a Safe Links href.
///
/// The first http-ish payload is returned as-is, even when it is another
/// Safe Links URL; only payloads that are not yet http-ish are expanded. Accepts `http:`, `https:` and `mailto:` destinations. Returns `None` when
/// nothing usable is found within [`MAX_EXPANSIONS`] candidates.
pub fn extract_original_url(raw_href: &str) -> Option<String> {
    if raw_href.is_empty() {
        return None;
    }
    let mut queue: VecDeque<String> = VecDeque::from([raw_href.to_string()]);
    let mut seen: HashSet<String> = HashSet::new();

    while let Some(current) = queue.pop_front() {
        if current.is_empty() || seen.contains(&current) {
            continue;
        }
        if seen.len() >= MAX_EXPANSIONS {
            tracing::debug!(href = raw_href, "safe links expansion limit reached");
            break;
        }
        seen.insert(current.clone());

        let decoded = lenient_decode(&current);
        if decoded != current && !seen.contains(&decoded) {
            queue.push_back(decoded);
        }
        if let Some(b64) = maybe_decode_base64(&current) {
            if !seen.contains(&b64) {
                queue.push_back(b64);
            }
        }

        let Ok(parsed) = Url::parse(&current) else {
            continue;
        };
        if !parsed.host_str().is_some_and(is_safe_link_host) {
            continue;
        }

        let payload = query_param(&parsed, "url").or_else(|| query_param(&parsed, "u"));
        let Some(payload) = payload else {
            continue;
        };
        match decode_payload(&payload) {
            Some(original) => return Some(original),
            None => {
                if !seen.contains(&payload) {
                    queue.push_back(payload);
                }
            }
        }
    }

    None
}

/// The payload as-is, percent-decoded, or base64-decoded; first http-ish wins.
fn decode_payload(raw: &str) -> Option<String> {
    let candidates = [
        Some(raw.to_string()),
        Some(lenient_decode(raw)),
        maybe_decode_base64(raw),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|c| c.trim().to_string())
        .find(|c| is_httpish(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SL: &str = "https://nam12.safelinks.protection.outlook.com/";

    #[test]
    fn plain_payload() {
        let href = format!("{SL}?url=https%3A%2F%2Fexample.com%2Fpath&data=05%7C01&reserved=0");
        assert_eq!(
            extract_original_url(&href).as_deref(),
            Some("https://example.com/path")
        );
    }

    #[test]
    fn u_parameter_fallback() {
        let href = format!("{SL}?u=http%3A%2F%2Fexample.org%2F");
        assert_eq!(
            extract_original_url(&href).as_deref(),
            Some("http://example.org/")
        );
    }

    #[test]
    fn base64_payload() {
        // base64("https://example.com/deep")
        let href = format!("{SL}?url=aHR0cHM6Ly9leGFtcGxlLmNvbS9kZWVw");
        assert_eq!(
            extract_original_url(&href).as_deref(),
            Some("https://example.com/deep")
        );
    }

    #[test]
    fn doubly_wrapped_link_stops_at_first_layer() {
        let inner = format!("{SL}?url=https%3A%2F%2Fexample.com%2Finner");
        let outer = format!(
            "https://eur01.safelinks.protection.outlook.com/?url={}",
            percent_encoding::utf8_percent_encode(&inner, percent_encoding::NON_ALPHANUMERIC)
        );
        assert_eq!(extract_original_url(&outer), Some(inner));
    }

    #[test]
    fn fully_percent_encoded_href() {
        let href = "https%3A%2F%2Fnam12.safelinks.protection.outlook.com%2F%3Furl%3Dhttps%253A%252F%252Fexample.com";
        assert_eq!(
            extract_original_url(href).as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn mailto_destination() {
        let href = format!("{SL}?url=mailto%3Ahelp%40example.com");
        assert_eq!(
            extract_original_url(&href).as_deref(),
            Some("mailto:help@example.com")
        );
    }

    #[test]
    fn missing_payload() {
        assert!(extract_original_url(&format!("{SL}?data=abc")).is_none());
        assert!(extract_original_url("").is_none());
    }

    #[test]
    fn other_hosts_are_ignored() {
        assert!(extract_original_url("https://example.com/?url=https%3A%2F%2Fa.test").is_none());
    }

    #[test]
    fn payload_pointing_at_safe_links_is_returned() {
        let href = format!("{SL}?url={}", "https%3A%2F%2Fsafelinks.protection.outlook.com%2F");
        assert_eq!(
            extract_original_url(&href).as_deref(),
            Some("https://safelinks.protection.outlook.com/")
        );
    }

    #[test]
    fn undecodable_payload_terminates() {
        let garbage = format!("{SL}?url=notaurlatallbutlong");
        assert!(extract_original_url(&garbage).is_none());
    }
}

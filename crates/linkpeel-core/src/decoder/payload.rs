//! Payload decoding helpers shared by the wrapper rules.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use percent_encoding::percent_decode_str;

/// Minimum length before a string is considered a base64 candidate.
const BASE64_MIN_LEN: usize = 12;

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Strict percent-decoding.
///
/// Returns `None` when a `%` is not followed by two hex digits or the decoded
/// bytes are not valid UTF-8.
pub fn decode_uri_component(value: &str) -> Option<String> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    percent_decode_str(value)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// `+` to space, then strict decode; the input is returned unchanged if decoding fails.
pub fn lenient_decode(value: &str) -> String {
    let spaced = value.replace('+', " ");
    decode_uri_component(&spaced).unwrap_or_else(|| value.to_string())
}

/// True for `http://` / `https://` (case-insensitive).
pub fn is_http_url(value: &str) -> bool {
    starts_with_ignore_case(value, "http://") || starts_with_ignore_case(value, "https://")
}

/// True for `http:`, `https:` or `mailto:` (case-insensitive).
pub fn is_httpish(value: &str) -> bool {
    starts_with_ignore_case(value, "http:")
        || starts_with_ignore_case(value, "https:")
        || starts_with_ignore_case(value, "mailto:")
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Heuristic base64 detection. Obvious URLs and mailto links are rejected.
pub fn looks_like_base64(value: &str) -> bool {
    let trimmed = value.trim();
    if is_httpish(trimmed) {
        return false;
    }
    trimmed.len() >= BASE64_MIN_LEN
        && trimmed.len() % 4 != 1
        && trimmed
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'_' | b'-'))
}

/// Decodes standard or URL-safe base64 into UTF-8 text, if it looks like base64 at all.
pub fn maybe_decode_base64(value: &str) -> Option<String> {
    if !looks_like_base64(value) {
        return None;
    }
    let normalized: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let bytes = LENIENT_BASE64.decode(normalized.as_bytes()).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_decode_rejects_malformed_escapes() {
        assert_eq!(
            decode_uri_component("https%3A%2F%2Fexample.com").as_deref(),
            Some("https://example.com")
        );
        assert!(decode_uri_component("100%").is_none());
        assert!(decode_uri_component("%zz").is_none());
        assert!(decode_uri_component("%ff%fe").is_none());
    }

    #[test]
    fn lenient_decode_keeps_input_on_failure() {
        assert_eq!(lenient_decode("a+b%20c"), "a b c");
        assert_eq!(lenient_decode("50%off"), "50%off");
    }

    #[test]
    fn scheme_checks_ignore_case() {
        assert!(is_http_url("HTTPS://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https:example.com"));
        assert!(is_httpish("MailTo:someone@example.com"));
        assert!(!is_httpish("ht"));
    }

    #[test]
    fn base64_detection() {
        assert!(looks_like_base64("aHR0cHM6Ly9leGFtcGxlLmNvbQ"));
        assert!(!looks_like_base64("short"));
        assert!(!looks_like_base64("https://example.com/aaaaaaaa"));
        assert!(!looks_like_base64("has spaces in it!"));
        // length % 4 == 1 is never valid base64
        assert!(!looks_like_base64("aaaaaaaaaaaaa"));
    }

    #[test]
    fn base64_decodes_url_safe_without_padding() {
        // "https://example.com/?a=1" in URL-safe base64, padding stripped
        assert_eq!(
            maybe_decode_base64("aHR0cHM6Ly9leGFtcGxlLmNvbS8_YT0x").as_deref(),
            Some("https://example.com/?a=1")
        );
        assert_eq!(
            maybe_decode_base64("aHR0cHM6Ly9leGFtcGxlLmNvbQ==").as_deref(),
            Some("https://example.com")
        );
    }
}

//! Redirect targets embedded in HTML when the server does not redirect at HTTP level.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));

static HTTP_EQUIV_REFRESH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhttp-equiv\s*=\s*["']?\s*refresh\b"#).expect("valid regex"));

static CONTENT_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

static REFRESH_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|[;,])\s*url\s*=\s*['"]?([^'"]+)"#).expect("valid regex")
});

static SCRIPT_REDIRECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)window\.location(?:\.href)?\s*=\s*["']([^"']+)["']|window\.location\.replace\(\s*["']([^"']+)["']\s*\)"#,
    )
    .expect("valid regex")
});

/// Target of the first `<meta http-equiv="refresh" content="N;url=...">` tag.
///
/// Attribute order and quoting style do not matter.
pub fn find_meta_refresh(html: &str) -> Option<String> {
    META_TAG
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| HTTP_EQUIV_REFRESH.is_match(tag))
        .find_map(|tag| {
            let caps = CONTENT_ATTR.captures(tag)?;
            let content = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let target = REFRESH_URL.captures(content)?.get(1)?.as_str();
            clean_target(target)
        })
}

/// Target of the first `window.location = "..."`, `window.location.href = "..."`
/// or `window.location.replace("...")`.
pub fn find_script_redirect(html: &str) -> Option<String> {
    SCRIPT_REDIRECT.captures_iter(html).find_map(|caps| {
        let target = caps.get(1).or_else(|| caps.get(2))?.as_str();
        clean_target(target)
    })
}

/// Resolves a possibly relative target against the request URL; only http(s) results count.
pub fn resolve_against(base: &Url, target: &str) -> Option<Url> {
    base.join(target)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

fn clean_target(raw: &str) -> Option<String> {
    let t = raw.trim().replace("&amp;", "&");
    if t.is_empty() {
        None
    } else {
        Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_refresh_double_quotes() {
        let html = r#"<html><head><meta http-equiv="refresh" content="0;url=/foo"></head></html>"#;
        assert_eq!(find_meta_refresh(html).as_deref(), Some("/foo"));
    }

    #[test]
    fn meta_refresh_single_quotes_and_reordered_attributes() {
        let html = "<META CONTENT='5; URL=https://example.com/x?a=1&amp;b=2' HTTP-EQUIV='Refresh'>";
        assert_eq!(
            find_meta_refresh(html).as_deref(),
            Some("https://example.com/x?a=1&b=2")
        );
    }

    #[test]
    fn meta_refresh_with_quoted_url_value() {
        let html = r#"<meta http-equiv="refresh" content="0; url='https://example.com/q'">"#;
        assert_eq!(
            find_meta_refresh(html).as_deref(),
            Some("https://example.com/q")
        );
    }

    #[test]
    fn meta_without_refresh_is_ignored() {
        let html = r#"<meta name="description" content="url=https://example.com">
            <meta http-equiv="refresh" content="30">"#;
        assert!(find_meta_refresh(html).is_none());
    }

    #[test]
    fn script_redirect_variants() {
        assert_eq!(
            find_script_redirect(r#"<script>window.location = "https://a.example/1";</script>"#)
                .as_deref(),
            Some("https://a.example/1")
        );
        assert_eq!(
            find_script_redirect("<script>window.location.href='/two'</script>").as_deref(),
            Some("/two")
        );
        assert_eq!(
            find_script_redirect(r#"window.location.replace( "https://c.example/3" );"#).as_deref(),
            Some("https://c.example/3")
        );
        assert!(find_script_redirect("<script>console.log(window.location)</script>").is_none());
    }

    #[test]
    fn relative_resolution() {
        let base = Url::parse("https://sho.rt/abc").unwrap();
        assert_eq!(
            resolve_against(&base, "/foo").unwrap().as_str(),
            "https://sho.rt/foo"
        );
        assert_eq!(
            resolve_against(&base, "https://example.com/").unwrap().as_str(),
            "https://example.com/"
        );
        assert!(resolve_against(&base, "javascript:alert(1)").is_none());
    }
}

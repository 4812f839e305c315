//! URL sanitization.
//!
//! Strips fragments that would be dangerous if the URL were echoed into HTML
//! or a log viewer. Scheme and format checks run on the raw string before
//! this; sanitization never stands in for them.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script pattern compiles")
});

static JAVASCRIPT_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("javascript pattern compiles"));

static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)on\w+=").expect("event handler pattern compiles"));

fn sanitize_once(input: &str) -> String {
    let s = input.trim();
    let s = SCRIPT_BLOCK.replace_all(s, "");
    let s = JAVASCRIPT_SCHEME.replace_all(&s, "");
    let s = EVENT_HANDLER.replace_all(&s, "");
    s.trim().to_string()
}

/// Sanitize a URL string.
///
/// Repeats until nothing changes, so removals that splice a new match
/// together (`javajavascript:script:`) are also caught and the result is a
/// fixed point.
pub fn sanitize_url(input: &str) -> String {
    let mut current = sanitize_once(input);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_is_untouched() {
        let url = "https://example.com/images/cat.jpg?size=large";
        assert_eq!(sanitize_url(url), url);
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(
            sanitize_url("  https://example.com/cat.jpg \n"),
            "https://example.com/cat.jpg"
        );
    }

    #[test]
    fn test_removes_script_block() {
        let url = "https://example.com/cat.jpg<script>alert('x')</script>";
        assert_eq!(sanitize_url(url), "https://example.com/cat.jpg");

        let mixed = "https://example.com/a<SCRIPT type=\"text/javascript\">x</Script>.png";
        assert_eq!(sanitize_url(mixed), "https://example.com/a.png");
    }

    #[test]
    fn test_script_removal_stops_at_first_closing_tag() {
        let url = "https://example.com/<script>a</script>keep<script>b</script>.jpg";
        assert_eq!(sanitize_url(url), "https://example.com/keep.jpg");
    }

    #[test]
    fn test_removes_javascript_anywhere() {
        let url = "https://example.com/?next=JavaScript:alert(1)";
        assert_eq!(sanitize_url(url), "https://example.com/?next=alert(1)");
    }

    #[test]
    fn test_removes_event_handlers() {
        let url = "https://example.com/cat.jpg?onerror=alert(1)&onLoad=x";
        assert_eq!(sanitize_url(url), "https://example.com/cat.jpg?alert(1)&x");
    }

    #[test]
    fn test_spliced_fragments_are_removed() {
        assert_eq!(
            sanitize_url("https://example.com/?a=javajavascript:script:x"),
            "https://example.com/?a=x"
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "https://example.com/cat.jpg",
            " https://example.com/<script>x</script>?onclick=1 ",
            "https://example.com/?q=javascript:javascript:",
            "https://example.com/ononerror==1",
        ];
        for input in inputs {
            let once = sanitize_url(input);
            assert_eq!(sanitize_url(&once), once, "not a fixed point for {input:?}");
        }
    }
}

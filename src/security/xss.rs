//! XSS (Cross-Site Scripting) protection module
//!
//! Every piece of client supplied text is passed through [`sanitize_text`]
//! before it is echoed or relayed. The encoding never touches an entity it
//! produced itself, so sanitizing twice gives the same result as once.
//! Entities are emitted in lower case and recognized in any case, so
//! lowercasing encoded text (as nickname handling does) keeps it stable.

/// HTML entities for encoding special characters
const HTML_ENTITIES: &[(char, &str)] = &[
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#x27;"),
    ('/', "&#x2f;"),
    ('`', "&#x60;"),
];

/// Patterns worth a log line when they show up in chat text
const XSS_PATTERNS: &[&str] = &[
    "javascript:",
    "vbscript:",
    "<script",
    "</script",
    "onload=",
    "onclick=",
    "onerror=",
    "onmouseover=",
    "eval(",
];

/// Encode HTML special characters, leaving existing entities intact
pub fn encode_html(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        if ch == '&' && starts_with_entity(rest) {
            result.push('&');
        } else {
            match HTML_ENTITIES.iter().find(|(c, _)| *c == ch) {
                Some((_, entity)) => result.push_str(entity),
                None => result.push(ch),
            }
        }
        rest = &rest[ch.len_utf8()..];
    }

    result
}

/// Reverse [`encode_html`]: the text a client actually typed
pub fn decode_html(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(ch) = rest.chars().next() {
        match leading_entity(rest) {
            Some((decoded, entity)) => {
                result.push(decoded);
                rest = &rest[entity.len()..];
            }
            None => {
                result.push(ch);
                rest = &rest[ch.len_utf8()..];
            }
        }
    }

    result
}

fn starts_with_entity(input: &str) -> bool {
    leading_entity(input).is_some()
}

fn leading_entity(input: &str) -> Option<(char, &'static str)> {
    HTML_ENTITIES
        .iter()
        .find(|(_, entity)| {
            input
                .get(..entity.len())
                .map_or(false, |prefix| prefix.eq_ignore_ascii_case(entity))
        })
        .copied()
}

/// Strip control characters, trim, then HTML-encode
pub fn sanitize_text(input: &str) -> String {
    let visible: String = input
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect();

    encode_html(visible.trim())
}

/// Check if content contains potential XSS patterns
pub fn contains_xss_patterns(content: &str) -> bool {
    let content_lower = content.to_lowercase();
    XSS_PATTERNS
        .iter()
        .any(|pattern| content_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_encoding() {
        assert_eq!(
            encode_html("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;&#x2f;script&gt;"
        );
        assert_eq!(encode_html("Hello & goodbye"), "Hello &amp; goodbye");
        assert_eq!(encode_html("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_existing_entities_are_kept() {
        assert_eq!(encode_html("&amp; &lt;"), "&amp; &lt;");
        assert_eq!(encode_html("&copy;"), "&amp;copy;");
    }

    #[test]
    fn test_entities_match_any_case() {
        assert_eq!(encode_html("a&#x2F;b"), "a&#x2F;b");
        assert_eq!(encode_html(&encode_html("a/b").to_uppercase()), "A&#X2F;B");
        assert_eq!(encode_html("&AMP;"), "&AMP;");
    }

    #[test]
    fn test_decode_reverses_encode() {
        let samples = ["o'neil", "a/b", "<b>&</b>", "`x` \"y\"", "plain"];
        for sample in samples {
            assert_eq!(decode_html(&encode_html(sample)), sample);
        }
        assert_eq!(decode_html("&amp;lt;"), "&lt;");
        assert_eq!(decode_html("&#X2F;"), "/");
        assert_eq!(decode_html("&copy; & co"), "&copy; & co");
    }

    #[test]
    fn test_sanitize_survives_lowercasing() {
        for sample in ["A/B", "O'Neil", "<Tag>", "&Amp; `X`"] {
            let encoded = sanitize_text(sample).to_lowercase();
            assert_eq!(sanitize_text(&encoded), encoded, "input: {:?}", sample);
            assert_eq!(encoded, sanitize_text(&sample.to_lowercase()));
        }
    }

    #[test]
    fn test_sanitize_trims_and_strips_controls() {
        assert_eq!(sanitize_text("  hi\u{0}there \r\n"), "hithere");
        assert_eq!(sanitize_text("\t<b>\t"), "&lt;b&gt;");
        assert_eq!(sanitize_text("line one\nline two"), "line one\nline two");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "",
            "   ",
            "plain text",
            "<img src=x onerror=alert(1)>",
            "&&amp;&lt;<>",
            " `tick` 'quote' \"dq\" a/b ",
            "&#x27; already encoded",
            "\u{7}\u{85} odd whitespace \u{a0}",
            "emoji 🦀 & <friends>",
        ];
        for sample in samples {
            let once = sanitize_text(sample);
            assert_eq!(sanitize_text(&once), once, "input: {:?}", sample);
        }
    }

    #[test]
    fn test_xss_pattern_detection() {
        assert!(contains_xss_patterns("<SCRIPT>alert(1)</script>"));
        assert!(contains_xss_patterns("javascript:alert(1)"));
        assert!(!contains_xss_patterns("Hello world"));
    }
}

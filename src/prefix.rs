//! Contact tags at the start of copied text.
//!
//! Two forms are recognised, tried in order:
//!
//! * `[Alice] remainder` with 1 to 40 characters between the brackets
//! * `@alice remainder` or `#alice: remainder` restricted to word characters,
//!   hyphens and CJK ideographs

use once_cell::sync::Lazy;
use regex::Regex;

static BRACKET_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*\[([^\]]{1,40})\]\s*(.*)$").expect("valid regex"));

static MENTION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*[@#]([A-Za-z0-9_\-\x{4e00}-\x{9fff}]{1,40})\s*[:：]?\s*(.*)$")
        .expect("valid regex")
});

/// Longest contact name accepted, in characters.
pub const MAX_CONTACT_CHARS: usize = 40;

/// `name` trimmed, if it is a usable contact name of 1 to
/// [`MAX_CONTACT_CHARS`] characters.
pub fn contact_name(name: &str) -> Option<&str> {
    let name = name.trim();
    let len = name.chars().count();
    (1..=MAX_CONTACT_CHARS).contains(&len).then_some(name)
}

/// Result of [`parse_contact_tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagged<'a> {
    /// Contact named by the prefix, if any.
    pub contact: Option<String>,
    /// Text with the prefix removed. Untouched when no prefix matched.
    pub text: &'a str,
}

/// Split an optional contact prefix off `text`.
///
/// ```
/// use reply_helper::prefix::parse_contact_tag;
///
/// let tagged = parse_contact_tag("[Alice] hello");
/// assert_eq!(tagged.contact.as_deref(), Some("Alice"));
/// assert_eq!(tagged.text, "hello");
/// ```
pub fn parse_contact_tag(text: &str) -> Tagged<'_> {
    for re in [&*BRACKET_TAG, &*MENTION_TAG] {
        if let Some(caps) = re.captures(text) {
            let who = caps.get(1).map_or("", |m| m.as_str()).trim();
            let rest = caps.get(2).map_or("", |m| m.as_str()).trim();
            if !who.is_empty() {
                return Tagged {
                    contact: Some(who.to_string()),
                    text: rest,
                };
            }
        }
    }
    Tagged {
        contact: None,
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_names_are_trimmed_and_bounded() {
        assert_eq!(contact_name("  Ann "), Some("Ann"));
        assert_eq!(contact_name("   "), None);
        assert_eq!(contact_name(&"名".repeat(40)).map(|n| n.chars().count()), Some(40));
        assert_eq!(contact_name(&"x".repeat(41)), None);
    }

    fn parse(text: &str) -> (Option<String>, &str) {
        let t = parse_contact_tag(text);
        (t.contact, t.text)
    }

    #[test]
    fn bracket_prefix() {
        assert_eq!(parse("[Alice] hello"), (Some("Alice".into()), "hello"));
    }

    #[test]
    fn bracket_name_is_trimmed() {
        assert_eq!(parse("[ Bob Smith ]  hey "), (Some("Bob Smith".into()), "hey"));
    }

    #[test]
    fn mention_with_colon() {
        assert_eq!(parse("@bob: hi there"), (Some("bob".into()), "hi there"));
    }

    #[test]
    fn hash_with_fullwidth_colon() {
        assert_eq!(parse("#小明：你好"), (Some("小明".into()), "你好"));
    }

    #[test]
    fn mention_without_colon() {
        assert_eq!(parse("@team-lead ping"), (Some("team-lead".into()), "ping"));
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(parse("just text"), (None, "just text"));
    }

    #[test]
    fn empty_brackets_fall_through() {
        assert_eq!(parse("[] hi"), (None, "[] hi"));
        assert_eq!(parse("[   ] hi"), (None, "[   ] hi"));
    }

    #[test]
    fn remainder_may_span_lines() {
        assert_eq!(
            parse("[Carol]\nline one\nline two\n"),
            (Some("Carol".into()), "line one\nline two")
        );
    }

    #[test]
    fn overlong_bracket_name_is_not_a_tag() {
        let text = format!("[{}] hi", "x".repeat(41));
        assert_eq!(parse(&text), (None, text.as_str()));
    }

    #[test]
    fn prefix_only_leaves_empty_remainder() {
        assert_eq!(parse("@dave"), (Some("dave".into()), ""));
    }
}

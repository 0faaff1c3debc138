//! Deterministic intent matching for text turns.
//!
//! Utterances are normalized (lowercase, curly quotes folded, punctuation
//! stripped, whitespace collapsed) before matching. Anything that matches no
//! pattern is `Open` and goes to the completion backend.

use std::sync::LazyLock;

use regex::Regex;
use soma_types::identity::SELF_SUBJECT;

/// Phrases that ask about the most recent screenshot.
const RECALL_PHRASES: &[&str] = &[
    "last screenshot",
    "last screen shot",
    "previous screenshot",
    "what was on my screen",
    "what did you just see",
];

/// Words that cannot start a named subject.
const NAME_STOPWORDS: &[&str] = &["me", "my", "the", "a"];

/// Longest subject, in words, accepted from "this is <name>" / "that is <name>".
const MAX_NAME_WORDS: usize = 3;

static SELF_DEMONSTRATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(thats|that's|that is|this is)\s+me\b").expect("valid regex")
});

static SELF_DESCRIPTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(the\s+)?(man|woman|person|photo|picture|image)\b.*\b(is|was)\s+me\b")
        .expect("valid regex")
});

static NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:this|that) is\s+(.+)$").expect("valid regex")
});

/// What a text turn is asking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Describe the last screenshot from working memory.
    RecallLastScreenshot,
    /// Bind the last screenshot to `subject` (`"user"` for the speaker).
    AssertIdentity { subject: String },
    /// Ask who is in the last screenshot.
    QueryIdentity,
    /// Anything else.
    Open,
}

impl Intent {
    /// Short label used in message metadata and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::RecallLastScreenshot => "recall_last_screenshot",
            Intent::AssertIdentity { .. } => "assert_identity",
            Intent::QueryIdentity => "query_identity",
            Intent::Open => "open",
        }
    }

    pub fn is_deterministic(&self) -> bool {
        !matches!(self, Intent::Open)
    }
}

/// Fold curly quotes, replace anything that is not alphanumeric, whitespace
/// or an apostrophe with a space, and collapse runs of whitespace.
fn fold(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' => '\'',
            c if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '\'' => c,
            _ => ' ',
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, folded form used for matching.
pub fn normalize(text: &str) -> String {
    fold(&text.to_lowercase())
}

/// Classify a text turn.
pub fn classify(text: &str) -> Intent {
    let norm = normalize(text);

    if RECALL_PHRASES.iter().any(|p| norm.contains(p)) {
        return Intent::RecallLastScreenshot;
    }

    if SELF_DEMONSTRATIVE.is_match(&norm) || SELF_DESCRIPTIVE.is_match(&norm) {
        return Intent::AssertIdentity {
            subject: SELF_SUBJECT.to_string(),
        };
    }

    if let Some(subject) = named_subject(text) {
        return Intent::AssertIdentity { subject };
    }

    if norm.starts_with("who") {
        return Intent::QueryIdentity;
    }

    Intent::Open
}

/// A word written like a proper name: leading uppercase letter.
fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Extract `<name>` from "this is <name>" / "that is <name>", keeping case.
///
/// Every word of the name must be capitalized, so small talk such as
/// "that is right" stays an open turn.
fn named_subject(text: &str) -> Option<String> {
    let folded = fold(text);
    let caps = NAMED.captures(&folded)?;
    let name = caps.get(1)?.as_str().trim();
    let words: Vec<&str> = name.split(' ').collect();
    let first = words.first()?.to_lowercase();
    if NAME_STOPWORDS.contains(&first.as_str()) || words.len() > MAX_NAME_WORDS {
        return None;
    }
    if !words.iter().all(|w| is_capitalized(w)) {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asserts(subject: &str) -> Intent {
        Intent::AssertIdentity {
            subject: subject.to_string(),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  That\u{2019}s   ME!! "), "that's me");
        assert_eq!(normalize("Who?is-that"), "who is that");
    }

    #[test]
    fn test_self_assertions() {
        for text in [
            "that's me",
            "Thats me",
            "that is me!",
            "This is me.",
            "that\u{2019}s me",
            "yes, that's me",
            "the person in the photo is me",
            "The man on the left was me",
            "that picture is me",
        ] {
            assert_eq!(classify(text), asserts("user"), "{text}");
        }
    }

    #[test]
    fn test_named_assertions_keep_case() {
        assert_eq!(classify("that is Alice"), asserts("Alice"));
        assert_eq!(classify("This is Bob Smith."), asserts("Bob Smith"));
        assert_eq!(classify("this is O'Brien"), asserts("O'Brien"));
    }

    #[test]
    fn test_small_talk_is_not_an_assertion() {
        for text in [
            "That's right!",
            "that's great",
            "thats fine",
            "that's it",
            "that's Alice",
            "that is mary",
            "this is great",
            "That is Right now",
        ] {
            assert_eq!(classify(text), Intent::Open, "{text}");
        }
    }

    #[test]
    fn test_named_assertion_rejects_stopwords_and_long_phrases() {
        assert_eq!(classify("this is my desktop"), Intent::Open);
        assert_eq!(classify("that is the problem"), Intent::Open);
        assert_eq!(classify("this is a test"), Intent::Open);
        assert_eq!(
            classify("this is how you configure the build"),
            Intent::Open
        );
    }

    #[test]
    fn test_me_requires_word_boundary() {
        assert_eq!(classify("that's meme material"), Intent::Open);
        assert_ne!(classify("this is mesmerizing"), asserts("user"));
    }

    #[test]
    fn test_who_queries() {
        assert_eq!(classify("who is that"), Intent::QueryIdentity);
        assert_eq!(classify("Who's in the picture?"), Intent::QueryIdentity);
        assert_eq!(classify("tell me who that is"), Intent::Open);
    }

    #[test]
    fn test_recall_phrases() {
        assert_eq!(
            classify("What was on my screen?"),
            Intent::RecallLastScreenshot
        );
        assert_eq!(
            classify("describe the last screen-shot"),
            Intent::RecallLastScreenshot
        );
        assert_eq!(
            classify("who was in the previous screenshot"),
            Intent::RecallLastScreenshot
        );
    }

    #[test]
    fn test_open_questions() {
        assert_eq!(classify("how do I fix this error?"), Intent::Open);
        assert!(!classify("hello").is_deterministic());
        assert_eq!(Intent::QueryIdentity.label(), "query_identity");
    }
}

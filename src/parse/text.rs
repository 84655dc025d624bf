use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\w+)").expect("hashtag regex is hardcoded and valid"));

static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(\w+)").expect("mention regex is hardcoded and valid"));

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9']+").expect("word regex is hardcoded and valid"));

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "this", "that", "with", "from", "they", "will", "what",
    "when", "your", "about", "there", "their", "would", "which", "just", "into", "than", "them",
    "been", "how", "why", "who", "its", "did", "get", "got",
];

/// Hashtags in order of appearance, without the leading '#'
pub fn hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Mentions in order of appearance, without the leading '@'
pub fn mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Lowercased keywords of a title
///
/// Words of two characters or fewer and common stop-words are dropped.
pub fn title_words(title: &str) -> Vec<String> {
    WORD_RE
        .find_iter(title)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashtags_and_mentions() {
        let text = "Shipping #rust with @ferris and #tokio, thanks @alice!";
        assert_eq!(hashtags(text), vec!["rust", "tokio"]);
        assert_eq!(mentions(text), vec!["ferris", "alice"]);
        assert!(hashtags("no tags here").is_empty());
    }

    #[test]
    fn test_title_words_drop_short_and_stop_words() {
        let words = title_words("The Rust compiler is so fast and the borrow checker");
        assert_eq!(words, vec!["rust", "compiler", "fast", "borrow", "checker"]);
    }
}

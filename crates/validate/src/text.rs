use regex::Regex;
use std::sync::LazyLock;

static PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("parenthesis pattern"));
static INITIALISM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:\w\.){2,}$").expect("initialism pattern"));

const QUOTES: [char; 13] = [
    '"', '\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}', '\u{00AB}', '\u{00BB}', '\'', '\u{2018}',
    '\u{2019}', '\u{201A}', '\u{201B}', '`',
];

const ABBREVIATIONS: [&str; 14] = [
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "vs.", "fig.", "approx.", "ca.", "cf.", "no.",
];

/// Normalise text for comparison: drop parenthesised content, fold every
/// quote mark to `"`, drop ellipses, collapse whitespace, lowercase.
pub fn clean_text(text: &str) -> String {
    let text = PARENTHESIZED.replace_all(text, "");
    let text: String = text
        .replace("...", " ")
        .replace('\u{2026}', " ")
        .chars()
        .map(|c| if QUOTES.contains(&c) { '"' } else { c })
        .collect();

    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Split on `.`, `?` or `!` followed by whitespace, unless the last token
/// is a known abbreviation or an initialism like `e.g.`; then split every
/// sentence on semicolons.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() && matches!(prev, Some('.' | '?' | '!')) {
            let candidate = &text[start..idx];
            if !ends_with_abbreviation(candidate) {
                sentences.push(candidate);
                start = idx;
            }
        }
        prev = Some(ch);
    }
    sentences.push(&text[start..]);

    sentences
        .into_iter()
        .flat_map(|s| s.split(';'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn ends_with_abbreviation(candidate: &str) -> bool {
    let Some(token) = candidate.split_whitespace().last() else {
        return false;
    };
    if !token.ends_with('.') {
        return false;
    }
    let token = token.to_lowercase();
    ABBREVIATIONS.contains(&token.as_str()) || INITIALISM.is_match(&token)
}

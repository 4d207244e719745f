// Diary text normalization.

use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    brackets: Regex,
    punctuation: Regex,
    spaced_dash: Regex,
    digit_words: Regex,
    typographic: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        brackets: Regex::new(r"\[.*?\]").expect("static regex"),
        punctuation: Regex::new(r##"[!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~]"##).expect("static regex"),
        spaced_dash: Regex::new(" — ").expect("static regex"),
        digit_words: Regex::new(r"\w*\d\w*").expect("static regex"),
        typographic: Regex::new("[‘’“”…]").expect("static regex"),
    })
}

/// Joins diary paragraphs the way the corpus stores them.
pub fn join_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

fn clean_pass(text: &str) -> String {
    let p = patterns();
    let text = text.to_lowercase();
    let text = p.brackets.replace_all(&text, "");
    let text = p.punctuation.replace_all(&text, "");
    let text = p.spaced_dash.replace_all(&text, " ");
    let text = p.digit_words.replace_all(&text, "");
    let text = p.typographic.replace_all(&text, "");
    text.replace('\n', "")
}

/// Lowercases and strips brackets, punctuation, digit words, curly quotes
/// and newlines.
///
/// The steps run until the text stops changing: removing a quote or a digit
/// word can leave a fresh ` — ` behind, and a second call must be a no-op.
pub fn clean_text(text: &str) -> String {
    let mut current = clean_pass(text);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Splits cleaned text into word tokens.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

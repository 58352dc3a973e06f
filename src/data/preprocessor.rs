// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises debate transcripts before vectorizing.
//
// Cleaning steps (applied in order, per character):
//   1. Drop punctuation — every char in Unicode categories
//      P (punctuation) and S (symbols); this covers all of
//      ASCII punctuation such as . , ; : ! ? ' " ( ) - $ % &
//   2. Replace '\n' and '\r' with a plain space
//   3. Lowercase
//
// Lowercasing works char by char. A few characters lowercase
// to more than one char (e.g. 'İ' → "i̇"); only the first char of
// the expansion is kept, so the output never has more chars
// than the input.
//
// No trimming or whitespace collapsing happens here: the
// vectorizer's tokenizer ignores runs of whitespace anyway.
//
// Reference: Rust Book §8 (Strings in Rust)
//            regex crate documentation (Unicode classes)

use regex::Regex;
use std::sync::LazyLock;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{P}\p{S}]").expect("static punctuation pattern"));

/// Returns true for characters the preprocessor removes.
pub fn is_punctuation(c: char) -> bool {
    let mut buf = [0u8; 4];
    PUNCTUATION.is_match(c.encode_utf8(&mut buf))
}

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase, strip punctuation, turn line breaks into spaces.
    pub fn clean(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());

        for c in text.chars() {
            match c {
                '\n' | '\r' => out.push(' '),
                c if is_punctuation(c) => {}
                c => {
                    if let Some(lower) = c.to_lowercase().next() {
                        out.push(lower);
                    }
                }
            }
        }

        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let p = Preprocessor::new();
        assert_eq!(
            p.clean("The Minister said: \"No!\" (twice)."),
            "the minister said no twice"
        );
    }

    #[test]
    fn test_line_breaks_become_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("first line\r\nsecond\nthird"), "first line  second third");
    }

    #[test]
    fn test_symbols_and_unicode_punctuation_removed() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("£5 — “quoted” 50% + tax"), "5  quoted 50  tax");
        assert_eq!(p.clean("it’s"), "its");
    }

    #[test]
    fn test_keeps_digits_and_letters() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Clause 42B"), "clause 42b");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
    }

    #[test]
    fn test_multi_char_lowercase_does_not_grow() {
        let p = Preprocessor::new();
        let out = p.clean("İstanbul");
        assert_eq!(out.chars().count(), "İstanbul".chars().count());
        assert!(out.starts_with('i'));
    }

    proptest! {
        #[test]
        fn clean_output_has_no_punctuation_or_line_breaks(input in any::<String>()) {
            let out = Preprocessor::new().clean(&input);
            prop_assert!(!out.chars().any(is_punctuation));
            prop_assert!(!out.contains('\n'));
            prop_assert!(!out.contains('\r'));
        }

        #[test]
        fn clean_output_is_never_longer(input in any::<String>()) {
            let out = Preprocessor::new().clean(&input);
            prop_assert!(out.chars().count() <= input.chars().count());
        }

        #[test]
        fn clean_is_idempotent_on_ascii(input in "[ -~\n\r]{0,64}") {
            let p = Preprocessor::new();
            let once = p.clean(&input);
            prop_assert_eq!(p.clean(&once), once.clone());
        }
    }
}

//! Comparison-key normalization for names and search terms.
//!
//! Two forms are produced and always consulted together: an ASCII-folded
//! form for accent-robust matching, and the lowercased original for
//! accent-sensitive exact matches. Non-Latin scripts (Arabic names) are
//! never transliterated: folding only strips combining marks, so characters
//! without a decomposition pass through unchanged.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold a string to its accent-stripped, lowercased comparison form.
///
/// Whitespace runs collapse to single spaces.
pub fn fold(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    collapse(&stripped.to_lowercase())
}

/// Lowercase a string without touching accents.
pub fn lower(s: &str) -> String {
    collapse(&s.to_lowercase())
}

/// Fold a string into a token-boundary-safe haystack: accent-stripped,
/// lowercased, every non-alphanumeric rune replaced by a single space.
pub fn token_form(s: &str) -> String {
    let folded: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    collapse(&folded.to_lowercase())
}

/// Whole-word(s) containment test against a `token_form` haystack.
///
/// The phrase is token-formed too, so "génie civil" matches
/// "ecole de genie-civil" but "art" does not match "quartier".
pub fn contains_word(haystack_tokens: &str, phrase: &str) -> bool {
    let needle = token_form(phrase);
    if needle.is_empty() {
        return false;
    }
    let padded = format!(" {} ", haystack_tokens);
    padded.contains(&format!(" {} ", needle))
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_accents() {
        assert_eq!(fold("Faculté de Médecine"), "faculte de medecine");
        assert_eq!(fold("École  d'Ingénierie"), "ecole d'ingenierie");
    }

    #[test]
    fn test_fold_leaves_arabic_alone() {
        // No transliteration: Arabic letters have no combining-mark
        // decomposition and must survive untouched.
        assert_eq!(fold("جامعة محمد الخامس"), "جامعة محمد الخامس");
    }

    #[test]
    fn test_token_form_separators() {
        assert_eq!(token_form("Génie-Civil (option BTP)"), "genie civil option btp");
    }

    #[test]
    fn test_contains_word_boundaries() {
        let hay = token_form("École Supérieure de Mode et Design");
        assert!(contains_word(&hay, "mode"));
        assert!(contains_word(&hay, "mode et design"));
        assert!(!contains_word(&hay, "modes"));

        let hay = token_form("Institut des Commodités");
        assert!(!contains_word(&hay, "mode"));
    }

    #[test]
    fn test_lower_keeps_accents() {
        assert_eq!(lower("Médecine   Générale"), "médecine générale");
    }
}

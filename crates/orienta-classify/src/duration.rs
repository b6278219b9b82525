//! Study-duration bounds derived from degree and program names.
//!
//! Durations are total years after the bac. The table is ordered most
//! specific first; the first matching phrase wins.

use crate::normalize::{contains_word, token_form};

const DURATION_RULES: &[(&str, i64, i64)] = &[
    ("doctorat", 8, 8),
    ("medecine dentaire", 6, 6),
    ("medecine", 7, 7),
    ("pharmacie", 6, 6),
    ("dentaire", 6, 6),
    ("architecture", 6, 6),
    ("expertise comptable", 5, 8),
    ("cycle d ingenieur", 5, 5),
    ("ingenieur", 5, 5),
    ("master", 5, 5),
    ("mba", 5, 5),
    ("licence professionnelle", 3, 3),
    ("licence", 3, 3),
    ("bachelor", 3, 3),
    ("classes preparatoires", 2, 2),
    ("cpge", 2, 2),
    ("deust", 2, 2),
    ("dut", 2, 2),
    ("bts", 2, 2),
    ("technicien specialise", 2, 2),
    ("technicien", 2, 2),
];

/// Derive `(min, max)` study-duration bounds from degree + program names.
///
/// Returns `None` when no phrase matches; the bulk job leaves the record
/// untouched in that case.
pub fn classify_duration(diplome: Option<&str>, nom: &str) -> Option<(i64, i64)> {
    let haystack = token_form(&format!("{} {}", diplome.unwrap_or(""), nom));
    for (phrase, min, max) in DURATION_RULES {
        if contains_word(&haystack, phrase) {
            return Some((*min, *max));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_keywords() {
        assert_eq!(classify_duration(Some("Licence"), "Économie"), Some((3, 3)));
        assert_eq!(classify_duration(Some("Master"), "Finance"), Some((5, 5)));
        assert_eq!(classify_duration(Some("BTS"), "Électromécanique"), Some((2, 2)));
        assert_eq!(classify_duration(None, "Doctorat en Physique"), Some((8, 8)));
        assert_eq!(classify_duration(None, "Médecine Dentaire"), Some((6, 6)));
    }

    #[test]
    fn test_specific_phrase_wins_over_generic() {
        // "licence professionnelle" must not fall through to bare "licence"
        // (same bounds today, but the ordering is the contract), and
        // "expertise comptable" carries an asymmetric range.
        assert_eq!(
            classify_duration(Some("Diplôme d'Expertise Comptable"), "Comptabilité"),
            Some((5, 8))
        );
    }

    #[test]
    fn test_accent_and_hyphen_robust() {
        assert_eq!(classify_duration(None, "Cycle d'Ingénieur en Génie Civil"), Some((5, 5)));
        assert_eq!(classify_duration(None, "Médecine Générale"), Some((7, 7)));
    }

    #[test]
    fn test_unknown_yields_none() {
        assert_eq!(classify_duration(None, "Atelier de Théâtre"), None);
    }
}

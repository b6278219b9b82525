//! Keyword-based sector classification for free-text labels.
//!
//! A label (establishment name + abbreviation, or a filière name) is matched
//! against a keyword table; every hit contributes its sector IDs and the
//! union is returned deduplicated and sorted. Matching consults both
//! normalized forms of the label (see `normalize`), so inconsistent input
//! accentuation does not lose matches.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use regex::RegexBuilder;
use tracing::warn;

use orienta_core::{Error, Result};

use crate::normalize::{contains_word, lower, token_form};

/// Maps stable sector codes to database row IDs.
pub type SecteurCatalog = BTreeMap<String, i64>;

/// One keyword phrase and the sector codes it votes for.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub phrase: String,
    pub codes: Vec<String>,
}

/// A false-positive guard: labels matching `pattern` can never carry the
/// excluded sectors, whichever keywords matched.
#[derive(Debug, Clone)]
pub struct ExclusionRule {
    pub pattern: String,
    pub excluded: Vec<String>,
}

/// Contextual gate for one sector whose keyword evidence is noisy.
///
/// The technology sector matches through generic words ("information",
/// "formation") that routinely appear in unrelated institution names. The
/// gate rejects the sector when the only evidence is from `weak_phrases`
/// and either the anchor word is absent or a noise word co-occurs.
#[derive(Debug, Clone)]
pub struct AmbiguityGate {
    pub code: String,
    pub anchor: String,
    pub weak_phrases: Vec<String>,
    pub noise_words: Vec<String>,
}

impl AmbiguityGate {
    /// The built-in gate: "informatique" evidence drowned in the generic
    /// words "formation"/"information" is rejected.
    pub fn informatique() -> Self {
        Self {
            code: "TECH".into(),
            anchor: "informatique".into(),
            weak_phrases: vec![
                "informatique".into(),
                "information".into(),
                "formation".into(),
            ],
            noise_words: vec!["formation".into(), "information".into()],
        }
    }
}

/// Injected classifier configuration: keyword table, exclusion guards, and
/// an optional ambiguity gate. Built-in tables live in `keywords`.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub keywords: Vec<KeywordRule>,
    pub exclusions: Vec<ExclusionRule>,
    pub gate: Option<AmbiguityGate>,
}

struct ResolvedRule {
    phrase: String,
    phrase_tokens: String,
    phrase_lower: String,
    ids: Vec<i64>,
}

struct ResolvedExclusion {
    regex: regex::Regex,
    ids: Vec<i64>,
}

struct ResolvedGate {
    ids: Vec<i64>,
    anchor: String,
    weak_phrases: HashSet<String>,
    noise_words: Vec<String>,
}

/// A classifier with all codes resolved to sector row IDs.
pub struct Classifier {
    rules: Vec<ResolvedRule>,
    exclusions: Vec<ResolvedExclusion>,
    gate: Option<ResolvedGate>,
}

impl Classifier {
    /// Resolve a configuration against the sector catalog.
    ///
    /// An empty catalog yields a classifier that matches nothing (bulk jobs
    /// degrade to no-ops rather than failing). A non-empty catalog missing a
    /// referenced code is a configuration error: the keyword table and the
    /// seeded sectors have drifted apart, which must not fail silently.
    pub fn new(config: ClassifierConfig, catalog: &SecteurCatalog) -> Result<Self> {
        if catalog.is_empty() {
            warn!("sector catalog is empty; classifier will match nothing");
            return Ok(Self {
                rules: Vec::new(),
                exclusions: Vec::new(),
                gate: None,
            });
        }

        let resolve = |codes: &[String]| -> Result<Vec<i64>> {
            codes
                .iter()
                .map(|code| {
                    catalog.get(code).copied().ok_or_else(|| {
                        Error::Config(format!("keyword table references unknown sector code '{}'", code))
                    })
                })
                .collect()
        };

        let mut rules = Vec::with_capacity(config.keywords.len());
        for rule in &config.keywords {
            rules.push(ResolvedRule {
                phrase_tokens: token_form(&rule.phrase),
                phrase_lower: lower(&rule.phrase),
                phrase: rule.phrase.clone(),
                ids: resolve(&rule.codes)?,
            });
        }

        let mut exclusions = Vec::with_capacity(config.exclusions.len());
        for rule in &config.exclusions {
            let regex = RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| Error::Config(format!("bad exclusion pattern '{}': {}", rule.pattern, e)))?;
            exclusions.push(ResolvedExclusion {
                regex,
                ids: resolve(&rule.excluded)?,
            });
        }

        let gate = match config.gate {
            Some(gate_cfg) => {
                let id = catalog.get(&gate_cfg.code).copied().ok_or_else(|| {
                    Error::Config(format!(
                        "ambiguity gate references unknown sector code '{}'",
                        gate_cfg.code
                    ))
                })?;
                Some(ResolvedGate {
                    ids: vec![id],
                    anchor: gate_cfg.anchor,
                    weak_phrases: gate_cfg.weak_phrases.into_iter().collect(),
                    noise_words: gate_cfg.noise_words,
                })
            }
            None => None,
        };

        Ok(Self {
            rules,
            exclusions,
            gate,
        })
    }

    /// Classify a label into a deduplicated, ascending list of sector IDs.
    ///
    /// Blank labels classify to nothing. Pure: persisting the result is the
    /// caller's job.
    pub fn classify(&self, label: &str) -> Vec<i64> {
        if label.trim().is_empty() {
            return Vec::new();
        }

        let tokens = token_form(label);
        let accented = lower(label);

        let mut ids: BTreeSet<i64> = BTreeSet::new();
        let mut matched_phrases: Vec<&ResolvedRule> = Vec::new();

        for rule in &self.rules {
            // Word-bound hit on the folded form, or plain substring hit on
            // the accented form; either counts.
            let hit = (!rule.phrase_tokens.is_empty()
                && contains_word(&tokens, &rule.phrase_tokens))
                || accented.contains(&rule.phrase_lower);
            if hit {
                ids.extend(rule.ids.iter().copied());
                matched_phrases.push(rule);
            }
        }

        for exclusion in &self.exclusions {
            if exclusion.regex.is_match(&accented) || exclusion.regex.is_match(&tokens) {
                for id in &exclusion.ids {
                    ids.remove(id);
                }
            }
        }

        if let Some(gate) = &self.gate {
            self.apply_gate(gate, &tokens, &matched_phrases, &mut ids);
        }

        ids.into_iter().collect()
    }

    /// Classify an establishment label built from name + optional sigle.
    pub fn classify_with_sigle(&self, nom: &str, sigle: Option<&str>) -> Vec<i64> {
        match sigle {
            Some(s) if !s.trim().is_empty() => self.classify(&format!("{} {}", nom, s)),
            _ => self.classify(nom),
        }
    }

    fn apply_gate(
        &self,
        gate: &ResolvedGate,
        tokens: &str,
        matched: &[&ResolvedRule],
        ids: &mut BTreeSet<i64>,
    ) {
        if !gate.ids.iter().any(|id| ids.contains(id)) {
            return;
        }

        let gated_evidence: Vec<&str> = matched
            .iter()
            .filter(|r| r.ids.iter().any(|id| gate.ids.contains(id)))
            .map(|r| r.phrase.as_str())
            .collect();

        let has_specific = gated_evidence
            .iter()
            .any(|p| !gate.weak_phrases.contains(*p));
        if has_specific {
            return;
        }

        let anchored = contains_word(tokens, &gate.anchor);
        let noisy = gate
            .noise_words
            .iter()
            .any(|w| contains_word(tokens, w));

        if !anchored || noisy {
            for id in &gate.ids {
                ids.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords;

    fn catalog() -> SecteurCatalog {
        let codes = [
            "SANTE",
            "TECH",
            "MODE",
            "DROIT",
            "GESTION",
            "INGENIERIE",
            "AGRO",
            "TOURISME",
            "EDUCATION",
            "BTP",
            "ART",
            "COM",
            "FINANCE",
            "TELECOM",
            "TRANSPORT",
            "SCIENCES",
        ];
        codes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.to_string(), (i + 1) as i64))
            .collect()
    }

    fn etab_classifier() -> Classifier {
        Classifier::new(keywords::etablissement_config(), &catalog()).unwrap()
    }

    #[test]
    fn test_blank_label_classifies_to_nothing() {
        let c = etab_classifier();
        assert!(c.classify("").is_empty());
        assert!(c.classify("   ").is_empty());
    }

    #[test]
    fn test_empty_catalog_is_not_fatal() {
        let c = Classifier::new(keywords::etablissement_config(), &SecteurCatalog::new()).unwrap();
        assert!(c.classify("École d'Informatique et Digital").is_empty());
    }

    #[test]
    fn test_unknown_code_is_config_error() {
        let config = ClassifierConfig {
            keywords: vec![KeywordRule {
                phrase: "informatique".into(),
                codes: vec!["NO_SUCH_CODE".into()],
            }],
            exclusions: Vec::new(),
            gate: None,
        };
        let mut cat = SecteurCatalog::new();
        cat.insert("TECH".into(), 1);
        assert!(matches!(
            Classifier::new(config, &cat),
            Err(orienta_core::Error::Config(_))
        ));
    }

    #[test]
    fn test_result_is_dedup_sorted() {
        let c = etab_classifier();
        // "comptabilité" votes FINANCE+GESTION, "gestion" votes GESTION again.
        let ids = c.classify("École de Gestion et de Comptabilité");
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert!(!ids.is_empty());
    }

    #[test]
    fn test_accent_robust_matching() {
        let c = etab_classifier();
        let with_accents = c.classify("Faculté de Médecine");
        let without = c.classify("Faculte de Medecine");
        assert_eq!(with_accents, without);
        assert!(!with_accents.is_empty());
    }

    #[test]
    fn test_medical_labels_never_reach_mode() {
        let c = etab_classifier();
        let cat = catalog();
        let mode = cat["MODE"];
        let sante = cat["SANTE"];

        let ids = c.classify("Faculté de Médecine et Pharmacie");
        assert!(ids.contains(&sante));
        assert!(!ids.contains(&mode));

        // The guard is load-bearing here: "esthétique" is a fashion keyword.
        let ids = c.classify("Institut de Médecine Esthétique");
        assert!(ids.contains(&sante));
        assert!(!ids.contains(&mode));

        // And still a fashion school without medical context.
        let ids = c.classify("École d'Esthétique et de Coiffure");
        assert!(ids.contains(&mode));
    }

    #[test]
    fn test_informatique_gate_rejects_generic_context() {
        let c = etab_classifier();
        let tech = catalog()["TECH"];

        let ids = c.classify("Institut de Formation et d'Information");
        assert!(!ids.contains(&tech));
    }

    #[test]
    fn test_informatique_gate_accepts_specific_context() {
        let c = etab_classifier();
        let tech = catalog()["TECH"];

        let ids = c.classify("École d'Ingénierie Informatique et Digital");
        assert!(ids.contains(&tech));
    }

    #[test]
    fn test_informatique_alone_in_clean_label() {
        let c = etab_classifier();
        let tech = catalog()["TECH"];

        let ids = c.classify("École Supérieure d'Informatique");
        assert!(ids.contains(&tech));

        // Same anchor word, but drowned in generic context.
        let ids = c.classify("Institut de Formation en Informatique");
        assert!(!ids.contains(&tech));
    }

    #[test]
    fn test_telecom_divergence_between_tables() {
        let cat = catalog();
        let etab = etab_classifier();
        let filiere = Classifier::new(keywords::filiere_config(), &cat).unwrap();

        let e = etab.classify("Institut National des Télécoms");
        let f = filiere.classify("Télécommunications et Réseaux Embarqués");
        assert!(e.contains(&cat["TELECOM"]));
        assert!(f.contains(&cat["TELECOM"]));
        // Establishment table pairs télécom with TECH, filière table with
        // INGENIERIE. The tables disagree on purpose.
        assert!(e.contains(&cat["TECH"]));
        assert!(f.contains(&cat["INGENIERIE"]));
    }

    #[test]
    fn test_classify_is_pure_and_idempotent() {
        let c = etab_classifier();
        let label = "École Nationale de Commerce et de Gestion";
        assert_eq!(c.classify(label), c.classify(label));
    }

    #[test]
    fn test_sigle_contributes_evidence() {
        let c = etab_classifier();
        let tech = catalog()["TECH"];
        let ids = c.classify_with_sigle("École Nationale Supérieure", Some("ENSIAS Informatique"));
        assert!(ids.contains(&tech));
    }
}

//! Bac-track classification for filières.
//!
//! Derives the accepted baccalaureate side (`normal` = Moroccan bac,
//! `mission` = French-system bac, or both), the accepted stream list, and
//! the (série, spécialité) combinations for the mission side, from a filière
//! name plus its legacy free-text access-conditions field. The legacy field
//! sometimes holds an already-structured JSON array; anything that looks
//! like JSON but is not a string array is a per-record error the bulk job
//! counts and skips.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use orienta_core::{Error, Result};

use crate::normalize::fold;

/// Which baccalaureate system a filière accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacType {
    Normal,
    Mission,
    Both,
}

impl BacType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BacType::Normal => "normal",
            BacType::Mission => "mission",
            BacType::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(BacType::Normal),
            "mission" => Some(BacType::Mission),
            "both" => Some(BacType::Both),
            _ => None,
        }
    }
}

/// Classification outcome for one filière.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacProfile {
    pub bac_type: Option<BacType>,
    pub filieres_acceptees: Vec<String>,
    pub combinaisons_mission: Vec<(String, String)>,
}

static MISSION_EVIDENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bmission\b|bac(calaureat)? francais|systeme francais|lycee francais").unwrap()
});

static NORMAL_EVIDENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"bac(calaureat)? marocain|toutes? series?").unwrap());

static TOUTES_SERIES: Lazy<Regex> = Lazy::new(|| Regex::new(r"toutes? series?").unwrap());

/// Moroccan bac streams, matched against the folded text. Maths A/B are
/// checked before the generic maths pattern; the generic one only fires
/// when neither lettered variant matched.
static STREAMS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"sciences? maths? a\b", "Sciences Maths A"),
        (r"sciences? maths? b\b", "Sciences Maths B"),
        (r"sciences? physiques?\b", "Sciences Physiques"),
        (
            r"\bsvt\b|sciences? de la vie et de la terre",
            "Sciences de la Vie et de la Terre",
        ),
        (r"sciences? eco(nomiques?)?\b", "Sciences Économiques"),
        (
            r"\btgc\b|techniques? de gestion",
            "Techniques de Gestion et Comptabilité",
        ),
        (r"\blettres\b|sciences? humaines", "Lettres et Sciences Humaines"),
    ]
    .iter()
    .map(|(p, name)| (Regex::new(p).unwrap(), *name))
    .collect()
});

static GENERIC_MATHS: Lazy<Regex> = Lazy::new(|| Regex::new(r"sciences? maths?\b").unwrap());

/// Mission-side (série, spécialité) combinations.
static MISSION_COMBOS: Lazy<Vec<(Regex, (&'static str, &'static str))>> = Lazy::new(|| {
    [
        (r"math(s|ematiques)?\b", ("Générale", "Mathématiques")),
        (r"physique[- ]chimie|\bpc\b", ("Générale", "Physique-Chimie")),
        (r"\bsvt\b", ("Générale", "SVT")),
        (
            r"\bses\b|sciences? economiques? et sociales?",
            ("Générale", "SES"),
        ),
        (r"\bstmg\b", ("Technologique", "STMG")),
        (r"\bsti2d\b", ("Technologique", "STI2D")),
    ]
    .iter()
    .map(|(p, combo)| (Regex::new(p).unwrap(), *combo))
    .collect()
});

/// Classify one filière's bac profile from its name and legacy conditions.
pub fn classify_bac(nom: &str, conditions: Option<&str>) -> Result<BacProfile> {
    let conditions = conditions.unwrap_or("").trim();
    let text = fold(&format!("{} {}", nom, conditions));

    let mut profile = BacProfile::default();

    // Structured legacy rows: a JSON array of accepted stream names.
    let mut acceptees_from_json = false;
    if conditions.starts_with('[') || conditions.starts_with('{') {
        let parsed: serde_json::Value = serde_json::from_str(conditions)
            .map_err(|e| Error::Classify(format!("legacy conditions field is not valid JSON: {}", e)))?;
        let arr = parsed
            .as_array()
            .ok_or_else(|| Error::Classify("legacy conditions JSON is not a string array".into()))?;
        for item in arr {
            let s = item
                .as_str()
                .ok_or_else(|| Error::Classify("legacy conditions JSON is not a string array".into()))?;
            let s = s.trim();
            if !s.is_empty() && !profile.filieres_acceptees.iter().any(|x| x == s) {
                profile.filieres_acceptees.push(s.to_string());
            }
        }
        acceptees_from_json = true;
    }

    if !acceptees_from_json {
        let mut lettered_maths = false;
        for (regex, name) in STREAMS.iter() {
            if regex.is_match(&text) {
                if *name == "Sciences Maths A" || *name == "Sciences Maths B" {
                    lettered_maths = true;
                }
                if !profile.filieres_acceptees.iter().any(|x| x == name) {
                    profile.filieres_acceptees.push(name.to_string());
                }
            }
        }
        // "sciences maths" with no letter accepts both variants.
        if !lettered_maths && GENERIC_MATHS.is_match(&text) {
            for name in ["Sciences Maths A", "Sciences Maths B"] {
                if !profile.filieres_acceptees.iter().any(|x| x == name) {
                    profile.filieres_acceptees.push(name.to_string());
                }
            }
        }
        if TOUTES_SERIES.is_match(&text) {
            profile.filieres_acceptees.push("Toutes séries".to_string());
        }
    }

    let mission = MISSION_EVIDENCE.is_match(&text);
    let normal = NORMAL_EVIDENCE.is_match(&text) || !profile.filieres_acceptees.is_empty();

    profile.bac_type = match (normal, mission) {
        (true, true) => Some(BacType::Both),
        (true, false) => Some(BacType::Normal),
        (false, true) => Some(BacType::Mission),
        (false, false) => None,
    };

    if mission {
        for (regex, (serie, specialite)) in MISSION_COMBOS.iter() {
            if regex.is_match(&text) {
                let pair = (serie.to_string(), specialite.to_string());
                if !profile.combinaisons_mission.contains(&pair) {
                    profile.combinaisons_mission.push(pair);
                }
            }
        }
    }

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_streams_from_free_text() {
        let p = classify_bac(
            "Génie Informatique",
            Some("Bac marocain: Sciences Maths A, Sciences Physiques ou SVT"),
        )
        .unwrap();
        assert_eq!(p.bac_type, Some(BacType::Normal));
        assert!(p.filieres_acceptees.contains(&"Sciences Maths A".to_string()));
        assert!(p.filieres_acceptees.contains(&"Sciences Physiques".to_string()));
        assert!(p
            .filieres_acceptees
            .contains(&"Sciences de la Vie et de la Terre".to_string()));
        assert!(p.combinaisons_mission.is_empty());
    }

    #[test]
    fn test_generic_maths_accepts_both_letters() {
        let p = classify_bac("Classes Préparatoires", Some("Sciences Maths")).unwrap();
        assert!(p.filieres_acceptees.contains(&"Sciences Maths A".to_string()));
        assert!(p.filieres_acceptees.contains(&"Sciences Maths B".to_string()));
    }

    #[test]
    fn test_mission_side_with_combos() {
        let p = classify_bac(
            "Médecine",
            Some("Bac français (mission), spécialités Maths ou Physique-Chimie"),
        )
        .unwrap();
        assert_eq!(p.bac_type, Some(BacType::Mission));
        assert!(p
            .combinaisons_mission
            .contains(&("Générale".to_string(), "Mathématiques".to_string())));
        assert!(p
            .combinaisons_mission
            .contains(&("Générale".to_string(), "Physique-Chimie".to_string())));
    }

    #[test]
    fn test_both_sides() {
        let p = classify_bac(
            "Architecture",
            Some("Bac marocain toutes séries ou bac français mission"),
        )
        .unwrap();
        assert_eq!(p.bac_type, Some(BacType::Both));
        assert!(p.filieres_acceptees.contains(&"Toutes séries".to_string()));
    }

    #[test]
    fn test_structured_json_conditions() {
        let p = classify_bac(
            "Licence Économie",
            Some(r#"["Sciences Économiques", " Techniques de Gestion et Comptabilité "]"#),
        )
        .unwrap();
        assert_eq!(
            p.filieres_acceptees,
            vec![
                "Sciences Économiques".to_string(),
                "Techniques de Gestion et Comptabilité".to_string()
            ]
        );
        assert_eq!(p.bac_type, Some(BacType::Normal));
    }

    #[test]
    fn test_malformed_legacy_json_is_an_error() {
        assert!(classify_bac("Licence", Some(r#"["unterminated"#)).is_err());
        assert!(classify_bac("Licence", Some(r#"[1, 2, 3]"#)).is_err());
    }

    #[test]
    fn test_no_evidence_yields_none() {
        let p = classify_bac("Programme Libre", None).unwrap();
        assert_eq!(p.bac_type, None);
        assert!(p.filieres_acceptees.is_empty());
    }
}

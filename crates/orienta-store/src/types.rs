//! Row types, filter requests, and the denormalized sector-ID codec.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// An establishment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Etablissement {
    pub id: i64,
    pub nom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigle: Option<String>,
    /// Native-script (Arabic) name; matched byte-exact, never case-folded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom_ar: Option<String>,
    /// Category: "public", "prive" or "militaire".
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ville: Option<String>,
    /// Secondary campuses/cities.
    pub villes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universite_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Degrees offered.
    pub diplomes: Vec<String>,
    /// Deduplicated, ascending sector IDs; empty when never classified.
    pub secteurs_ids: Vec<i64>,
    pub is_active: bool,
    /// "draft" or "published"; no transition rules are enforced.
    pub status: String,
    pub is_recommended: bool,
    pub is_sponsored: bool,
    pub is_featured: bool,
    pub echange_international: bool,
    pub accreditation_etat: bool,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// A filière (program) row. Belongs to exactly one establishment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filiere {
    pub id: i64,
    pub etablissement_id: i64,
    pub nom: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diplome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub langue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duree_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duree_max: Option<i64>,
    /// "normal", "mission" or "both".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bac_type: Option<String>,
    pub filieres_acceptees: Vec<String>,
    pub combinaisons_bac_mission: Vec<(String, String)>,
    /// Legacy free-text access conditions consumed by the bac updater.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions_acces: Option<String>,
    pub secteurs_ids: Vec<i64>,
    pub is_active: bool,
    pub created_at: i64,
}

/// A sector (occupational domain) row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secteur {
    pub id: i64,
    pub titre: String,
    /// Stable cross-reference key used by keyword tables and fixtures.
    pub code: String,
    pub mots_cles: Vec<String>,
    pub metiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salaire_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salaire_max: Option<i64>,
    pub is_active: bool,
}

/// An occupation row linked to a sector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metier {
    pub id: i64,
    pub secteur_id: i64,
    pub nom: String,
    pub is_active: bool,
}

/// A university reference from a filter value: an exact row ID when the
/// value parses as an integer, otherwise a fuzzy name substring. Never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniversiteRef {
    Id(i64),
    Nom(String),
}

impl UniversiteRef {
    /// Non-numeric values fall back to the name branch; this never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(id) => UniversiteRef::Id(id),
            Err(_) => UniversiteRef::Nom(raw.trim().to_string()),
        }
    }
}

/// Filter request for establishment queries. Every field is optional;
/// omitted fields impose no constraint. All supplied filters AND together.
#[derive(Debug, Clone, Default)]
pub struct EtablissementFilter {
    /// Free-text search across name, abbreviation, native-script name,
    /// city and email (OR across those columns).
    pub search: Option<String>,
    pub type_: Option<String>,
    pub ville: Option<String>,
    pub universite: Option<UniversiteRef>,
    pub is_active: Option<bool>,
    pub status: Option<String>,
    /// The three facet flags constrain only when `Some(true)`; a false
    /// value is treated as unconstrained (no false branch exists upstream).
    pub is_recommended: Option<bool>,
    pub is_sponsored: Option<bool>,
    pub is_featured: Option<bool>,
    pub echange_international: Option<bool>,
    pub accreditation_etat: Option<bool>,
}

/// Filter request for filière queries.
#[derive(Debug, Clone, Default)]
pub struct FiliereFilter {
    pub search: Option<String>,
    pub etablissement_id: Option<i64>,
    pub diplome: Option<String>,
    pub langue: Option<String>,
    pub bac_type: Option<String>,
    pub is_active: Option<bool>,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub etablissements: i64,
    pub filieres: i64,
    pub secteurs: i64,
    pub metiers: i64,
    pub etablissements_classifies: i64,
    pub filieres_classifiees: i64,
    pub db_path: String,
    pub db_size_mb: f64,
}

/// Insert payload for an establishment.
#[derive(Debug, Clone, Default)]
pub struct NewEtablissement {
    pub nom: String,
    pub sigle: Option<String>,
    pub nom_ar: Option<String>,
    pub type_: Option<String>,
    pub ville: Option<String>,
    pub villes: Vec<String>,
    pub universite_id: Option<i64>,
    pub universite: Option<String>,
    pub email: Option<String>,
    pub diplomes: Vec<String>,
    pub secteurs_ids: Vec<i64>,
    pub is_active: bool,
    pub status: Option<String>,
    pub is_recommended: bool,
    pub is_sponsored: bool,
    pub is_featured: bool,
    pub echange_international: bool,
    pub accreditation_etat: bool,
}

/// Insert payload for a filière.
#[derive(Debug, Clone, Default)]
pub struct NewFiliere {
    pub etablissement_id: i64,
    pub nom: String,
    pub description: Option<String>,
    pub diplome: Option<String>,
    pub langue: Option<String>,
    pub conditions_acces: Option<String>,
    pub secteurs_ids: Vec<i64>,
    pub is_active: bool,
}

/// Insert payload for a sector.
#[derive(Debug, Clone, Default)]
pub struct NewSecteur {
    pub titre: String,
    pub code: String,
    pub mots_cles: Vec<String>,
    pub metiers: Vec<String>,
    pub salaire_min: Option<i64>,
    pub salaire_max: Option<i64>,
    pub is_active: bool,
}

// ---------------------------------------------------------------
// Denormalized sector-ID codec
// ---------------------------------------------------------------

/// Encode a sector-ID set to its stored JSON form: deduplicated, ascending.
pub fn encode_secteurs_ids(ids: &[i64]) -> String {
    let set: BTreeSet<i64> = ids.iter().copied().collect();
    let normalized: Vec<i64> = set.into_iter().collect();
    serde_json::to_string(&normalized).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a stored sector-ID list. Tolerant: NULL, empty, or malformed
/// values decode to an empty list (the value is recomputable).
pub fn decode_secteurs_ids(raw: Option<&str>) -> Vec<i64> {
    match raw {
        Some(s) if !s.trim().is_empty() => {
            serde_json::from_str::<Vec<i64>>(s).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Decode a stored JSON string array, tolerating NULL and malformed values.
pub fn decode_string_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(s) if !s.trim().is_empty() => {
            serde_json::from_str::<Vec<String>>(s).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Decode stored (série, spécialité) pairs.
pub fn decode_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    match raw {
        Some(s) if !s.trim().is_empty() => {
            serde_json::from_str::<Vec<(String, String)>>(s).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

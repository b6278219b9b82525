//! Search engine: primary filtered query, then re-filtering against fields
//! the SQL predicate cannot express (serialized degree and city lists,
//! denormalized sector IDs).

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use orienta_classify::normalize::{fold, lower};
use orienta_core::Result;
use orienta_store::{Etablissement, EtablissementFilter, Store};

pub struct SearchEngine;

impl SearchEngine {
    /// Full establishment search.
    ///
    /// Without a search term this is exactly the filter builder. With one,
    /// the term is withheld from the SQL predicate and every candidate is
    /// retained iff one of four checks succeeds: a scalar text field
    /// matches, a degree matches, a secondary city matches, or the
    /// candidate's sector IDs (own plus those inherited from its filières)
    /// intersect the sectors matching the term. The sector set is computed
    /// once per call, not once per candidate; if computing it fails the
    /// search degrades to the first three checks.
    pub fn search_etablissements(
        store: &Store,
        filter: &EtablissementFilter,
    ) -> Result<Vec<Etablissement>> {
        let term = match filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => return store.find_etablissements(filter),
        };

        let mut base = filter.clone();
        base.search = None;
        let candidates = store.find_etablissements(&base)?;

        let secteur_ids = match store.match_secteurs(&fold(&term)) {
            Ok(ids) => Some(ids),
            Err(e) => {
                warn!("sector matching unavailable, degrading to scalar/list search: {}", e);
                None
            }
        };
        let filiere_secteurs = match secteur_ids {
            Some(ref ids) if !ids.is_empty() => match store.filiere_secteurs_by_etablissement() {
                Ok(map) => map,
                Err(e) => {
                    warn!("filière sector lookup failed, using direct sector IDs only: {}", e);
                    HashMap::new()
                }
            },
            _ => HashMap::new(),
        };

        let needle_fold = fold(&term);
        let needle_lower = lower(&term);
        let total = candidates.len();

        let results: Vec<Etablissement> = candidates
            .into_iter()
            .filter(|e| {
                candidate_matches(
                    e,
                    &needle_fold,
                    &needle_lower,
                    secteur_ids.as_ref(),
                    &filiere_secteurs,
                )
            })
            .collect();

        debug!(
            "search {:?}: {} of {} candidates retained",
            term,
            results.len(),
            total
        );
        Ok(results)
    }
}

/// The four-way retention check for one candidate.
fn candidate_matches(
    e: &Etablissement,
    needle_fold: &str,
    needle_lower: &str,
    secteur_ids: Option<&BTreeSet<i64>>,
    filiere_secteurs: &HashMap<i64, BTreeSet<i64>>,
) -> bool {
    let scalar_fields = [
        Some(e.nom.as_str()),
        e.sigle.as_deref(),
        e.nom_ar.as_deref(),
        e.ville.as_deref(),
        e.universite.as_deref(),
        e.email.as_deref(),
    ];
    if scalar_fields
        .iter()
        .flatten()
        .any(|f| field_contains(f, needle_fold, needle_lower))
    {
        return true;
    }

    if e.diplomes
        .iter()
        .any(|d| field_contains(d, needle_fold, needle_lower))
    {
        return true;
    }

    if e.villes
        .iter()
        .any(|v| field_contains(v, needle_fold, needle_lower))
    {
        return true;
    }

    if let Some(matched) = secteur_ids {
        if !matched.is_empty() {
            if e.secteurs_ids.iter().any(|id| matched.contains(id)) {
                return true;
            }
            if let Some(inherited) = filiere_secteurs.get(&e.id) {
                if inherited.iter().any(|id| matched.contains(id)) {
                    return true;
                }
            }
        }
    }

    false
}

/// Containment against both normalized forms; a hit on either counts.
fn field_contains(field: &str, needle_fold: &str, needle_lower: &str) -> bool {
    fold(field).contains(needle_fold) || lower(field).contains(needle_lower)
}

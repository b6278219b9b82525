//! Built-in keyword and exclusion tables for sector classification.
//!
//! Rules are keyed by stable sector codes (`secteurs.code`), never by row
//! IDs; the classifier resolves codes against the live catalog at
//! construction time.
//!
//! The establishment and filière tables overlap but are not identical: the
//! two maintenance jobs historically diverged on a few mappings (notably
//! "télécom"). The divergence is preserved on purpose; do not unify the
//! tables without product sign-off.

use crate::classifier::{AmbiguityGate, ClassifierConfig, ExclusionRule, KeywordRule};

/// Stable sector codes, matching the seeded `secteurs.code` column.
pub mod codes {
    pub const SANTE: &str = "SANTE";
    pub const TECH: &str = "TECH";
    pub const MODE: &str = "MODE";
    pub const DROIT: &str = "DROIT";
    pub const GESTION: &str = "GESTION";
    pub const INGENIERIE: &str = "INGENIERIE";
    pub const AGRO: &str = "AGRO";
    pub const TOURISME: &str = "TOURISME";
    pub const EDUCATION: &str = "EDUCATION";
    pub const BTP: &str = "BTP";
    pub const ART: &str = "ART";
    pub const COM: &str = "COM";
    pub const FINANCE: &str = "FINANCE";
    pub const TELECOM: &str = "TELECOM";
    pub const TRANSPORT: &str = "TRANSPORT";
    pub const SCIENCES: &str = "SCIENCES";
}

use codes::*;

/// Labels with medical vocabulary must never land in the fashion sector,
/// whatever keyword happened to overlap ("médecine esthétique").
const MEDICAL_GUARD: &str =
    "m[ée]decine|m[ée]dical|pharmac|sant[ée]|infirmi|dentaire|chirurg|h[oô]pital|clinique";

/// "Sciences politiques" / "sciences juridiques" are law-school names, not
/// fundamental-science ones.
const SCIENCES_PO_GUARD: &str = r"sciences\s+(politiques|juridiques|po\b)";

fn rule(phrase: &str, codes: &[&str]) -> KeywordRule {
    KeywordRule {
        phrase: phrase.to_string(),
        codes: codes.iter().map(|c| c.to_string()).collect(),
    }
}

fn exclusion(pattern: &str, excluded: &[&str]) -> ExclusionRule {
    ExclusionRule {
        pattern: pattern.to_string(),
        excluded: excluded.iter().map(|c| c.to_string()).collect(),
    }
}

fn shared_exclusions() -> Vec<ExclusionRule> {
    vec![
        exclusion(MEDICAL_GUARD, &[MODE]),
        exclusion(SCIENCES_PO_GUARD, &[SCIENCES]),
    ]
}

/// Keyword table for establishment names and abbreviations.
pub fn etablissement_config() -> ClassifierConfig {
    let keywords = vec![
        // Santé
        rule("médecine", &[SANTE]),
        rule("pharmacie", &[SANTE]),
        rule("dentaire", &[SANTE]),
        rule("infirmier", &[SANTE]),
        rule("paramédical", &[SANTE]),
        rule("santé", &[SANTE]),
        rule("kinésithérapie", &[SANTE]),
        // Informatique & digital ("information" is weak evidence, gated in
        // the classifier)
        rule("informatique", &[TECH]),
        rule("information", &[TECH]),
        rule("digital", &[TECH]),
        rule("computer", &[TECH]),
        rule("data", &[TECH]),
        rule("programmation", &[TECH]),
        rule("numérique", &[TECH]),
        rule("logiciel", &[TECH]),
        rule("intelligence artificielle", &[TECH]),
        rule("télécom", &[TELECOM, TECH]),
        rule("réseaux", &[TELECOM, TECH]),
        // Mode & beauté
        rule("mode", &[MODE]),
        rule("stylisme", &[MODE]),
        rule("couture", &[MODE]),
        rule("esthétique", &[MODE]),
        rule("coiffure", &[MODE]),
        // Droit
        rule("droit", &[DROIT]),
        rule("juridique", &[DROIT]),
        rule("sciences politiques", &[DROIT]),
        // Gestion & commerce
        rule("commerce", &[GESTION]),
        rule("gestion", &[GESTION]),
        rule("management", &[GESTION]),
        rule("business", &[GESTION]),
        rule("marketing", &[GESTION, COM]),
        // Ingénierie
        rule("ingénieur", &[INGENIERIE]),
        rule("ingénierie", &[INGENIERIE]),
        rule("polytechnique", &[INGENIERIE]),
        rule("génie", &[INGENIERIE]),
        // Agriculture
        rule("agriculture", &[AGRO]),
        rule("agronomie", &[AGRO]),
        rule("agroalimentaire", &[AGRO]),
        rule("vétérinaire", &[AGRO]),
        // Tourisme & hôtellerie
        rule("tourisme", &[TOURISME]),
        rule("hôtellerie", &[TOURISME]),
        rule("restauration", &[TOURISME]),
        // Enseignement
        rule("enseignement", &[EDUCATION]),
        rule("éducation", &[EDUCATION]),
        rule("pédagogie", &[EDUCATION]),
        // Architecture & BTP
        rule("architecture", &[BTP]),
        rule("bâtiment", &[BTP]),
        rule("travaux publics", &[BTP]),
        rule("urbanisme", &[BTP]),
        // Art & design
        rule("beaux-arts", &[ART]),
        rule("design", &[ART]),
        rule("arts appliqués", &[ART]),
        rule("cinéma", &[ART, COM]),
        rule("musique", &[ART]),
        // Communication & médias
        rule("communication", &[COM]),
        rule("journalisme", &[COM]),
        rule("audiovisuel", &[COM]),
        // Banque & finance
        rule("banque", &[FINANCE]),
        rule("finance", &[FINANCE]),
        rule("comptabilité", &[FINANCE, GESTION]),
        rule("assurance", &[FINANCE]),
        rule("actuariat", &[FINANCE]),
        // Transport & logistique
        rule("logistique", &[TRANSPORT]),
        rule("transport", &[TRANSPORT]),
        rule("aéronautique", &[TRANSPORT, INGENIERIE]),
        rule("maritime", &[TRANSPORT]),
        // Sciences fondamentales
        rule("sciences", &[SCIENCES]),
        rule("mathématiques", &[SCIENCES]),
        rule("physique", &[SCIENCES]),
        rule("chimie", &[SCIENCES]),
    ];

    ClassifierConfig {
        keywords,
        exclusions: shared_exclusions(),
        gate: Some(AmbiguityGate::informatique()),
    }
}

/// Keyword table for filière (program) names.
///
/// Diverges from the establishment table: "télécom" maps to
/// [TELECOM, INGENIERIE] here versus [TELECOM, TECH] above. Kept as-is
/// pending product clarification.
pub fn filiere_config() -> ClassifierConfig {
    let keywords = vec![
        // Santé
        rule("médecine", &[SANTE]),
        rule("pharmacie", &[SANTE]),
        rule("soins infirmiers", &[SANTE]),
        rule("kinésithérapie", &[SANTE]),
        rule("sage-femme", &[SANTE]),
        rule("biologie médicale", &[SANTE, SCIENCES]),
        rule("santé", &[SANTE]),
        // Informatique & digital
        rule("informatique", &[TECH]),
        rule("information", &[TECH]),
        rule("développement", &[TECH]),
        rule("digital", &[TECH]),
        rule("data", &[TECH]),
        rule("programmation", &[TECH]),
        rule("cybersécurité", &[TECH]),
        rule("intelligence artificielle", &[TECH]),
        rule("télécom", &[TELECOM, INGENIERIE]),
        rule("réseaux", &[TELECOM, TECH]),
        // Mode & beauté
        rule("mode", &[MODE]),
        rule("stylisme", &[MODE]),
        rule("modélisme", &[MODE]),
        rule("esthétique", &[MODE]),
        // Droit
        rule("droit", &[DROIT]),
        rule("juridique", &[DROIT]),
        rule("notariat", &[DROIT]),
        // Gestion & commerce
        rule("commerce", &[GESTION]),
        rule("commerce international", &[GESTION]),
        rule("gestion", &[GESTION]),
        rule("management", &[GESTION]),
        rule("ressources humaines", &[GESTION]),
        rule("marketing", &[GESTION, COM]),
        rule("entrepreneuriat", &[GESTION]),
        // Ingénierie
        rule("génie civil", &[BTP, INGENIERIE]),
        rule("génie électrique", &[INGENIERIE]),
        rule("génie mécanique", &[INGENIERIE]),
        rule("génie industriel", &[INGENIERIE]),
        rule("génie", &[INGENIERIE]),
        rule("ingénierie", &[INGENIERIE]),
        rule("énergies renouvelables", &[INGENIERIE]),
        rule("mécatronique", &[INGENIERIE]),
        // Agriculture
        rule("agronomie", &[AGRO]),
        rule("agroalimentaire", &[AGRO]),
        rule("vétérinaire", &[AGRO]),
        // Tourisme & hôtellerie
        rule("tourisme", &[TOURISME]),
        rule("hôtellerie", &[TOURISME]),
        rule("gastronomie", &[TOURISME]),
        // Enseignement
        rule("enseignement", &[EDUCATION]),
        rule("sciences de l'éducation", &[EDUCATION]),
        // Architecture & BTP
        rule("architecture", &[BTP]),
        rule("urbanisme", &[BTP]),
        rule("topographie", &[BTP]),
        // Art & design
        rule("design", &[ART]),
        rule("arts plastiques", &[ART]),
        rule("animation", &[ART, TECH]),
        rule("audiovisuel", &[COM, ART]),
        // Communication & médias
        rule("communication", &[COM]),
        rule("journalisme", &[COM]),
        rule("relations publiques", &[COM]),
        // Banque & finance
        rule("banque", &[FINANCE]),
        rule("finance", &[FINANCE]),
        rule("comptabilité", &[FINANCE, GESTION]),
        rule("audit", &[FINANCE, GESTION]),
        rule("actuariat", &[FINANCE]),
        // Transport & logistique
        rule("logistique", &[TRANSPORT]),
        rule("transport", &[TRANSPORT]),
        rule("supply chain", &[TRANSPORT]),
        rule("aéronautique", &[TRANSPORT, INGENIERIE]),
        // Sciences fondamentales
        rule("mathématiques", &[SCIENCES]),
        rule("physique", &[SCIENCES]),
        rule("chimie", &[SCIENCES]),
        rule("biologie", &[SCIENCES]),
        rule("statistique", &[SCIENCES]),
    ];

    ClassifierConfig {
        keywords,
        exclusions: shared_exclusions(),
        gate: Some(AmbiguityGate::informatique()),
    }
}

//! Database schema SQL.
//!
//! Sector references in `secteurs_ids` are deliberately weak (no FK): they
//! are denormalized, recomputable values owned by the classification jobs.

/// Core tables: etablissements, filieres, secteurs, metiers.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS etablissements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nom TEXT NOT NULL,
    sigle TEXT,
    nom_ar TEXT,
    type TEXT,
    ville TEXT,
    villes_json TEXT,
    universite_id INTEGER,
    universite TEXT,
    email TEXT,
    diplomes_json TEXT,
    secteurs_ids TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    status TEXT NOT NULL DEFAULT 'draft',
    is_recommended INTEGER NOT NULL DEFAULT 0,
    is_sponsored INTEGER NOT NULL DEFAULT 0,
    is_featured INTEGER NOT NULL DEFAULT 0,
    echange_international INTEGER NOT NULL DEFAULT 0,
    accreditation_etat INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE TABLE IF NOT EXISTS filieres (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    etablissement_id INTEGER NOT NULL REFERENCES etablissements(id) ON DELETE CASCADE,
    nom TEXT NOT NULL,
    description TEXT,
    diplome TEXT,
    langue TEXT,
    duree_min INTEGER,
    duree_max INTEGER,
    bac_type TEXT,
    filieres_acceptees_json TEXT,
    combinaisons_bac_mission_json TEXT,
    conditions_acces TEXT,
    secteurs_ids TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS secteurs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    titre TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    mots_cles_json TEXT,
    metiers_json TEXT,
    salaire_min INTEGER,
    salaire_max INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS metiers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    secteur_id INTEGER NOT NULL REFERENCES secteurs(id) ON DELETE CASCADE,
    nom TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_etablissements_nom ON etablissements(nom);
CREATE INDEX IF NOT EXISTS idx_etablissements_ville ON etablissements(ville);
CREATE INDEX IF NOT EXISTS idx_etablissements_universite ON etablissements(universite_id);
CREATE INDEX IF NOT EXISTS idx_filieres_etablissement ON filieres(etablissement_id);
CREATE INDEX IF NOT EXISTS idx_filieres_nom ON filieres(nom);
CREATE INDEX IF NOT EXISTS idx_metiers_secteur ON metiers(secteur_id);
"#;

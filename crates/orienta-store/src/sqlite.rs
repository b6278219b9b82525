//! SQLite store for establishments, filières, sectors and métiers.
//!
//! Holds the Query Filter Builder (parameterized WHERE assembly over scalar
//! columns) and the sector full-text matcher. Post-query matching against
//! serialized list columns lives in the search crate; the bulk-update jobs
//! live in the CLI crate.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::schema::SCHEMA_SQL;
use crate::types::*;
use orienta_core::{Error, Result};

/// SQLite store. One connection, serialized behind a mutex.
pub struct Store {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Store {
    /// Open (or create) the store at `db_path`, creating parent directories
    /// and missing tables.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Database(e.to_string()))?;
            }
        }

        let conn = Self::create_connection(&db_path)?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Database(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let n_etab = store.count_etablissements()?;
        let n_sect = store.count_secteurs()?;
        info!(
            "Store initialized: {} etablissements, {} secteurs, path={}",
            n_etab,
            n_sect,
            store.db_path.display()
        );
        Ok(store)
    }

    /// Open an existing database without touching its schema.
    ///
    /// Used by maintenance jobs against legacy databases; callers are
    /// expected to `ensure_column` whatever they write to.
    pub fn open_existing(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if !db_path.exists() {
            return Err(Error::Config(format!(
                "database not found: {}",
                db_path.display()
            )));
        }
        let conn = Self::create_connection(&db_path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    fn create_connection(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open(db_path).map_err(|e| Error::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -65536;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Database(e.to_string()))?;
        Ok(conn)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn now_millis() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64
    }

    // ---------------------------------------------------------------
    // Etablissement CRUD
    // ---------------------------------------------------------------

    /// Insert an establishment. Returns the new row ID.
    pub fn add_etablissement(&self, new: &NewEtablissement) -> Result<i64> {
        let now = Self::now_millis();
        let villes = serde_json::to_string(&new.villes).unwrap_or_else(|_| "[]".into());
        let diplomes = serde_json::to_string(&new.diplomes).unwrap_or_else(|_| "[]".into());
        let secteurs = if new.secteurs_ids.is_empty() {
            None
        } else {
            Some(encode_secteurs_ids(&new.secteurs_ids))
        };

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO etablissements (nom, sigle, nom_ar, type, ville, villes_json, \
                 universite_id, universite, email, diplomes_json, secteurs_ids, is_active, \
                 status, is_recommended, is_sponsored, is_featured, echange_international, \
                 accreditation_etat, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                new.nom,
                new.sigle,
                new.nom_ar,
                new.type_,
                new.ville,
                villes,
                new.universite_id,
                new.universite,
                new.email,
                diplomes,
                secteurs,
                new.is_active,
                new.status.as_deref().unwrap_or("draft"),
                new.is_recommended,
                new.is_sponsored,
                new.is_featured,
                new.echange_international,
                new.accreditation_etat,
                now,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Get an establishment by ID. Absence is `Ok(None)`, not an error.
    pub fn get_etablissement(&self, id: i64) -> Result<Option<Etablissement>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM etablissements WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| Ok(Self::row_to_etablissement(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// Delete an establishment; its filières cascade.
    pub fn delete_etablissement(&self, id: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute("DELETE FROM etablissements WHERE id = ?1", params![id])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// The Query Filter Builder: conjunctive filtering over scalar columns.
    ///
    /// Omitted fields impose no constraint. The free-text `search` ORs
    /// across nom, sigle, ville, email (case-insensitive) and nom_ar
    /// (byte-exact). Results are ordered by name, row ID as tie-break.
    pub fn find_etablissements(&self, filter: &EtablissementFilter) -> Result<Vec<Etablissement>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(term) = trimmed(filter.search.as_deref()) {
            clauses.push(
                "(LOWER(nom) LIKE ? OR LOWER(IFNULL(sigle,'')) LIKE ? \
                 OR LOWER(IFNULL(ville,'')) LIKE ? OR LOWER(IFNULL(email,'')) LIKE ? \
                 OR IFNULL(nom_ar,'') LIKE ?)"
                    .into(),
            );
            let folded = format!("%{}%", term.to_lowercase());
            for _ in 0..4 {
                args.push(Box::new(folded.clone()));
            }
            // Native-script column: exact substring, no case folding.
            args.push(Box::new(format!("%{}%", term)));
        }
        if let Some(t) = trimmed(filter.type_.as_deref()) {
            clauses.push("LOWER(IFNULL(type,'')) = LOWER(?)".into());
            args.push(Box::new(t.to_string()));
        }
        if let Some(v) = trimmed(filter.ville.as_deref()) {
            clauses.push("LOWER(IFNULL(ville,'')) = LOWER(?)".into());
            args.push(Box::new(v.to_string()));
        }
        match &filter.universite {
            Some(UniversiteRef::Id(id)) => {
                clauses.push("universite_id = ?".into());
                args.push(Box::new(*id));
            }
            Some(UniversiteRef::Nom(nom)) => {
                clauses.push("LOWER(IFNULL(universite,'')) LIKE ?".into());
                args.push(Box::new(format!("%{}%", nom.to_lowercase())));
            }
            None => {}
        }
        if let Some(active) = filter.is_active {
            clauses.push("is_active = ?".into());
            args.push(Box::new(active));
        }
        if let Some(status) = trimmed(filter.status.as_deref()) {
            clauses.push("status = ?".into());
            args.push(Box::new(status.to_string()));
        }
        // Facet flags: a truthy check only, no false branch.
        if filter.is_recommended == Some(true) {
            clauses.push("is_recommended = 1".into());
        }
        if filter.is_sponsored == Some(true) {
            clauses.push("is_sponsored = 1".into());
        }
        if filter.is_featured == Some(true) {
            clauses.push("is_featured = 1".into());
        }
        if let Some(b) = filter.echange_international {
            clauses.push("echange_international = ?".into());
            args.push(Box::new(b));
        }
        if let Some(b) = filter.accreditation_etat {
            clauses.push("accreditation_etat = ?".into());
            args.push(Box::new(b));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM etablissements{} ORDER BY nom COLLATE NOCASE ASC, id ASC",
            where_sql
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok(Self::row_to_etablissement(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Count all establishments.
    pub fn count_etablissements(&self) -> Result<i64> {
        self.count_rows("etablissements")
    }

    // ---------------------------------------------------------------
    // Filière CRUD
    // ---------------------------------------------------------------

    /// Insert a filière. Returns the new row ID.
    pub fn add_filiere(&self, new: &NewFiliere) -> Result<i64> {
        let now = Self::now_millis();
        let secteurs = if new.secteurs_ids.is_empty() {
            None
        } else {
            Some(encode_secteurs_ids(&new.secteurs_ids))
        };

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO filieres (etablissement_id, nom, description, diplome, langue, \
                 conditions_acces, secteurs_ids, is_active, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![
                new.etablissement_id,
                new.nom,
                new.description,
                new.diplome,
                new.langue,
                new.conditions_acces,
                secteurs,
                new.is_active,
                now,
            ])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Get a filière by ID.
    pub fn get_filiere(&self, id: i64) -> Result<Option<Filiere>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM filieres WHERE id = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![id], |row| Ok(Self::row_to_filiere(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// All filières of one establishment, in name order.
    pub fn get_filieres_for_etablissement(&self, etablissement_id: i64) -> Result<Vec<Filiere>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT * FROM filieres WHERE etablissement_id = ?1 \
                 ORDER BY nom COLLATE NOCASE ASC, id ASC",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![etablissement_id], |row| {
                Ok(Self::row_to_filiere(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Conjunctive filtering over filière scalar columns.
    pub fn find_filieres(&self, filter: &FiliereFilter) -> Result<Vec<Filiere>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(term) = trimmed(filter.search.as_deref()) {
            clauses.push(
                "(LOWER(nom) LIKE ? OR LOWER(IFNULL(description,'')) LIKE ? \
                 OR LOWER(IFNULL(diplome,'')) LIKE ?)"
                    .into(),
            );
            let folded = format!("%{}%", term.to_lowercase());
            for _ in 0..3 {
                args.push(Box::new(folded.clone()));
            }
        }
        if let Some(id) = filter.etablissement_id {
            clauses.push("etablissement_id = ?".into());
            args.push(Box::new(id));
        }
        if let Some(d) = trimmed(filter.diplome.as_deref()) {
            clauses.push("LOWER(IFNULL(diplome,'')) = LOWER(?)".into());
            args.push(Box::new(d.to_string()));
        }
        if let Some(l) = trimmed(filter.langue.as_deref()) {
            clauses.push("LOWER(IFNULL(langue,'')) = LOWER(?)".into());
            args.push(Box::new(l.to_string()));
        }
        if let Some(b) = trimmed(filter.bac_type.as_deref()) {
            clauses.push("bac_type = ?".into());
            args.push(Box::new(b.to_string()));
        }
        if let Some(active) = filter.is_active {
            clauses.push("is_active = ?".into());
            args.push(Box::new(active));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT * FROM filieres{} ORDER BY nom COLLATE NOCASE ASC, id ASC",
            where_sql
        );

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), |row| {
                Ok(Self::row_to_filiere(row))
            })
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Count all filières.
    pub fn count_filieres(&self) -> Result<i64> {
        self.count_rows("filieres")
    }

    // ---------------------------------------------------------------
    // Secteur / Métier CRUD
    // ---------------------------------------------------------------

    /// Insert a sector, ignoring duplicates on the stable code.
    /// Returns the row ID (existing or new).
    pub fn add_secteur(&self, new: &NewSecteur) -> Result<i64> {
        let mots = serde_json::to_string(&new.mots_cles).unwrap_or_else(|_| "[]".into());
        let metiers = serde_json::to_string(&new.metiers).unwrap_or_else(|_| "[]".into());

        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT OR IGNORE INTO secteurs (titre, code, mots_cles_json, metiers_json, \
             salaire_min, salaire_max, is_active) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(|e| Error::Database(e.to_string()))?
        .execute(params![
            new.titre,
            new.code,
            mots,
            metiers,
            new.salaire_min,
            new.salaire_max,
            new.is_active,
        ])
        .map_err(|e| Error::Database(e.to_string()))?;

        let id: i64 = conn
            .prepare_cached("SELECT id FROM secteurs WHERE code = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![new.code], |row| row.get(0))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Insert a métier under a sector. Returns the new row ID.
    pub fn add_metier(&self, secteur_id: i64, nom: &str, is_active: bool) -> Result<i64> {
        let conn = self.conn.lock();
        let id = conn
            .prepare_cached("INSERT INTO metiers (secteur_id, nom, is_active) VALUES (?1, ?2, ?3)")
            .map_err(|e| Error::Database(e.to_string()))?
            .insert(params![secteur_id, nom, is_active])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(id)
    }

    /// Get a sector by its stable code.
    pub fn get_secteur_by_code(&self, code: &str) -> Result<Option<Secteur>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached("SELECT * FROM secteurs WHERE code = ?1")
            .map_err(|e| Error::Database(e.to_string()))?
            .query_row(params![code], |row| Ok(Self::row_to_secteur(row)))
            .optional()
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(row)
    }

    /// All sectors, optionally restricted to active ones, in title order.
    pub fn list_secteurs(&self, active_only: bool) -> Result<Vec<Secteur>> {
        let sql = if active_only {
            "SELECT * FROM secteurs WHERE is_active = 1 ORDER BY titre COLLATE NOCASE ASC, id ASC"
        } else {
            "SELECT * FROM secteurs ORDER BY titre COLLATE NOCASE ASC, id ASC"
        };
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(sql)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_secteur(row)))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// The `code → id` catalog the classifiers resolve against.
    pub fn secteur_catalog(&self) -> Result<BTreeMap<String, i64>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT code, id FROM secteurs")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(|e| Error::Database(e.to_string()))?;
        let mut catalog = BTreeMap::new();
        for row in rows {
            let (code, id) = row.map_err(|e| Error::Database(e.to_string()))?;
            catalog.insert(code, id);
        }
        Ok(catalog)
    }

    /// Count all sectors.
    pub fn count_secteurs(&self) -> Result<i64> {
        self.count_rows("secteurs")
    }

    // ---------------------------------------------------------------
    // Sector full-text matcher
    // ---------------------------------------------------------------

    /// IDs of active sectors whose title, keyword list, occupation list, or
    /// any linked active métier name contains `term` (case-insensitive).
    ///
    /// The term is expected pre-normalized by the caller; no accent folding
    /// happens at this layer.
    pub fn match_secteurs(&self, term: &str) -> Result<BTreeSet<i64>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(BTreeSet::new());
        }
        let like = format!("%{}%", term.to_lowercase());

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached(
                "SELECT DISTINCT s.id FROM secteurs s \
                 WHERE s.is_active = 1 AND ( \
                     LOWER(s.titre) LIKE ?1 \
                     OR LOWER(IFNULL(s.mots_cles_json,'')) LIKE ?1 \
                     OR LOWER(IFNULL(s.metiers_json,'')) LIKE ?1 \
                     OR EXISTS (SELECT 1 FROM metiers m \
                                WHERE m.secteur_id = s.id AND m.is_active = 1 \
                                  AND LOWER(m.nom) LIKE ?1))",
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![like], |row| row.get::<_, i64>(0))
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut ids = BTreeSet::new();
        for row in rows {
            ids.insert(row.map_err(|e| Error::Database(e.to_string()))?);
        }
        debug!("match_secteurs({:?}) -> {} sectors", term, ids.len());
        Ok(ids)
    }

    /// Union of filière sector IDs grouped by owning establishment,
    /// computed in one scan so search cost stays linear in candidates.
    pub fn filiere_secteurs_by_etablissement(&self) -> Result<HashMap<i64, BTreeSet<i64>>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare_cached("SELECT etablissement_id, secteurs_ids FROM filieres")
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                ))
            })
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut map: HashMap<i64, BTreeSet<i64>> = HashMap::new();
        for row in rows {
            let (etab_id, raw) = row.map_err(|e| Error::Database(e.to_string()))?;
            let ids = decode_secteurs_ids(raw.as_deref());
            if !ids.is_empty() {
                map.entry(etab_id).or_default().extend(ids);
            }
        }
        Ok(map)
    }

    // ---------------------------------------------------------------
    // Denormalized-column updates
    // ---------------------------------------------------------------

    /// Overwrite an establishment's sector-ID set (normalized on write).
    pub fn update_etablissement_secteurs(&self, id: i64, ids: &[i64]) -> Result<bool> {
        let encoded = encode_secteurs_ids(ids);
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE etablissements SET secteurs_ids = ?1, updated_at = ?2 WHERE id = ?3",
                params![encoded, Self::now_millis(), id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Overwrite a filière's sector-ID set (normalized on write).
    pub fn update_filiere_secteurs(&self, id: i64, ids: &[i64]) -> Result<bool> {
        let encoded = encode_secteurs_ids(ids);
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE filieres SET secteurs_ids = ?1 WHERE id = ?2",
                params![encoded, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Overwrite a filière's bac profile columns.
    pub fn update_filiere_bac(
        &self,
        id: i64,
        bac_type: Option<&str>,
        acceptees: &[String],
        combinaisons: &[(String, String)],
    ) -> Result<bool> {
        let acceptees_json = serde_json::to_string(acceptees).unwrap_or_else(|_| "[]".into());
        let combos_json = serde_json::to_string(combinaisons).unwrap_or_else(|_| "[]".into());
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE filieres SET bac_type = ?1, filieres_acceptees_json = ?2, \
                 combinaisons_bac_mission_json = ?3 WHERE id = ?4",
                params![bac_type, acceptees_json, combos_json, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Overwrite a filière's study-duration bounds.
    pub fn update_filiere_duree(&self, id: i64, min: i64, max: i64) -> Result<bool> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE filieres SET duree_min = ?1, duree_max = ?2 WHERE id = ?3",
                params![min, max, id],
            )
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(count > 0)
    }

    // ---------------------------------------------------------------
    // Schema maintenance
    // ---------------------------------------------------------------

    /// Add a column if it does not exist yet. Returns true when added.
    ///
    /// Table and column names come from hardcoded job constants, so string
    /// assembly here is injection-safe (same note as PRAGMA probing).
    pub fn ensure_column(&self, table: &str, column: &str, decl: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let existing = Self::column_names(&conn, table)?;
        if existing.iter().any(|c| c == column) {
            return Ok(false);
        }
        conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))
            .map_err(|e| Error::Database(e.to_string()))?;
        info!("Added column {}.{}", table, column);
        Ok(true)
    }

    /// Column names of a table via PRAGMA table_info.
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        Self::column_names(&conn, table)
    }

    fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>> {
        let query = format!("PRAGMA table_info({})", table);
        let mut stmt = conn
            .prepare(&query)
            .map_err(|e| Error::Database(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    // ---------------------------------------------------------------
    // Stats
    // ---------------------------------------------------------------

    /// Store statistics for reports.
    pub fn stats(&self) -> Result<StoreStats> {
        let etablissements = self.count_etablissements()?;
        let filieres = self.count_filieres()?;
        let secteurs = self.count_secteurs()?;
        let metiers = self.count_rows("metiers")?;

        let conn = self.conn.lock();
        let classified = |table: &str| -> Result<i64> {
            conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {} WHERE secteurs_ids IS NOT NULL \
                     AND secteurs_ids != '' AND secteurs_ids != '[]'",
                    table
                ),
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(e.to_string()))
        };
        let etablissements_classifies = classified("etablissements")?;
        let filieres_classifiees = classified("filieres")?;
        drop(conn);

        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            etablissements,
            filieres,
            secteurs,
            metiers,
            etablissements_classifies,
            filieres_classifiees,
            db_path: self.db_path.to_string_lossy().to_string(),
            db_size_mb: db_size as f64 / (1024.0 * 1024.0),
        })
    }

    fn count_rows(&self, table: &str) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .map_err(|e| Error::Database(e.to_string()))
    }

    // ---------------------------------------------------------------
    // Row mapping helpers
    // ---------------------------------------------------------------

    fn row_to_etablissement(row: &rusqlite::Row<'_>) -> Etablissement {
        Etablissement {
            id: row.get("id").unwrap_or(0),
            nom: row.get("nom").unwrap_or_default(),
            sigle: row.get("sigle").ok().flatten(),
            nom_ar: row.get("nom_ar").ok().flatten(),
            type_: row.get("type").ok().flatten(),
            ville: row.get("ville").ok().flatten(),
            villes: decode_string_list(
                row.get::<_, Option<String>>("villes_json").ok().flatten().as_deref(),
            ),
            universite_id: row.get("universite_id").ok().flatten(),
            universite: row.get("universite").ok().flatten(),
            email: row.get("email").ok().flatten(),
            diplomes: decode_string_list(
                row.get::<_, Option<String>>("diplomes_json").ok().flatten().as_deref(),
            ),
            secteurs_ids: decode_secteurs_ids(
                row.get::<_, Option<String>>("secteurs_ids").ok().flatten().as_deref(),
            ),
            is_active: row.get("is_active").unwrap_or(false),
            status: row.get("status").unwrap_or_else(|_| "draft".to_string()),
            is_recommended: row.get("is_recommended").unwrap_or(false),
            is_sponsored: row.get("is_sponsored").unwrap_or(false),
            is_featured: row.get("is_featured").unwrap_or(false),
            echange_international: row.get("echange_international").unwrap_or(false),
            accreditation_etat: row.get("accreditation_etat").unwrap_or(false),
            created_at: row.get("created_at").unwrap_or(0),
            updated_at: row.get("updated_at").ok().flatten(),
        }
    }

    fn row_to_filiere(row: &rusqlite::Row<'_>) -> Filiere {
        Filiere {
            id: row.get("id").unwrap_or(0),
            etablissement_id: row.get("etablissement_id").unwrap_or(0),
            nom: row.get("nom").unwrap_or_default(),
            description: row.get("description").ok().flatten(),
            diplome: row.get("diplome").ok().flatten(),
            langue: row.get("langue").ok().flatten(),
            duree_min: row.get("duree_min").ok().flatten(),
            duree_max: row.get("duree_max").ok().flatten(),
            bac_type: row.get("bac_type").ok().flatten(),
            filieres_acceptees: decode_string_list(
                row.get::<_, Option<String>>("filieres_acceptees_json")
                    .ok()
                    .flatten()
                    .as_deref(),
            ),
            combinaisons_bac_mission: decode_pairs(
                row.get::<_, Option<String>>("combinaisons_bac_mission_json")
                    .ok()
                    .flatten()
                    .as_deref(),
            ),
            conditions_acces: row.get("conditions_acces").ok().flatten(),
            secteurs_ids: decode_secteurs_ids(
                row.get::<_, Option<String>>("secteurs_ids").ok().flatten().as_deref(),
            ),
            is_active: row.get("is_active").unwrap_or(false),
            created_at: row.get("created_at").unwrap_or(0),
        }
    }

    fn row_to_secteur(row: &rusqlite::Row<'_>) -> Secteur {
        Secteur {
            id: row.get("id").unwrap_or(0),
            titre: row.get("titre").unwrap_or_default(),
            code: row.get("code").unwrap_or_default(),
            mots_cles: decode_string_list(
                row.get::<_, Option<String>>("mots_cles_json").ok().flatten().as_deref(),
            ),
            metiers: decode_string_list(
                row.get::<_, Option<String>>("metiers_json").ok().flatten().as_deref(),
            ),
            salaire_min: row.get("salaire_min").ok().flatten(),
            salaire_max: row.get("salaire_max").ok().flatten(),
            is_active: row.get("is_active").unwrap_or(false),
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("orienta.db")).unwrap();
        (store, dir)
    }

    fn etab(nom: &str) -> NewEtablissement {
        NewEtablissement {
            nom: nom.to_string(),
            is_active: true,
            status: Some("published".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get_etablissement() {
        let (store, _dir) = test_store();
        let id = store
            .add_etablissement(&NewEtablissement {
                nom: "École Mohammadia d'Ingénieurs".into(),
                sigle: Some("EMI".into()),
                nom_ar: Some("المدرسة المحمدية للمهندسين".into()),
                ville: Some("Rabat".into()),
                diplomes: vec!["Ingénieur d'État".into()],
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        let e = store.get_etablissement(id).unwrap().unwrap();
        assert_eq!(e.sigle.as_deref(), Some("EMI"));
        assert_eq!(e.diplomes, vec!["Ingénieur d'État".to_string()]);
        assert!(e.secteurs_ids.is_empty());

        assert!(store.get_etablissement(9999).unwrap().is_none());
    }

    #[test]
    fn test_empty_filter_returns_everything_name_ascending() {
        let (store, _dir) = test_store();
        store.add_etablissement(&etab("Zénith Business School")).unwrap();
        store.add_etablissement(&etab("Académie des Arts")).unwrap();
        store.add_etablissement(&etab("mundiapolis")).unwrap();

        let all = store.find_etablissements(&EtablissementFilter::default()).unwrap();
        let noms: Vec<&str> = all.iter().map(|e| e.nom.as_str()).collect();
        assert_eq!(noms, vec!["Académie des Arts", "mundiapolis", "Zénith Business School"]);
    }

    #[test]
    fn test_name_tie_break_is_row_id() {
        let (store, _dir) = test_store();
        let a = store.add_etablissement(&etab("Institut Atlas")).unwrap();
        let b = store.add_etablissement(&etab("Institut Atlas")).unwrap();

        let all = store.find_etablissements(&EtablissementFilter::default()).unwrap();
        assert_eq!(all.iter().map(|e| e.id).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_search_or_across_scalar_columns() {
        let (store, _dir) = test_store();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Université Internationale".into(),
                ville: Some("Casablanca".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Institut du Nord".into(),
                email: Some("contact@casablanca-institute.ma".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store.add_etablissement(&etab("École du Sud")).unwrap();

        let found = store
            .find_etablissements(&EtablissementFilter {
                search: Some("casablanca".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_search_native_script_exact_substring() {
        let (store, _dir) = test_store();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Université Mohammed V".into(),
                nom_ar: Some("جامعة محمد الخامس".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        let found = store
            .find_etablissements(&EtablissementFilter {
                search: Some("محمد".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_universite_numeric_vs_name() {
        let (store, _dir) = test_store();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Faculté des Sciences".into(),
                universite_id: Some(5),
                universite: Some("Université Hassan II".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store
            .add_etablissement(&NewEtablissement {
                nom: "École des 5 Continents".into(),
                universite: Some("Groupe 5 Étoiles".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        // "5" parses as an integer: ID equality only, never name matching.
        let found = store
            .find_etablissements(&EtablissementFilter {
                universite: Some(UniversiteRef::parse("5")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].universite_id, Some(5));

        let found = store
            .find_etablissements(&EtablissementFilter {
                universite: Some(UniversiteRef::parse("hassan")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Faculté des Sciences");
    }

    #[test]
    fn test_facet_flags_truthy_only() {
        let (store, _dir) = test_store();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Recommandée".into(),
                is_recommended: true,
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store.add_etablissement(&etab("Ordinaire")).unwrap();

        let found = store
            .find_etablissements(&EtablissementFilter {
                is_recommended: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Recommandée");

        // Some(false) issues no constraint at all.
        let found = store
            .find_etablissements(&EtablissementFilter {
                is_recommended: Some(false),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_conjunctive_filters() {
        let (store, _dir) = test_store();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Privée Casa".into(),
                type_: Some("prive".into()),
                ville: Some("Casablanca".into()),
                is_active: true,
                status: Some("published".into()),
                ..Default::default()
            })
            .unwrap();
        store
            .add_etablissement(&NewEtablissement {
                nom: "Publique Casa".into(),
                type_: Some("public".into()),
                ville: Some("Casablanca".into()),
                is_active: true,
                status: Some("published".into()),
                ..Default::default()
            })
            .unwrap();

        let found = store
            .find_etablissements(&EtablissementFilter {
                ville: Some("casablanca".into()),
                type_: Some("prive".into()),
                status: Some("published".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Privée Casa");
    }

    #[test]
    fn test_delete_etablissement_cascades_filieres() {
        let (store, _dir) = test_store();
        let id = store.add_etablissement(&etab("À Supprimer")).unwrap();
        store
            .add_filiere(&NewFiliere {
                etablissement_id: id,
                nom: "Génie Civil".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(store.count_filieres().unwrap(), 1);

        assert!(store.delete_etablissement(id).unwrap());
        assert_eq!(store.count_filieres().unwrap(), 0);
    }

    #[test]
    fn test_update_secteurs_normalizes_on_write() {
        let (store, _dir) = test_store();
        let id = store.add_etablissement(&etab("Classée")).unwrap();
        store.update_etablissement_secteurs(id, &[9, 2, 2, 5, 9]).unwrap();

        let e = store.get_etablissement(id).unwrap().unwrap();
        assert_eq!(e.secteurs_ids, vec![2, 5, 9]);
        assert!(e.updated_at.is_some());
    }

    fn seed_sante(store: &Store) -> i64 {
        let id = store
            .add_secteur(&NewSecteur {
                titre: "Santé".into(),
                code: "SANTE".into(),
                mots_cles: vec!["médecine".into(), "soins".into()],
                metiers: vec!["Médecin".into(), "Infirmier".into()],
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store.add_metier(id, "Pharmacien", true).unwrap();
        id
    }

    #[test]
    fn test_match_secteurs_via_metier_relation() {
        let (store, _dir) = test_store();
        let sante = seed_sante(&store);
        store
            .add_secteur(&NewSecteur {
                titre: "Banque & Finance".into(),
                code: "FINANCE".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        // "pharmacien" appears in no keyword/occupation list; only the
        // linked métier row carries it.
        let ids = store.match_secteurs("pharmacien").unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![sante]);
    }

    #[test]
    fn test_match_secteurs_ignores_inactive() {
        let (store, _dir) = test_store();
        let id = store
            .add_secteur(&NewSecteur {
                titre: "Santé".into(),
                code: "SANTE".into(),
                is_active: false,
                ..Default::default()
            })
            .unwrap();
        store.add_metier(id, "Pharmacien", true).unwrap();
        assert!(store.match_secteurs("pharmacien").unwrap().is_empty());
        assert!(store.match_secteurs("  ").unwrap().is_empty());
    }

    #[test]
    fn test_secteur_catalog_and_idempotent_seed() {
        let (store, _dir) = test_store();
        let first = seed_sante(&store);
        // Re-seeding the same code must keep the same row.
        let second = store
            .add_secteur(&NewSecteur {
                titre: "Santé".into(),
                code: "SANTE".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(first, second);

        let catalog = store.secteur_catalog().unwrap();
        assert_eq!(catalog.get("SANTE"), Some(&first));
    }

    #[test]
    fn test_filiere_secteurs_by_etablissement() {
        let (store, _dir) = test_store();
        let e1 = store.add_etablissement(&etab("Un")).unwrap();
        let e2 = store.add_etablissement(&etab("Deux")).unwrap();
        let f1 = store
            .add_filiere(&NewFiliere {
                etablissement_id: e1,
                nom: "A".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        let f2 = store
            .add_filiere(&NewFiliere {
                etablissement_id: e1,
                nom: "B".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store
            .add_filiere(&NewFiliere {
                etablissement_id: e2,
                nom: "C".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store.update_filiere_secteurs(f1, &[3, 1]).unwrap();
        store.update_filiere_secteurs(f2, &[1, 7]).unwrap();

        let map = store.filiere_secteurs_by_etablissement().unwrap();
        assert_eq!(
            map.get(&e1).unwrap().iter().copied().collect::<Vec<_>>(),
            vec![1, 3, 7]
        );
        assert!(map.get(&e2).is_none());
    }

    #[test]
    fn test_update_filiere_bac_and_duree() {
        let (store, _dir) = test_store();
        let e = store.add_etablissement(&etab("Hôte")).unwrap();
        let f = store
            .add_filiere(&NewFiliere {
                etablissement_id: e,
                nom: "Médecine".into(),
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        store
            .update_filiere_bac(
                f,
                Some("both"),
                &["Sciences Maths A".into(), "SVT".into()],
                &[("Générale".into(), "SVT".into())],
            )
            .unwrap();
        store.update_filiere_duree(f, 7, 7).unwrap();

        let row = store.get_filiere(f).unwrap().unwrap();
        assert_eq!(row.bac_type.as_deref(), Some("both"));
        assert_eq!(row.filieres_acceptees.len(), 2);
        assert_eq!(
            row.combinaisons_bac_mission,
            vec![("Générale".to_string(), "SVT".to_string())]
        );
        assert_eq!((row.duree_min, row.duree_max), (Some(7), Some(7)));
    }

    #[test]
    fn test_ensure_column_idempotent() {
        let (store, _dir) = test_store();
        // Already present in the schema: nothing to do.
        assert!(!store.ensure_column("filieres", "bac_type", "TEXT").unwrap());
        // Genuinely missing: added once, then a no-op.
        assert!(store.ensure_column("filieres", "legacy_flag", "INTEGER").unwrap());
        assert!(!store.ensure_column("filieres", "legacy_flag", "INTEGER").unwrap());
        assert!(store
            .table_columns("filieres")
            .unwrap()
            .contains(&"legacy_flag".to_string()));
    }

    #[test]
    fn test_open_existing_requires_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent.db");
        assert!(matches!(
            Store::open_existing(&missing),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_find_filieres_filters() {
        let (store, _dir) = test_store();
        let e = store.add_etablissement(&etab("Hôte")).unwrap();
        store
            .add_filiere(&NewFiliere {
                etablissement_id: e,
                nom: "Génie Informatique".into(),
                diplome: Some("Ingénieur".into()),
                langue: Some("Français".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();
        store
            .add_filiere(&NewFiliere {
                etablissement_id: e,
                nom: "Commerce International".into(),
                diplome: Some("Licence".into()),
                is_active: true,
                ..Default::default()
            })
            .unwrap();

        let found = store
            .find_filieres(&FiliereFilter {
                search: Some("informatique".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);

        let found = store
            .find_filieres(&FiliereFilter {
                diplome: Some("licence".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].nom, "Commerce International");
    }

    #[test]
    fn test_stats() {
        let (store, _dir) = test_store();
        let e = store.add_etablissement(&etab("Classée")).unwrap();
        store.add_etablissement(&etab("Brute")).unwrap();
        store.update_etablissement_secteurs(e, &[1]).unwrap();
        seed_sante(&store);

        let stats = store.stats().unwrap();
        assert_eq!(stats.etablissements, 2);
        assert_eq!(stats.etablissements_classifies, 1);
        assert_eq!(stats.secteurs, 1);
        assert_eq!(stats.metiers, 1);
    }
}

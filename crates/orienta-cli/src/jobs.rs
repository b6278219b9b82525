//! Bulk maintenance jobs over the denormalized columns.
//!
//! Every job walks its table sequentially and issues one UPDATE per record.
//! Per-record failures are logged, counted and skipped; a run only aborts
//! when `MAX_CONSECUTIVE_FAILURES` records fail back to back, which points
//! at a systemic problem rather than bad data in one row.
//!
//! Concurrent runs of the same job against the same database are
//! last-writer-wins: the jobs overwrite their columns wholesale and take no
//! locks beyond SQLite's own. Known constraint, not a bug.

use tracing::{info, warn};

use orienta_classify::{classify_bac, classify_duration, keywords, Classifier};
use orienta_core::{Error, Result};
use orienta_store::{EtablissementFilter, FiliereFilter, Store};

/// Consecutive per-record failures tolerated before a run aborts.
pub const MAX_CONSECUTIVE_FAILURES: usize = 10;

/// Outcome counters for one job run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub job: &'static str,
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub aborted: bool,
}

impl RunReport {
    fn new(job: &'static str) -> Self {
        Self {
            job,
            scanned: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            aborted: false,
        }
    }

    /// Print the human-readable run summary.
    pub fn print(&self) {
        println!("=== {} ===", self.job);
        println!("Scanned:  {}", self.scanned);
        println!("Updated:  {}", self.updated);
        println!("Skipped:  {}", self.skipped);
        println!("Errors:   {}", self.errors);
        if self.aborted {
            println!();
            println!(
                "Status: ABORTED after {} consecutive failures",
                MAX_CONSECUTIVE_FAILURES
            );
        }
    }
}

/// Tracks the consecutive-failure circuit breaker for a run.
struct Breaker {
    consecutive: usize,
}

impl Breaker {
    fn new() -> Self {
        Self { consecutive: 0 }
    }

    fn ok(&mut self) {
        self.consecutive = 0;
    }

    /// Record a failure; true means the run should abort.
    fn failed(&mut self) -> bool {
        self.consecutive += 1;
        self.consecutive >= MAX_CONSECUTIVE_FAILURES
    }
}

fn require_table(store: &Store, table: &str) -> Result<()> {
    if store.table_columns(table)?.is_empty() {
        return Err(Error::Config(format!("missing required table '{}'", table)));
    }
    Ok(())
}

/// Recompute `secteurs_ids` for every establishment from its name and
/// abbreviation. Idempotent: unchanged values are skipped.
pub fn run_classify_etablissements(store: &Store) -> Result<RunReport> {
    require_table(store, "etablissements")?;
    require_table(store, "secteurs")?;
    store.ensure_column("etablissements", "secteurs_ids", "TEXT")?;

    let catalog = store.secteur_catalog()?;
    let classifier = Classifier::new(keywords::etablissement_config(), &catalog)?;

    let rows = store.find_etablissements(&EtablissementFilter::default())?;
    let mut report = RunReport::new("classify-etablissements");
    let mut breaker = Breaker::new();

    for e in rows {
        report.scanned += 1;
        let ids = classifier.classify_with_sigle(&e.nom, e.sigle.as_deref());
        if ids == e.secteurs_ids {
            report.skipped += 1;
            breaker.ok();
            continue;
        }
        match store.update_etablissement_secteurs(e.id, &ids) {
            Ok(_) => {
                report.updated += 1;
                breaker.ok();
            }
            Err(err) => {
                warn!("etablissement {} ({}): {}", e.id, e.nom, err);
                report.errors += 1;
                if breaker.failed() {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    info!(
        "classify-etablissements: {} scanned, {} updated, {} skipped, {} errors",
        report.scanned, report.updated, report.skipped, report.errors
    );
    Ok(report)
}

/// Recompute `secteurs_ids` for every filière from its name.
pub fn run_classify_filieres(store: &Store) -> Result<RunReport> {
    require_table(store, "filieres")?;
    require_table(store, "secteurs")?;
    store.ensure_column("filieres", "secteurs_ids", "TEXT")?;

    let catalog = store.secteur_catalog()?;
    let classifier = Classifier::new(keywords::filiere_config(), &catalog)?;

    let rows = store.find_filieres(&FiliereFilter::default())?;
    let mut report = RunReport::new("classify-filieres");
    let mut breaker = Breaker::new();

    for f in rows {
        report.scanned += 1;
        let ids = classifier.classify(&f.nom);
        if ids == f.secteurs_ids {
            report.skipped += 1;
            breaker.ok();
            continue;
        }
        match store.update_filiere_secteurs(f.id, &ids) {
            Ok(_) => {
                report.updated += 1;
                breaker.ok();
            }
            Err(err) => {
                warn!("filiere {} ({}): {}", f.id, f.nom, err);
                report.errors += 1;
                if breaker.failed() {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    info!(
        "classify-filieres: {} scanned, {} updated, {} skipped, {} errors",
        report.scanned, report.updated, report.skipped, report.errors
    );
    Ok(report)
}

/// Derive bac columns for every filière from its name and legacy
/// access-conditions field. Rows whose legacy field holds malformed JSON
/// are counted as errors and skipped.
pub fn run_update_bac(store: &Store) -> Result<RunReport> {
    require_table(store, "filieres")?;
    store.ensure_column("filieres", "bac_type", "TEXT")?;
    store.ensure_column("filieres", "filieres_acceptees_json", "TEXT")?;
    store.ensure_column("filieres", "combinaisons_bac_mission_json", "TEXT")?;

    let rows = store.find_filieres(&FiliereFilter::default())?;
    let mut report = RunReport::new("update-bac");
    let mut breaker = Breaker::new();

    for f in rows {
        report.scanned += 1;
        let profile = match classify_bac(&f.nom, f.conditions_acces.as_deref()) {
            Ok(p) => p,
            Err(err) => {
                warn!("filiere {} ({}): {}", f.id, f.nom, err);
                report.errors += 1;
                if breaker.failed() {
                    report.aborted = true;
                    break;
                }
                continue;
            }
        };

        let bac_type = profile.bac_type.map(|b| b.as_str().to_string());
        let unchanged = bac_type == f.bac_type
            && profile.filieres_acceptees == f.filieres_acceptees
            && profile.combinaisons_mission == f.combinaisons_bac_mission;
        if unchanged {
            report.skipped += 1;
            breaker.ok();
            continue;
        }

        match store.update_filiere_bac(
            f.id,
            bac_type.as_deref(),
            &profile.filieres_acceptees,
            &profile.combinaisons_mission,
        ) {
            Ok(_) => {
                report.updated += 1;
                breaker.ok();
            }
            Err(err) => {
                warn!("filiere {} ({}): {}", f.id, f.nom, err);
                report.errors += 1;
                if breaker.failed() {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    info!(
        "update-bac: {} scanned, {} updated, {} skipped, {} errors",
        report.scanned, report.updated, report.skipped, report.errors
    );
    Ok(report)
}

/// Derive study-duration bounds for every filière. Rows with no matching
/// degree keyword are left untouched.
pub fn run_update_durations(store: &Store) -> Result<RunReport> {
    require_table(store, "filieres")?;
    store.ensure_column("filieres", "duree_min", "INTEGER")?;
    store.ensure_column("filieres", "duree_max", "INTEGER")?;

    let rows = store.find_filieres(&FiliereFilter::default())?;
    let mut report = RunReport::new("update-durations");
    let mut breaker = Breaker::new();

    for f in rows {
        report.scanned += 1;
        let (min, max) = match classify_duration(f.diplome.as_deref(), &f.nom) {
            Some(bounds) => bounds,
            None => {
                report.skipped += 1;
                breaker.ok();
                continue;
            }
        };
        if f.duree_min == Some(min) && f.duree_max == Some(max) {
            report.skipped += 1;
            breaker.ok();
            continue;
        }
        match store.update_filiere_duree(f.id, min, max) {
            Ok(_) => {
                report.updated += 1;
                breaker.ok();
            }
            Err(err) => {
                warn!("filiere {} ({}): {}", f.id, f.nom, err);
                report.errors += 1;
                if breaker.failed() {
                    report.aborted = true;
                    break;
                }
            }
        }
    }

    info!(
        "update-durations: {} scanned, {} updated, {} skipped, {} errors",
        report.scanned, report.updated, report.skipped, report.errors
    );
    Ok(report)
}

//! Database validation — checks an existing database against the expected
//! schema and the invariants the maintenance jobs rely on.

use std::path::Path;

use rusqlite::Connection;

use orienta_store::decode_secteurs_ids;

/// Result of a validation run.
#[derive(Debug)]
pub struct ValidationReport {
    pub db_valid: bool,
    pub etablissements: i64,
    pub filieres: i64,
    pub secteurs: i64,
    pub metiers: i64,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Validate the database at `db_path` read-only.
pub fn validate(db_path: &Path) -> ValidationReport {
    let mut report = ValidationReport {
        db_valid: false,
        etablissements: 0,
        filieres: 0,
        secteurs: 0,
        metiers: 0,
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    if !db_path.exists() {
        report
            .errors
            .push(format!("Database not found: {}", db_path.display()));
        return report;
    }

    let conn = match Connection::open_with_flags(db_path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
    {
        Ok(c) => c,
        Err(e) => {
            report.errors.push(format!("Failed to open database: {}", e));
            return report;
        }
    };

    let required_tables = ["etablissements", "filieres", "secteurs", "metiers"];
    for table in &required_tables {
        match table_exists(&conn, table) {
            Ok(true) => {}
            Ok(false) => report.errors.push(format!("Missing required table: {}", table)),
            Err(e) => report.errors.push(format!("Error checking table {}: {}", table, e)),
        }
    }
    if !report.errors.is_empty() {
        return report;
    }

    let etab_columns = get_column_names(&conn, "etablissements");
    for col in ["id", "nom", "ville", "secteurs_ids", "is_active", "status", "created_at"] {
        if !etab_columns.contains(&col.to_string()) {
            report
                .errors
                .push(format!("etablissements table missing column: {}", col));
        }
    }

    let filiere_columns = get_column_names(&conn, "filieres");
    for col in ["id", "etablissement_id", "nom", "secteurs_ids", "created_at"] {
        if !filiere_columns.contains(&col.to_string()) {
            report
                .errors
                .push(format!("filieres table missing column: {}", col));
        }
    }

    let secteur_columns = get_column_names(&conn, "secteurs");
    for col in ["id", "titre", "code", "is_active"] {
        if !secteur_columns.contains(&col.to_string()) {
            report
                .errors
                .push(format!("secteurs table missing column: {}", col));
        }
    }

    if !report.errors.is_empty() {
        return report;
    }

    report.db_valid = true;
    report.etablissements = count_rows(&conn, "etablissements").unwrap_or(0);
    report.filieres = count_rows(&conn, "filieres").unwrap_or(0);
    report.secteurs = count_rows(&conn, "secteurs").unwrap_or(0);
    report.metiers = count_rows(&conn, "metiers").unwrap_or(0);

    // Denormalized sector-ID invariant: deduplicated, ascending, or absent.
    for table in ["etablissements", "filieres"] {
        match count_secteurs_ids_violations(&conn, table) {
            Ok(0) => {}
            Ok(n) => report.warnings.push(format!(
                "{} rows in {} have non-normalized secteurs_ids (re-run the classify job)",
                n, table
            )),
            Err(e) => report
                .warnings
                .push(format!("Cannot check secteurs_ids in {}: {}", table, e)),
        }
    }

    if let Ok(orphans) = conn.query_row(
        "SELECT COUNT(*) FROM filieres WHERE etablissement_id NOT IN (SELECT id FROM etablissements)",
        [],
        |row| row.get::<_, i64>(0),
    ) {
        if orphans > 0 {
            report.warnings.push(format!("{} orphaned filières found", orphans));
        }
    }

    if filiere_columns.contains(&"bac_type".to_string()) {
        if let Ok(bad) = conn.query_row(
            "SELECT COUNT(*) FROM filieres WHERE bac_type IS NOT NULL \
             AND bac_type NOT IN ('normal', 'mission', 'both')",
            [],
            |row| row.get::<_, i64>(0),
        ) {
            if bad > 0 {
                report
                    .warnings
                    .push(format!("{} filières carry an unknown bac_type value", bad));
            }
        }
    }

    if report.secteurs == 0 {
        report
            .warnings
            .push("Sector catalog is empty; run 'orienta seed' before classifying".to_string());
    }

    report
}

fn count_secteurs_ids_violations(conn: &Connection, table: &str) -> Result<i64, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT secteurs_ids FROM {} WHERE secteurs_ids IS NOT NULL AND secteurs_ids != ''",
        table
    ))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

    let mut violations = 0;
    for raw in rows.flatten() {
        let decoded = decode_secteurs_ids(Some(&raw));
        let renormalized: Vec<i64> = {
            let mut v = decoded.clone();
            v.sort_unstable();
            v.dedup();
            v
        };
        let reencoded = serde_json::to_string(&renormalized).unwrap_or_default();
        if raw != reencoded && raw != "[]" {
            violations += 1;
        }
    }
    Ok(violations)
}

/// Print a validation report to stdout.
pub fn print_report(report: &ValidationReport) {
    println!("=== Orienta Database Validation ===");
    println!();
    println!("Database valid:   {}", if report.db_valid { "YES" } else { "NO" });
    println!("Etablissements:   {}", report.etablissements);
    println!("Filières:         {}", report.filieres);
    println!("Secteurs:         {}", report.secteurs);
    println!("Métiers:          {}", report.metiers);

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            println!("  - {}", w);
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  - {}", e);
        }
    }

    println!();
    if report.db_valid {
        println!("Status: OK");
    } else {
        println!("Status: INVALID");
    }
}

// Internal helpers

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn get_column_names(conn: &Connection, table: &str) -> Vec<String> {
    // PRAGMA table_info is safe here: table names come from the hardcoded
    // required_tables list.
    let query = format!("PRAGMA table_info({})", table);
    let mut names = Vec::new();
    if let Ok(mut stmt) = conn.prepare(&query) {
        if let Ok(rows) = stmt.query_map([], |row| row.get::<_, String>(1)) {
            for name in rows.flatten() {
                names.push(name);
            }
        }
    }
    names
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64, rusqlite::Error> {
    let query = format!("SELECT COUNT(*) FROM {}", table);
    conn.query_row(&query, [], |row| row.get(0))
}

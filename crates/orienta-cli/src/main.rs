//! Orienta — search, classification and maintenance tooling for the
//! orientation database.

use tracing::info;
use tracing_subscriber::EnvFilter;

mod jobs;
mod seed;
mod validate;

use orienta_core::{DatabaseLocation, Error, Result};
use orienta_search::SearchEngine;
use orienta_store::{EtablissementFilter, Store, UniversiteRef};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let outcome = match command {
        "seed" => cmd_seed(args.get(2).map(String::as_str)),
        "classify-etablissements" => {
            cmd_job(args.get(2).map(String::as_str), jobs::run_classify_etablissements)
        }
        "classify-filieres" => {
            cmd_job(args.get(2).map(String::as_str), jobs::run_classify_filieres)
        }
        "update-bac" => cmd_job(args.get(2).map(String::as_str), jobs::run_update_bac),
        "update-durations" => {
            cmd_job(args.get(2).map(String::as_str), jobs::run_update_durations)
        }
        "validate" => cmd_validate(args.get(2).map(String::as_str)),
        "search" => cmd_search(&args[2..]),
        "stats" => cmd_stats(args.get(2).map(String::as_str)),
        "--help" | "-h" | "help" => {
            print_help();
            return Ok(());
        }
        other => {
            eprintln!("Unknown command: {}. Use 'orienta help' for usage.", other);
            std::process::exit(1);
        }
    };

    match outcome {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!("Orienta — orientation database tooling");
    println!();
    println!("Usage: orienta <command> [sqlite://path | path]");
    println!();
    println!("The database argument may be omitted when ORIENTA_DB is set.");
    println!();
    println!("Commands:");
    println!("  seed [db]                      Seed the reference sector catalog");
    println!("  classify-etablissements [db]   Recompute establishment sector IDs");
    println!("  classify-filieres [db]         Recompute filière sector IDs");
    println!("  update-bac [db]                Derive bac columns from legacy conditions");
    println!("  update-durations [db]          Derive study-duration bounds");
    println!("  validate [db]                  Check schema and invariants (read-only)");
    println!("  search [db] <term> [flags]     Run a search; flags: --ville, --type,");
    println!("                                 --universite, --status");
    println!("  stats [db]                     Print store statistics");
    println!("  help                           Show this help message");
}

fn open_store(arg: Option<&str>) -> Result<Store> {
    let location = DatabaseLocation::resolve(arg)?;
    Store::open(&location.path)
}

/// Jobs run against an existing database only; missing tables are a fatal
/// configuration error, not something to silently create.
fn open_existing_store(arg: Option<&str>) -> Result<Store> {
    let location = DatabaseLocation::resolve(arg)?;
    Store::open_existing(&location.path)
}

fn cmd_seed(db: Option<&str>) -> Result<i32> {
    let store = open_store(db)?;
    let (sectors, metiers) = seed::seed_secteurs(&store)?;
    println!("Sector catalog ready: {} sectors, {} métiers inserted", sectors, metiers);
    Ok(0)
}

fn cmd_job(db: Option<&str>, job: fn(&Store) -> Result<jobs::RunReport>) -> Result<i32> {
    let store = open_existing_store(db)?;
    let report = job(&store)?;
    report.print();
    Ok(if report.aborted { 1 } else { 0 })
}

fn cmd_validate(db: Option<&str>) -> Result<i32> {
    let location = DatabaseLocation::resolve(db)?;
    let report = validate::validate(&location.path);
    validate::print_report(&report);
    Ok(if report.db_valid { 0 } else { 1 })
}

fn cmd_stats(db: Option<&str>) -> Result<i32> {
    let store = open_existing_store(db)?;
    let stats = store.stats()?;
    println!("Etablissements:  {} ({} classified)", stats.etablissements, stats.etablissements_classifies);
    println!("Filières:        {} ({} classified)", stats.filieres, stats.filieres_classifiees);
    println!("Secteurs:        {}", stats.secteurs);
    println!("Métiers:         {}", stats.metiers);
    println!("Database:        {} ({:.2} MB)", stats.db_path, stats.db_size_mb);
    Ok(0)
}

fn cmd_search(rest: &[String]) -> Result<i32> {
    let mut positional: Vec<&str> = Vec::new();
    let mut filter = EtablissementFilter::default();

    let mut i = 0;
    while i < rest.len() {
        let arg = rest[i].as_str();
        if let Some(flag) = arg.strip_prefix("--") {
            let value = rest
                .get(i + 1)
                .ok_or_else(|| Error::Config(format!("flag --{} needs a value", flag)))?
                .clone();
            match flag {
                "ville" => filter.ville = Some(value),
                "type" => filter.type_ = Some(value),
                "universite" => filter.universite = Some(UniversiteRef::parse(&value)),
                "status" => filter.status = Some(value),
                other => {
                    return Err(Error::Config(format!("unknown search flag --{}", other)));
                }
            }
            i += 2;
        } else {
            positional.push(arg);
            i += 1;
        }
    }

    // One positional is the term (database from ORIENTA_DB); two are the
    // database then the term.
    let (db, term) = match positional.as_slice() {
        [term] => (None, *term),
        [db, term] => (Some(*db), *term),
        _ => {
            return Err(Error::Config(
                "usage: orienta search [db] <term> [--ville V] [--type T] [--universite U] [--status S]"
                    .into(),
            ));
        }
    };
    filter.search = Some(term.to_string());

    let store = open_existing_store(db)?;
    let results = SearchEngine::search_etablissements(&store, &filter)?;
    info!("search {:?}: {} result(s)", term, results.len());

    for e in &results {
        let ville = e.ville.as_deref().unwrap_or("-");
        let sigle = e
            .sigle
            .as_deref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default();
        println!("{:>5}  {}{}  [{}]", e.id, e.nom, sigle, ville);
    }
    if results.is_empty() {
        println!("No results.");
    }
    Ok(0)
}

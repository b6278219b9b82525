//! Database location resolution.
//!
//! Maintenance jobs take the database as a single positional argument, a bare
//! filesystem path or a `sqlite://<path>` URL, falling back to the
//! `ORIENTA_DB` environment variable. Any other URL scheme is a fatal
//! configuration error.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Environment variable consulted when no database argument is given.
pub const DB_ENV_VAR: &str = "ORIENTA_DB";

/// A resolved SQLite database location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseLocation {
    pub path: PathBuf,
}

impl DatabaseLocation {
    /// Parse a database location from a CLI argument.
    ///
    /// Accepts `sqlite://some/path.db`, `sqlite:some/path.db`, or a bare
    /// path. URL schemes other than `sqlite` (e.g. `mysql://...`) are
    /// rejected rather than silently treated as paths.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::Config("empty database location".into()));
        }

        if let Some((scheme, rest)) = raw.split_once("://") {
            if !scheme.eq_ignore_ascii_case("sqlite") {
                return Err(Error::Config(format!(
                    "unsupported database scheme '{}' (only sqlite is supported)",
                    scheme
                )));
            }
            if rest.is_empty() {
                return Err(Error::Config("sqlite URL has no path".into()));
            }
            return Ok(Self {
                path: PathBuf::from(rest),
            });
        }

        if let Some(rest) = raw.strip_prefix("sqlite:") {
            if rest.is_empty() {
                return Err(Error::Config("sqlite URL has no path".into()));
            }
            return Ok(Self {
                path: PathBuf::from(rest),
            });
        }

        // Windows drive letters aside, a scheme-looking prefix on a bare
        // path means the caller passed a server-database URL.
        if let Some((scheme, _)) = raw.split_once(':') {
            if scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(Error::Config(format!(
                    "unsupported database scheme '{}' (only sqlite is supported)",
                    scheme
                )));
            }
        }

        Ok(Self {
            path: PathBuf::from(raw),
        })
    }

    /// Resolve from an optional CLI argument, then the environment.
    pub fn resolve(arg: Option<&str>) -> Result<Self> {
        if let Some(raw) = arg {
            return Self::parse(raw);
        }
        match std::env::var(DB_ENV_VAR) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Err(Error::Config(format!(
                "no database given: pass a path/sqlite:// URL or set {}",
                DB_ENV_VAR
            ))),
        }
    }
}

//! Glossary file bootstrap.
//!
//! # Responsibility
//! - Hand out SQLite connections whose schema holds terms, tags and links.
//! - Bring older glossary files forward; refuse files from newer releases.
//!
//! # Invariants
//! - A connection returned from [`open_db`] or [`open_db_in_memory`] is at
//!   [`migrations::target_version`] with foreign keys enforced.
//! - A failed migration leaves the file at the version it had before.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::SchemaStatus;
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The glossary file was written by a newer release of this crate.
    NewerSchema { found: u32, supported: u32 },
    /// A schema step failed and was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "glossary storage error: {err}"),
            Self::NewerSchema { found, supported } => write!(
                f,
                "glossary file uses schema v{found}; this build reads up to v{supported}"
            ),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "glossary schema step v{version} ({name}) failed: {source}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Migration { source, .. } => Some(source),
            Self::NewerSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

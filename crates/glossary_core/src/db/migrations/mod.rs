//! Glossary schema steps.
//!
//! Each step is a SQL script tagged with the `PRAGMA user_version` it
//! leaves behind. Pending steps run together in one transaction.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "terms_tags_links",
    sql: include_str!("0001_init.sql"),
}];

/// Where a glossary file stands relative to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Current(u32),
    /// Steps newer than `found` still have to run.
    Behind { found: u32, target: u32 },
    /// Written by a newer release; never touched.
    Newer { found: u32, supported: u32 },
}

impl SchemaStatus {
    /// Version recorded in the file.
    pub fn found(self) -> u32 {
        match self {
            Self::Current(version) => version,
            Self::Behind { found, .. } | Self::Newer { found, .. } => found,
        }
    }
}

/// Schema version a usable glossary connection must carry.
pub fn target_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Compares the file's `PRAGMA user_version` against [`target_version`].
pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    let found = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let target = target_version();
    Ok(match found.cmp(&target) {
        std::cmp::Ordering::Equal => SchemaStatus::Current(found),
        std::cmp::Ordering::Less => SchemaStatus::Behind { found, target },
        std::cmp::Ordering::Greater => SchemaStatus::Newer {
            found,
            supported: target,
        },
    })
}

/// Runs every pending schema step and returns how many ran.
///
/// # Errors
/// - `NewerSchema` when the file comes from a newer release.
/// - `Migration` naming the step that failed; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let found = match schema_status(conn)? {
        SchemaStatus::Current(_) => return Ok(0),
        SchemaStatus::Newer { found, supported } => {
            return Err(DbError::NewerSchema { found, supported })
        }
        SchemaStatus::Behind { found, .. } => found,
    };

    let tx = conn.transaction()?;
    let mut applied = 0;
    for step in STEPS.iter().filter(|step| step.version > found) {
        let script = format!("{}\nPRAGMA user_version = {};", step.sql, step.version);
        tx.execute_batch(&script)
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
        applied += 1;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        found,
        target_version(),
        applied
    );
    Ok(applied)
}

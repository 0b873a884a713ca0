//! Term store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist terms and their tag links on top of the `terms`, `tags` and
//!   `term_tags` tables.
//! - Apply already reconciled tag sets with find-or-create-by-name
//!   semantics.
//!
//! # Invariants
//! - Every write runs in a single `IMMEDIATE` transaction.
//! - Tag links are replaced wholesale on update; tags themselves are never
//!   deleted.
//! - `created_at` is strictly increasing across creates, so newest-first
//!   order matches creation order.
//! - Listing is `created_at DESC, uuid ASC`; tags per term are name-sorted.

use crate::db::migrations::{schema_status, target_version, SchemaStatus};
use crate::db::DbError;
use crate::model::tag::{Tag, TagId};
use crate::model::term::{Term, TermId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

const TERM_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    content,
    created_at,
    updated_at
FROM terms";

pub type RepoResult<T> = Result<T, RepoError>;

/// Term store failure. Callers propagate it unchanged.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(TermId),
    /// Persisted row cannot be converted into a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "term not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted term data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "term repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "term repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Validated, reconciled field set for one create or full replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermWrite {
    pub title: String,
    pub content: String,
    /// Output of tag reconciliation. Must not be empty.
    pub tags: Vec<Tag>,
}

/// Repository interface for the glossary term store.
pub trait TermRepository {
    /// Lists every term, newest first.
    fn list_terms(&self) -> RepoResult<Vec<Term>>;
    /// Gets one term by id.
    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>>;
    /// Inserts a new term with its tag links and returns the stored row.
    fn create_term(&mut self, write: &TermWrite) -> RepoResult<Term>;
    /// Replaces title, content and the full tag set of an existing term.
    fn update_term(&mut self, id: TermId, write: &TermWrite) -> RepoResult<Term>;
    /// Deletes one term and its links. Shared tags survive.
    fn delete_term(&mut self, id: TermId) -> RepoResult<()>;
    /// Returns the whole tag vocabulary sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed term store.
pub struct SqliteTermRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTermRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the schema was tampered with.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_term_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TermRepository for SqliteTermRepository<'_> {
    fn list_terms(&self) -> RepoResult<Vec<Term>> {
        let mut tags_by_term = load_all_term_tags(self.conn)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{TERM_SELECT_SQL} ORDER BY created_at DESC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut terms = Vec::new();
        while let Some(row) = rows.next()? {
            let uuid_text: String = row.get("uuid")?;
            let tags = tags_by_term.remove(&uuid_text).unwrap_or_default();
            terms.push(parse_term_row(row, tags)?);
        }
        Ok(terms)
    }

    fn get_term(&self, id: TermId) -> RepoResult<Option<Term>> {
        let uuid_text = id.to_string();
        let mut stmt = self
            .conn
            .prepare(&format!("{TERM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid_text.as_str()])?;
        if let Some(row) = rows.next()? {
            let tags = load_tags_for_term(self.conn, uuid_text.as_str())?;
            return Ok(Some(parse_term_row(row, tags)?));
        }
        Ok(None)
    }

    fn create_term(&mut self, write: &TermWrite) -> RepoResult<Term> {
        ensure_has_tags(write)?;
        let id = Uuid::new_v4();
        let id_text = id.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            &format!(
                "INSERT INTO terms (uuid, title, content, created_at, updated_at)
                 SELECT ?1, ?2, ?3, stamp, stamp
                 FROM (
                    SELECT MAX(
                        {NOW_MS_SQL},
                        COALESCE((SELECT MAX(created_at) FROM terms), 0) + 1
                    ) AS stamp
                 );"
            ),
            params![id_text.as_str(), write.title.as_str(), write.content.as_str()],
        )?;
        link_tags(&tx, id_text.as_str(), &write.tags)?;
        tx.commit()?;

        self.get_term(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("created term {id} missing on read-back"))
        })
    }

    fn update_term(&mut self, id: TermId, write: &TermWrite) -> RepoResult<Term> {
        ensure_has_tags(write)?;
        let id_text = id.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!(
                "UPDATE terms
                 SET
                    title = ?2,
                    content = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE uuid = ?1;"
            ),
            params![id_text.as_str(), write.title.as_str(), write.content.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.execute(
            "DELETE FROM term_tags WHERE term_uuid = ?1;",
            [id_text.as_str()],
        )?;
        link_tags(&tx, id_text.as_str(), &write.tags)?;
        tx.commit()?;

        self.get_term(id)?.ok_or(RepoError::NotFound(id))
    }

    fn delete_term(&mut self, id: TermId) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM term_tags WHERE term_uuid = ?1;",
            [id_text.as_str()],
        )?;
        let changed = tx.execute("DELETE FROM terms WHERE uuid = ?1;", [id_text.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uuid, name FROM tags ORDER BY name ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(parse_tag_row(row)?);
        }
        Ok(tags)
    }
}

fn ensure_has_tags(write: &TermWrite) -> RepoResult<()> {
    if write.tags.is_empty() {
        return Err(RepoError::InvalidData(
            "term write requires at least one tag".to_string(),
        ));
    }
    Ok(())
}

/// Inserts unseen tags and links every tag to the term by name.
///
/// Linking by name keeps the stored identity authoritative even when the
/// caller's vocabulary snapshot minted an id for a name stored meanwhile.
fn link_tags(tx: &Transaction<'_>, term_uuid: &str, tags: &[Tag]) -> RepoResult<()> {
    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (uuid, name) VALUES (?1, ?2);",
            params![tag.id.to_string(), tag.name.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO term_tags (term_uuid, tag_uuid)
             SELECT ?1, uuid
             FROM tags
             WHERE name = ?2;",
            params![term_uuid, tag.name.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags_for_term(conn: &Connection, term_uuid: &str) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.uuid, t.name
         FROM term_tags tt
         INNER JOIN tags t ON t.uuid = tt.tag_uuid
         WHERE tt.term_uuid = ?1
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([term_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(parse_tag_row(row)?);
    }
    Ok(tags)
}

fn load_all_term_tags(conn: &Connection) -> RepoResult<HashMap<String, Vec<Tag>>> {
    let mut stmt = conn.prepare(
        "SELECT tt.term_uuid AS term_uuid, t.uuid AS uuid, t.name AS name
         FROM term_tags tt
         INNER JOIN tags t ON t.uuid = tt.tag_uuid
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tags_by_term: HashMap<String, Vec<Tag>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let term_uuid: String = row.get("term_uuid")?;
        tags_by_term
            .entry(term_uuid)
            .or_default()
            .push(parse_tag_row(row)?);
    }
    Ok(tags_by_term)
}

fn parse_term_row(row: &Row<'_>, tags: Vec<Tag>) -> RepoResult<Term> {
    let uuid_text: String = row.get("uuid")?;
    Ok(Term {
        id: parse_uuid(&uuid_text, "terms.uuid")?,
        title: row.get("title")?,
        content: row.get("content")?,
        tags,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_tag_row(row: &Row<'_>) -> RepoResult<Tag> {
    let uuid_text: String = row.get("uuid")?;
    let id: TagId = parse_uuid(&uuid_text, "tags.uuid")?;
    Ok(Tag::with_id(id, row.get::<_, String>("name")?))
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn ensure_term_connection_ready(conn: &Connection) -> RepoResult<()> {
    let status = schema_status(conn)?;
    if !matches!(status, SchemaStatus::Current(_)) {
        return Err(RepoError::UninitializedConnection {
            expected_version: target_version(),
            actual_version: status.found(),
        });
    }

    for table in ["terms", "tags", "term_tags"] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

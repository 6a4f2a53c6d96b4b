//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the persistence collaborator used by the save/load pipeline.
//! - Store flattened note content next to its checklist side-list.
//!
//! # Invariants
//! - All reads are constrained to `is_deleted = 0`.
//! - Content and checklist side-list are replaced in a single transaction.
//! - Note lists are ordered by `updated_at DESC, uuid ASC`.

use crate::db::DbError;
use crate::model::block::ChecklistItem;
use crate::model::note::{NoteDraft, NoteId, NoteRecord};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const NOTES_DEFAULT_LIMIT: u32 = 10;
const NOTES_LIMIT_MAX: u32 = 50;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(NoteId),
    InvalidData(String),
}

impl RepoError {
    /// `true` when the store was only temporarily unavailable.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
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

/// Query options for note list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    /// Maximum rows to return. Defaults to 10 and clamps to 50.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Persistence collaborator for note bodies.
pub trait NoteRepository {
    /// Creates one note and returns its stable id.
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId>;
    /// Replaces content and checklist side-list of an existing note.
    fn update_note(&self, note_id: NoteId, draft: &NoteDraft) -> RepoResult<()>;
    /// Soft-deletes one note.
    fn delete_note(&self, note_id: NoteId) -> RepoResult<()>;
    /// Gets one live note by id.
    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<NoteRecord>>;
    /// Lists live notes with pagination.
    fn get_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<NoteRecord>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["notes", "note_checklist_items"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::InvalidData(format!(
                    "required table `{table}` is missing; open the store with open_db"
                )));
            }
        }
        Ok(Self { conn })
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, draft: &NoteDraft) -> RepoResult<NoteId> {
        let note_id = Uuid::new_v4();
        let note_id_text = note_id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (uuid, content) VALUES (?1, ?2);",
            params![note_id_text.as_str(), draft.content.as_str()],
        )?;
        replace_checklist_items(&tx, note_id_text.as_str(), &draft.checklist)?;
        tx.commit()?;

        Ok(note_id)
    }

    fn update_note(&self, note_id: NoteId, draft: &NoteDraft) -> RepoResult<()> {
        let note_id_text = note_id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            params![note_id_text.as_str(), draft.content.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note_id));
        }
        replace_checklist_items(&tx, note_id_text.as_str(), &draft.checklist)?;
        tx.commit()?;

        Ok(())
    }

    fn delete_note(&self, note_id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [note_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note_id));
        }
        Ok(())
    }

    fn get_note(&self, note_id: NoteId) -> RepoResult<Option<NoteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, content, updated_at
             FROM notes
             WHERE uuid = ?1
               AND is_deleted = 0;",
        )?;
        let mut rows = stmt.query([note_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(note_from_row(self.conn, row)?)),
            None => Ok(None),
        }
    }

    fn get_notes(&self, query: &NoteListQuery) -> RepoResult<Vec<NoteRecord>> {
        let mut sql = String::from(
            "SELECT uuid, content, updated_at
             FROM notes
             WHERE is_deleted = 0
             ORDER BY updated_at DESC, uuid ASC
             LIMIT ?",
        );
        let mut bind_values = vec![Value::Integer(i64::from(normalize_note_limit(
            query.limit,
        )))];
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(note_from_row(self.conn, row)?);
        }
        Ok(notes)
    }
}

/// Normalizes list limit according to notes contract.
pub fn normalize_note_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => NOTES_DEFAULT_LIMIT,
        Some(value) if value > NOTES_LIMIT_MAX => NOTES_LIMIT_MAX,
        Some(value) => value,
    }
}

fn note_from_row(conn: &Connection, row: &Row<'_>) -> RepoResult<NoteRecord> {
    let uuid_text: String = row.get("uuid")?;
    let note_id = parse_uuid(&uuid_text)?;
    Ok(NoteRecord {
        note_id,
        content: row.get("content")?,
        checklist: load_checklist_items(conn, &uuid_text)?,
        updated_at: row.get("updated_at")?,
    })
}

fn replace_checklist_items(
    tx: &Transaction<'_>,
    note_uuid: &str,
    items: &[ChecklistItem],
) -> RepoResult<()> {
    tx.execute(
        "DELETE FROM note_checklist_items WHERE note_uuid = ?1;",
        [note_uuid],
    )?;
    let mut stmt = tx.prepare(
        "INSERT INTO note_checklist_items (note_uuid, position, content, is_checked)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    for item in items {
        stmt.execute(params![
            note_uuid,
            item.position,
            item.content.as_str(),
            i64::from(item.checked),
        ])?;
    }
    Ok(())
}

fn load_checklist_items(conn: &Connection, note_uuid: &str) -> RepoResult<Vec<ChecklistItem>> {
    let mut stmt = conn.prepare(
        "SELECT position, content, is_checked
         FROM note_checklist_items
         WHERE note_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([note_uuid])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        let position: i64 = row.get("position")?;
        let is_checked: i64 = row.get("is_checked")?;
        items.push(ChecklistItem {
            position: u32::try_from(position).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid checklist position `{position}` for note `{note_uuid}`"
                ))
            })?,
            content: row.get("content")?,
            checked: int_to_bool(is_checked, "note_checklist_items.is_checked")?,
        });
    }
    Ok(items)
}

fn parse_uuid(value: &str) -> RepoResult<NoteId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in notes.uuid")))
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {column}"
        ))),
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

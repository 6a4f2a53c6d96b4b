//! Note use-case service.
//!
//! # Responsibility
//! - Run the save pipeline: normalize → serialize → side-list → persist.
//! - Run the load pipeline: fetch → parse.
//!
//! # Invariants
//! - Only normalized block sequences are ever persisted.
//! - Content and checklist side-list of one save derive from the same blocks.
//! - Saves use full content replacement semantics.

use crate::content::{normalize, parse, serialize};
use crate::editor::EditorState;
use crate::model::block::{checklist_items, Block};
use crate::model::note::{NoteDraft, NoteId, NoteRecord};
use crate::repo::note_repo::{normalize_note_limit, NoteListQuery, NoteRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for note use-cases.
#[derive(Debug)]
pub enum NoteServiceError {
    /// Target note does not exist.
    NoteNotFound(NoteId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl NoteServiceError {
    /// `true` when retrying the same call later may succeed.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_busy())
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoteNotFound(note_id) => write!(f, "note not found: {note_id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent note state: {details}"),
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(note_id) => Self::NoteNotFound(note_id),
            other => Self::Repo(other),
        }
    }
}

pub type NoteServiceResult<T> = Result<T, NoteServiceError>;

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesListResult {
    /// List items sorted by `updated_at DESC, uuid ASC`.
    pub items: Vec<NoteRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Note service facade over repository implementations.
pub struct NoteService<R: NoteRepository> {
    repo: R,
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one note from blocks and returns the stored record.
    pub fn create_note(&self, blocks: &[Block]) -> NoteServiceResult<NoteRecord> {
        let started_at = Instant::now();
        let draft = prepare_draft(blocks);
        let note_id = self.repo.create_note(&draft)?;
        info!(
            "event=note_create module=service status=ok note_id={} content_len={} checklist_items={} duration_ms={}",
            note_id,
            draft.content.len(),
            draft.checklist.len(),
            started_at.elapsed().as_millis()
        );
        self.read_back(note_id, "created note not found in read-back")
    }

    /// Persists the blocks of an existing note.
    pub fn save_blocks(&self, note_id: NoteId, blocks: &[Block]) -> NoteServiceResult<NoteRecord> {
        let started_at = Instant::now();
        let draft = prepare_draft(blocks);
        if let Err(err) = self.repo.update_note(note_id, &draft) {
            warn!(
                "event=note_save module=service status=error note_id={} duration_ms={} error={}",
                note_id,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
        info!(
            "event=note_save module=service status=ok note_id={} content_len={} checklist_items={} duration_ms={}",
            note_id,
            draft.content.len(),
            draft.checklist.len(),
            started_at.elapsed().as_millis()
        );
        self.read_back(note_id, "saved note not found in read-back")
    }

    /// Loads and parses the blocks of one note.
    pub fn load_blocks(&self, note_id: NoteId) -> NoteServiceResult<Vec<Block>> {
        let record = self
            .repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::NoteNotFound(note_id))?;
        Ok(parse(&record.content))
    }

    /// Starts an editing session for one note, focused at the top.
    pub fn open_editor(&self, note_id: NoteId) -> NoteServiceResult<EditorState> {
        let blocks = self.load_blocks(note_id)?;
        Ok(EditorState::from_blocks(blocks, 0, 0))
    }

    /// Gets one note record by stable ID.
    pub fn get_note(&self, note_id: NoteId) -> NoteServiceResult<Option<NoteRecord>> {
        Ok(self.repo.get_note(note_id)?)
    }

    /// Soft-deletes one note.
    pub fn delete_note(&self, note_id: NoteId) -> NoteServiceResult<()> {
        self.repo.delete_note(note_id)?;
        info!("event=note_delete module=service status=ok note_id={note_id}");
        Ok(())
    }

    /// Lists notes with pagination.
    pub fn list_notes(&self, limit: Option<u32>, offset: u32) -> NoteServiceResult<NotesListResult> {
        let applied_limit = normalize_note_limit(limit);
        let query = NoteListQuery {
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.get_notes(&query)?;
        Ok(NotesListResult {
            items,
            applied_limit,
        })
    }

    fn read_back(&self, note_id: NoteId, details: &'static str) -> NoteServiceResult<NoteRecord> {
        self.repo
            .get_note(note_id)?
            .ok_or(NoteServiceError::InconsistentState(details))
    }
}

/// Builds the persistence payload for a block sequence.
///
/// Content and side-list are both taken from the normalized blocks.
pub fn prepare_draft(blocks: &[Block]) -> NoteDraft {
    let normalized = normalize(blocks);
    NoteDraft {
        content: serialize(&normalized),
        checklist: checklist_items(&normalized),
    }
}

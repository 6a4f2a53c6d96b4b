//! Core domain logic for BlockNote.
//! This crate is the single source of truth for the note content format and
//! its editing invariants.

pub mod config;
pub mod content;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use content::{decode, encode, normalize, parse, serialize};
pub use editor::{
    delete_checklist_on_backspace, enter_in_checklist, insert_checklist_at_cursor,
    set_block_text, sync_projection, toggle_checklist, EditableValue, EditorState,
    TextSelection,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::block::{checklist_items, Block, ChecklistItem};
pub use model::note::{NoteDraft, NoteId, NoteRecord};
pub use repo::note_repo::{
    NoteListQuery, NoteRepository, RepoError, RepoResult, SqliteNoteRepository,
};
pub use service::autosave::{AutosaveOutcome, AutosaveScheduler, DueCommit};
pub use service::note_service::{
    prepare_draft, NoteService, NoteServiceError, NoteServiceResult, NotesListResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Note persistence records.
//!
//! # Responsibility
//! - Define the shapes exchanged with the note persistence collaborator.
//!
//! # Invariants
//! - `content` is always the flattened marker string, never structured blocks.
//! - `checklist` mirrors the checklist markers of `content` in document order.

use crate::model::block::ChecklistItem;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one note.
pub type NoteId = Uuid;

/// Write payload for create/update calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    /// Flattened content string.
    pub content: String,
    /// Checklist side-list derived from the same blocks as `content`.
    pub checklist: Vec<ChecklistItem>,
}

/// Read model for note detail/list use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub note_id: NoteId,
    /// Flattened content string.
    pub content: String,
    /// Checklist side-list stored at the last save.
    pub checklist: Vec<ChecklistItem>,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

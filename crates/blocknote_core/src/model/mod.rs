//! Domain model for note content and note records.
//!
//! # Responsibility
//! - Define the block sum type that structured note content is made of.
//! - Define persistence-facing note records and the checklist side-list.
//!
//! # Invariants
//! - Every note is identified by a stable `NoteId`.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod block;
pub mod note;

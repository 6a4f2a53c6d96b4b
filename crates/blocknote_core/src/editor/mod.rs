//! Block editing session logic.
//!
//! # Responsibility
//! - Translate editor-screen actions into new block sequences.
//! - Derive the per-block editable projection from blocks.
//!
//! # Invariants
//! - Every operation is a pure function of its explicit inputs and carries
//!   no hidden state between calls.
//! - Blocks are the source of truth; the projection is always regenerated.

pub mod engine;
pub mod projection;

pub use engine::{
    delete_checklist_on_backspace, enter_in_checklist, insert_checklist_at_cursor,
    set_block_text, toggle_checklist, EditorState,
};
pub use projection::{sync_projection, EditableValue, TextSelection};

//! Editable-value projection of a block sequence.
//!
//! # Invariants
//! - The projection is a pure function of the blocks; it is rebuilt after
//!   every mutation and never patched incrementally.
//! - One value per block, in block order.

use crate::model::block::Block;
use serde::{Deserialize, Serialize};

/// Collapsed or ranged selection inside one editable value, in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    pub base: usize,
    pub extent: usize,
}

impl TextSelection {
    pub fn collapsed(offset: usize) -> Self {
        Self {
            base: offset,
            extent: offset,
        }
    }
}

/// UI-facing editable value for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableValue {
    pub text: String,
    /// `None` leaves the selection to the text field.
    pub selection: Option<TextSelection>,
}

impl EditableValue {
    /// Placeholder used for attachment blocks.
    pub fn placeholder() -> Self {
        Self {
            text: String::new(),
            selection: None,
        }
    }
}

/// Regenerates the editable values for `blocks`.
///
/// - `Text`: content, no forced selection.
/// - `Checklist`: content, selection collapsed at end of text.
/// - `Image`/`File`: empty placeholder.
pub fn sync_projection(blocks: &[Block]) -> Vec<EditableValue> {
    blocks.iter().map(project_block).collect()
}

fn project_block(block: &Block) -> EditableValue {
    match block {
        Block::Text { content } => EditableValue {
            text: content.clone(),
            selection: None,
        },
        Block::Checklist { content, .. } => EditableValue {
            text: content.clone(),
            selection: Some(TextSelection::collapsed(content.chars().count())),
        },
        Block::Image { .. } | Block::File { .. } => EditableValue::placeholder(),
    }
}

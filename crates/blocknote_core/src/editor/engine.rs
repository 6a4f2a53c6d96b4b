//! Cursor-aware checklist editing over a block sequence.
//!
//! # Responsibility
//! - Apply editor-screen actions (checklist button, enter, backspace, text
//!   change, checkbox tap) to a block sequence.
//! - Keep the editable projection and focus position consistent with blocks.
//!
//! # Invariants
//! - Operations never mutate their input; callers replace their held state
//!   with the returned one.
//! - A no-op returns a state equal to the input.
//! - Indices clamp to `[0, len - 1]`; cursor offsets clamp to the focused
//!   block text. Out-of-range input is corrected, never rejected.
//! - The returned projection is always `sync_projection(&blocks)`.

use crate::content::{normalize, parse, serialize};
use crate::editor::projection::{sync_projection, EditableValue};
use crate::model::block::Block;
use log::trace;
use serde::{Deserialize, Serialize};

/// Editing session state for one note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    /// Source of truth for note content.
    pub blocks: Vec<Block>,
    /// Derived per-block editable values.
    pub projection: Vec<EditableValue>,
    pub focused_index: usize,
    /// Cursor offset inside the focused block, in chars.
    pub cursor_offset: usize,
}

impl EditorState {
    /// Builds a state from blocks, clamping focus and cursor.
    pub fn from_blocks(blocks: Vec<Block>, focused_index: usize, cursor_offset: usize) -> Self {
        let focused_index = clamp_index(focused_index, blocks.len());
        let cursor_offset = clamp_cursor(&blocks, focused_index, cursor_offset);
        let projection = sync_projection(&blocks);
        Self {
            blocks,
            projection,
            focused_index,
            cursor_offset,
        }
    }

    /// Starts an editing session from stored content, focused at the top.
    pub fn load(stored: &str) -> Self {
        Self::from_blocks(parse(stored), 0, 0)
    }

    /// Normalized, flattened content for persistence.
    pub fn stored_content(&self) -> String {
        serialize(&normalize(&self.blocks))
    }

    pub fn focused_block(&self) -> Option<&Block> {
        self.blocks.get(self.focused_index)
    }
}

/// Inserts a checklist line at the cursor.
///
/// - `locked`: returns the input unchanged.
/// - Empty blocks: `[Checklist, Text("")]`, focus 0.
/// - Focused `Text`: the line holding the cursor is replaced by an optional
///   leading text (content before the line), a new checklist and a trailing
///   `"\n" + content after the line`. Focus moves to the trailing text.
/// - Focused non-text block: a checklist and `Text("\n")` are inserted after
///   it. Focus moves to the new checklist.
pub fn insert_checklist_at_cursor(state: &EditorState, locked: bool) -> EditorState {
    if locked {
        return state.clone();
    }
    if state.blocks.is_empty() {
        return EditorState::from_blocks(vec![Block::empty_checklist(), Block::text("")], 0, 0);
    }

    let index = clamp_index(state.focused_index, state.blocks.len());
    let mut blocks = Vec::with_capacity(state.blocks.len() + 3);
    blocks.extend_from_slice(&state.blocks[..index]);

    let focus = match &state.blocks[index] {
        Block::Text { content } => {
            let cursor = byte_offset(content, state.cursor_offset);
            let (line_start, line_end) = line_bounds(content, cursor);
            let leading = &content[..line_start];
            if !leading.is_empty() {
                blocks.push(Block::text(leading));
            }
            blocks.push(Block::empty_checklist());
            blocks.push(Block::text(format!("\n{}", &content[line_end..])));
            blocks.len() - 1
        }
        other @ (Block::Checklist { .. } | Block::Image { .. } | Block::File { .. }) => {
            blocks.push(other.clone());
            blocks.push(Block::empty_checklist());
            blocks.push(Block::text("\n"));
            blocks.len() - 2
        }
    };
    blocks.extend_from_slice(&state.blocks[index + 1..]);

    trace!(
        "event=editor_insert_checklist module=editor status=ok index={} focus={} blocks={}",
        index,
        focus,
        blocks.len()
    );
    EditorState::from_blocks(blocks, focus, 0)
}

/// Removes an (empty) checklist when backspace is pressed at its start.
///
/// No-op unless the clamped index points at a checklist. Focus moves to the
/// previous block with the cursor at the end of its text.
pub fn delete_checklist_on_backspace(state: &EditorState, checklist_index: usize) -> EditorState {
    if state.blocks.is_empty() {
        return state.clone();
    }
    let index = clamp_index(checklist_index, state.blocks.len());
    if !state.blocks[index].is_checklist() {
        return state.clone();
    }

    let mut blocks = state.blocks.clone();
    blocks.remove(index);
    if blocks.is_empty() {
        return EditorState::from_blocks(vec![Block::text("")], 0, 0);
    }

    let focus = index.saturating_sub(1);
    let cursor = blocks[focus].text_len();
    EditorState::from_blocks(blocks, focus, cursor)
}

/// Starts a new checklist line after the checklist at `checklist_index`.
pub fn enter_in_checklist(state: &EditorState, checklist_index: usize) -> EditorState {
    if state.blocks.is_empty() {
        return state.clone();
    }
    let index = clamp_index(checklist_index, state.blocks.len());
    if !state.blocks[index].is_checklist() {
        return state.clone();
    }

    let mut blocks = state.blocks.clone();
    blocks.insert(index + 1, Block::empty_checklist());
    blocks.insert(index + 2, Block::text("\n"));
    EditorState::from_blocks(blocks, index + 1, 0)
}

/// Applies a text-field change to a text or checklist block.
///
/// Attachments are not text-edited; targeting one is a no-op.
pub fn set_block_text(
    state: &EditorState,
    index: usize,
    text: &str,
    cursor_offset: usize,
) -> EditorState {
    if state.blocks.is_empty() {
        return state.clone();
    }
    let index = clamp_index(index, state.blocks.len());
    let replacement = match &state.blocks[index] {
        Block::Text { .. } => Block::text(text),
        Block::Checklist { checked, .. } => Block::checklist(text, *checked),
        Block::Image { .. } | Block::File { .. } => return state.clone(),
    };

    let mut blocks = state.blocks.clone();
    blocks[index] = replacement;
    EditorState::from_blocks(blocks, index, cursor_offset)
}

/// Flips the checked flag of the checklist at `index`; focus is unchanged.
pub fn toggle_checklist(state: &EditorState, index: usize) -> EditorState {
    if state.blocks.is_empty() {
        return state.clone();
    }
    let index = clamp_index(index, state.blocks.len());
    let Block::Checklist { content, checked } = &state.blocks[index] else {
        return state.clone();
    };

    let mut blocks = state.blocks.clone();
    blocks[index] = Block::checklist(content.clone(), !*checked);
    EditorState::from_blocks(blocks, state.focused_index, state.cursor_offset)
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

fn clamp_cursor(blocks: &[Block], focused_index: usize, cursor_offset: usize) -> usize {
    blocks
        .get(focused_index)
        .map_or(0, |block| cursor_offset.min(block.text_len()))
}

/// Byte index of the `char_offset`-th char, clamped to the end of `text`.
fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Byte bounds of the line holding `cursor`: `(start, end)`, where `start`
/// follows the last newline before the cursor and `end` is the first newline
/// at or after it.
fn line_bounds(text: &str, cursor: usize) -> (usize, usize) {
    let start = text[..cursor].rfind('\n').map_or(0, |pos| pos + 1);
    let end = text[cursor..]
        .find('\n')
        .map_or(text.len(), |pos| cursor + pos);
    (start, end)
}

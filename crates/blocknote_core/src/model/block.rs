//! Note content block model.
//!
//! # Responsibility
//! - Define the closed set of block kinds a note body is made of.
//! - Provide read helpers shared by parser, normalizer and edit engine.
//!
//! # Invariants
//! - A block sequence handed out by core is never empty.
//! - Block order is document reading order; blocks carry no identity beyond
//!   their position.

use serde::{Deserialize, Serialize};

/// One unit of note content.
///
/// Serialized with a `kind` tag to match the snake_case wire naming used by
/// the rest of the core models.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Free-form prose.
    Text { content: String },
    /// One checklist line.
    Checklist { content: String, checked: bool },
    /// Reference to an attached image resource.
    Image { uri: String },
    /// Reference to an attached file resource.
    File {
        uri: String,
        filename: String,
        size_bytes: u64,
    },
}

impl Block {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn checklist(content: impl Into<String>, checked: bool) -> Self {
        Self::Checklist {
            content: content.into(),
            checked,
        }
    }

    /// Fresh unchecked checklist line inserted by the edit engine.
    pub fn empty_checklist() -> Self {
        Self::checklist("", false)
    }

    pub fn image(uri: impl Into<String>) -> Self {
        Self::Image { uri: uri.into() }
    }

    pub fn file(uri: impl Into<String>, filename: impl Into<String>, size_bytes: u64) -> Self {
        Self::File {
            uri: uri.into(),
            filename: filename.into(),
            size_bytes,
        }
    }

    /// Editable text carried by the block.
    ///
    /// Attachments are not text-edited in place and return `""`.
    pub fn text_content(&self) -> &str {
        match self {
            Self::Text { content } | Self::Checklist { content, .. } => content.as_str(),
            Self::Image { .. } | Self::File { .. } => "",
        }
    }

    /// Length of [`Block::text_content`] in chars, the unit of cursor offsets.
    pub fn text_len(&self) -> usize {
        self.text_content().chars().count()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    pub fn is_checklist(&self) -> bool {
        matches!(self, Self::Checklist { .. })
    }

    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::Image { .. } | Self::File { .. })
    }

    /// Stable lowercase label of the block kind, used in logs and FFI.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Checklist { .. } => "checklist",
            Self::Image { .. } => "image",
            Self::File { .. } => "file",
        }
    }
}

/// Block sequence representing an empty note.
pub fn empty_note_blocks() -> Vec<Block> {
    vec![Block::text("")]
}

/// One checklist line itemized for the persistence side-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Zero-based order among the checklist blocks of one save.
    pub position: u32,
    pub content: String,
    pub checked: bool,
}

/// Itemizes checklist blocks in document order.
pub fn checklist_items(blocks: &[Block]) -> Vec<ChecklistItem> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Checklist { content, checked } => Some((content, *checked)),
            _ => None,
        })
        .enumerate()
        .map(|(index, (content, checked))| ChecklistItem {
            position: u32::try_from(index).unwrap_or(u32::MAX),
            content: content.clone(),
            checked,
        })
        .collect()
}

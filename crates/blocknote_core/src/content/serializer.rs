//! Block sequence to flat content string.

use crate::content::codec::encode;
use crate::model::block::Block;

/// Flattens blocks into the stored content string.
///
/// Left inverse of [`crate::content::parse`] for normalized sequences.
pub fn serialize(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        write_block(&mut out, block);
    }
    out
}

/// Serialized form of a single block.
pub fn serialize_block(block: &Block) -> String {
    let mut out = String::new();
    write_block(&mut out, block);
    out
}

fn write_block(out: &mut String, block: &Block) {
    match block {
        Block::Text { content } => out.push_str(content),
        Block::Checklist { content, checked } => {
            out.push_str("[[CHECKLIST:");
            out.push_str(&encode(content));
            out.push_str(if *checked { ":1]]" } else { ":0]]" });
        }
        Block::Image { uri } => {
            out.push_str("[[IMAGE:");
            out.push_str(&encode(uri));
            out.push_str("]]");
        }
        Block::File {
            uri,
            filename,
            size_bytes,
        } => {
            out.push_str(&format!(
                "[[FILE:{}:{}:{}]]",
                encode(uri),
                encode(filename),
                size_bytes
            ));
        }
    }
}

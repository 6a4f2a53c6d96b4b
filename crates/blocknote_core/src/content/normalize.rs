//! Block list repair pass.
//!
//! # Responsibility
//! - Expand markers left inside free-text blocks into typed blocks.
//! - Bring any block list into the shape the parser would produce for its
//!   serialized form, so save/load cycles are lossless.
//!
//! # Invariants
//! - Output is never empty.
//! - No output `Text` block contains a well-formed marker.
//! - `normalize(normalize(b)) == normalize(b)`.
//! - `parse(serialize(normalize(b))) == normalize(b)`.

use crate::content::parser::{classify_marker, parse};
use crate::content::serializer::serialize_block;
use crate::model::block::{empty_note_blocks, Block};
use log::debug;

/// Normalizes a block list.
///
/// Adjacent text blocks are coalesced and re-scanned, so a marker split
/// across two text blocks is recovered. Empty text blocks are dropped.
/// A non-text block whose marker form would not parse back (an empty image
/// uri, or a marker token that decodes to nothing) becomes the literal text
/// of that marker form.
pub fn normalize(blocks: &[Block]) -> Vec<Block> {
    let mut out = Vec::with_capacity(blocks.len());
    let mut pending_text = String::new();
    let mut degraded = 0usize;

    for block in blocks {
        match block {
            Block::Text { content } => pending_text.push_str(content),
            Block::Checklist { .. } | Block::Image { .. } | Block::File { .. } => {
                match stable_marker(block) {
                    Ok(()) => {
                        degraded += flush_text(&mut out, &mut pending_text);
                        out.push(block.clone());
                    }
                    Err(marker) => {
                        degraded += 1;
                        pending_text.push_str(&marker);
                    }
                }
            }
        }
    }
    degraded += flush_text(&mut out, &mut pending_text);

    if degraded > 0 {
        debug!(
            "event=content_normalize module=content status=degraded degraded_blocks={}",
            degraded
        );
    }

    if out.is_empty() {
        return empty_note_blocks();
    }
    out
}

/// `Ok` when the marker form of `block` parses back to `block`, otherwise
/// the marker text.
fn stable_marker(block: &Block) -> Result<(), String> {
    let marker = serialize_block(block);
    if classify_marker(&marker).as_ref() == Some(block) {
        Ok(())
    } else {
        Err(marker)
    }
}

/// Parses the pending text run into `out` and returns how many parsed
/// blocks had to be degraded.
///
/// A degraded marker form is itself a marker envelope that no grammar
/// accepts, so swapping it in place yields exactly what `parse` returns for
/// the rewritten run.
fn flush_text(out: &mut Vec<Block>, pending_text: &mut String) -> usize {
    if pending_text.is_empty() {
        return 0;
    }
    let mut degraded = 0;
    for block in parse(pending_text) {
        if block.is_text() {
            out.push(block);
            continue;
        }
        match stable_marker(&block) {
            Ok(()) => out.push(block),
            Err(marker) => {
                degraded += 1;
                out.push(Block::text(marker));
            }
        }
    }
    pending_text.clear();
    degraded
}

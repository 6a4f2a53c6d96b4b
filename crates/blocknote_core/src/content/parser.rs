//! Flat content string to block sequence.
//!
//! # Responsibility
//! - Split stored note content into text runs and typed marker blocks.
//!
//! # Invariants
//! - Parsing is total: any input yields a non-empty block sequence.
//! - Malformed markers are kept as literal text; no input character is lost
//!   except through successful marker decoding.
//! - Markers are matched left to right and never overlap.

use crate::content::codec::decode;
use crate::model::block::Block;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

// The envelope body excludes brackets so a stray `[[IMAGE:` in prose can
// never swallow a following well-formed marker.
static MARKER_ENVELOPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[(?:CHECKLIST|IMAGE|FILE):[^\[\]]*?\]\]").expect("valid marker envelope regex")
});
static CHECKLIST_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\[\[CHECKLIST:([A-Za-z0-9+/=]*):([01])\]\]\z")
        .expect("valid checklist marker regex")
});
static IMAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\[\[IMAGE:([A-Za-z0-9+/=]+)\]\]\z").expect("valid image marker regex")
});
static FILE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A\[\[FILE:([A-Za-z0-9+/=]+):([A-Za-z0-9+/=]+):([0-9]+)\]\]\z")
        .expect("valid file marker regex")
});

/// Parses stored note content into blocks.
pub fn parse(stored: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut literal_start = 0;

    for envelope in MARKER_ENVELOPE_RE.find_iter(stored) {
        push_literal(&mut blocks, &stored[literal_start..envelope.start()]);
        let raw = envelope.as_str();
        match classify_marker(raw) {
            Some(block) => blocks.push(block),
            None => {
                trace!(
                    "event=content_parse module=content status=malformed_marker offset={} len={}",
                    envelope.start(),
                    raw.len()
                );
                blocks.push(Block::text(raw));
            }
        }
        literal_start = envelope.end();
    }
    push_literal(&mut blocks, &stored[literal_start..]);

    if blocks.is_empty() {
        blocks.push(Block::text(""));
    }
    blocks
}

/// Classifies one envelope match; `None` when no specific grammar matches.
///
/// Grammars are tried in order: checklist, image, file.
pub(crate) fn classify_marker(raw: &str) -> Option<Block> {
    if let Some(caps) = CHECKLIST_MARKER_RE.captures(raw) {
        return Some(Block::checklist(decode(&caps[1]), &caps[2] == "1"));
    }
    if let Some(caps) = IMAGE_MARKER_RE.captures(raw) {
        return Some(Block::image(decode(&caps[1])));
    }
    if let Some(caps) = FILE_MARKER_RE.captures(raw) {
        // Sizes beyond u64 cannot round-trip; keep the marker as prose.
        let size_bytes = caps[3].parse::<u64>().ok()?;
        return Some(Block::file(decode(&caps[1]), decode(&caps[2]), size_bytes));
    }
    None
}

fn push_literal(blocks: &mut Vec<Block>, literal: &str) {
    if !literal.is_empty() {
        blocks.push(Block::text(literal));
    }
}

#[cfg(test)]
mod tests {
    use super::parse;
    use crate::content::codec::encode;
    use crate::model::block::Block;

    #[test]
    fn parses_checklist_between_prose() {
        let stored = format!("Hello [[CHECKLIST:{}:0]] world", encode("buy milk"));
        assert_eq!(
            parse(&stored),
            vec![
                Block::text("Hello "),
                Block::checklist("buy milk", false),
                Block::text(" world"),
            ]
        );
    }

    #[test]
    fn empty_input_yields_single_empty_text() {
        assert_eq!(parse(""), vec![Block::text("")]);
    }

    #[test]
    fn parses_all_marker_kinds_in_order() {
        let stored = format!(
            "[[IMAGE:{}]][[CHECKLIST::1]][[FILE:{}:{}:2048]]",
            encode("content://media/1"),
            encode("content://docs/7"),
            encode("report.pdf"),
        );
        assert_eq!(
            parse(&stored),
            vec![
                Block::image("content://media/1"),
                Block::checklist("", true),
                Block::file("content://docs/7", "report.pdf", 2048),
            ]
        );
    }

    #[test]
    fn malformed_markers_stay_literal() {
        assert_eq!(parse("[[IMAGE:]]"), vec![Block::text("[[IMAGE:]]")]);
        assert_eq!(
            parse("a[[CHECKLIST:YQ==:2]]b"),
            vec![
                Block::text("a"),
                Block::text("[[CHECKLIST:YQ==:2]]"),
                Block::text("b"),
            ]
        );
        assert_eq!(
            parse("[[FILE:YQ==:Yg==:99999999999999999999999]]"),
            vec![Block::text("[[FILE:YQ==:Yg==:99999999999999999999999]]")]
        );
    }

    #[test]
    fn unbalanced_brackets_are_plain_text() {
        assert_eq!(parse("[[CHECKLIST:"), vec![Block::text("[[CHECKLIST:")]);
        assert_eq!(parse("]] [[ ]]"), vec![Block::text("]] [[ ]]")]);
    }

    #[test]
    fn stray_envelope_start_does_not_swallow_next_marker() {
        let stored = format!("see [[IMAGE:abc [[CHECKLIST:{}:0]]", encode("x"));
        assert_eq!(
            parse(&stored),
            vec![
                Block::text("see [[IMAGE:abc "),
                Block::checklist("x", false),
            ]
        );
    }

    #[test]
    fn envelope_may_span_newlines() {
        assert_eq!(
            parse("[[IMAGE:\n]]tail"),
            vec![Block::text("[[IMAGE:\n]]"), Block::text("tail")]
        );
    }

    #[test]
    fn bad_token_decodes_to_empty_content() {
        assert_eq!(parse("[[CHECKLIST:YQ:0]]"), vec![Block::checklist("", false)]);
    }
}

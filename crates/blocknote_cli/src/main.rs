//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `blocknote_core` linkage.
//! - Inspect stored note content given as the first argument.
//! - Keep output deterministic for quick local sanity checks.

use blocknote_core::{normalize, parse, serialize, Block};

fn main() {
    println!("blocknote_core ping={}", blocknote_core::ping());
    println!("blocknote_core version={}", blocknote_core::core_version());

    let Some(stored) = std::env::args().nth(1) else {
        return;
    };
    let blocks = parse(&stored);
    for (index, block) in blocks.iter().enumerate() {
        println!("block[{index}] {}", describe(block));
    }

    let normalized = serialize(&normalize(&blocks));
    if normalized != stored {
        println!("normalized={normalized}");
    }
}

fn describe(block: &Block) -> String {
    match block {
        Block::Text { content } => format!("text {content:?}"),
        Block::Checklist { content, checked } => {
            let mark = if *checked { 'x' } else { ' ' };
            format!("checklist [{mark}] {content:?}")
        }
        Block::Image { uri } => format!("image uri={uri:?}"),
        Block::File {
            uri,
            filename,
            size_bytes,
        } => format!("file uri={uri:?} name={filename:?} size={size_bytes}"),
    }
}

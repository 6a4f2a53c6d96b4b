//! Flat content format for note bodies.
//!
//! # Responsibility
//! - Encode structured blocks into one storable string and back.
//! - Repair block lists before they are persisted.
//!
//! # Invariants
//! - Every function here is pure and total; malformed input degrades to
//!   literal text instead of failing.

pub mod codec;
pub mod normalize;
pub mod parser;
pub mod serializer;

pub use codec::{decode, encode};
pub use normalize::normalize;
pub use parser::parse;
pub use serializer::{serialize, serialize_block};

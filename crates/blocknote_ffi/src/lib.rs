//! Flutter-facing bindings for `blocknote_core`.

pub mod api;

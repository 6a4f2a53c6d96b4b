//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate content pipelines and repository calls into use-case APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod autosave;
pub mod note_service;

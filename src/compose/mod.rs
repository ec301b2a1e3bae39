//! Docker Compose file handling
//!
//! This module loads and stores compose files as untyped YAML trees so that
//! keys portfix does not know about survive a round trip unchanged.

pub mod document;

pub use document::{ComposeDocument, DEFAULT_COMPOSE_FILE};

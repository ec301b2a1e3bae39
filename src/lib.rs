//! portfix - strips published ports from a docker-compose file
//!
//! Infrastructure services (databases, caches, search) should only be
//! reachable on the compose network. portfix loads a compose file, drops the
//! `ports` of those services, pins the reverse proxy to port 80 and writes
//! the file back with its key order intact.

pub mod compose;
pub mod error;
pub mod sanitize;

pub use compose::ComposeDocument;
pub use error::{PortfixError, Result};
pub use sanitize::{run, sanitize, SanitizeConfig, SanitizeReport, ServiceOutcome};

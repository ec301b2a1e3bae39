//! Compose document loading and saving

use crate::error::{PortfixError, Result};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::str::FromStr;

/// Compose file looked up in the working directory
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// A parsed compose file.
///
/// The tree is kept as a [`serde_yaml::Value`]; its mappings preserve
/// insertion order, so saving writes keys back in the order they were read.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeDocument {
    root: Value,
}

impl ComposeDocument {
    /// Read and parse a compose file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PortfixError::FileNotFound(path.to_path_buf()),
            _ => PortfixError::Io(e),
        })?;

        let document = Self::parse_str(&content)?;
        tracing::info!("Loaded compose file: {}", path.display());
        Ok(document)
    }

    /// Parse a compose document from a string.
    ///
    /// Merge keys (`<<: *anchor`) are flattened into the mapping that holds
    /// them, so inherited keys are treated like keys written inline. Inline
    /// keys win over merged ones.
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut root: Value = serde_yaml::from_str(content)?;
        root.apply_merge()?;
        Ok(Self { root })
    }

    /// Serialize to block-style YAML
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Overwrite `path` with the serialized document.
    ///
    /// Serialization happens before the file is opened, so an encoding
    /// failure leaves the file as it was.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_yaml_string()?;
        std::fs::write(path, content)?;
        tracing::info!("Wrote compose file: {}", path.display());
        Ok(())
    }

    /// The `services` mapping, if present and actually a mapping
    pub fn services(&self) -> Option<&Mapping> {
        self.root.get("services").and_then(Value::as_mapping)
    }

    /// Mutable access to the `services` mapping
    pub fn services_mut(&mut self) -> Option<&mut Mapping> {
        self.root.get_mut("services").and_then(Value::as_mapping_mut)
    }

    /// The underlying YAML tree
    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl FromStr for ComposeDocument {
    type Err = PortfixError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

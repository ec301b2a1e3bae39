//! Port sanitizer
//!
//! Removes published ports from infrastructure services and pins the
//! reverse proxy to a fixed set of mappings.

use crate::compose::{ComposeDocument, DEFAULT_COMPOSE_FILE};
use crate::error::{PortfixError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Service whose ports are rewritten instead of removed
pub const TRAEFIK: &str = "traefik";

/// Services sanitized when no allow-list is given
pub const DEFAULT_SERVICES: &[&str] = &["postgres", "mongodb", "redis", "meilisearch", TRAEFIK];

/// Port mappings traefik keeps by default
pub const DEFAULT_TRAEFIK_PORTS: &[&str] = &["80:80"];

const PORTS_KEY: &str = "ports";

/// Sanitizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Compose file to rewrite
    pub path: PathBuf,
    /// Allow-list of services eligible for mutation
    pub services: BTreeSet<String>,
    /// Replacement `ports` for traefik
    pub traefik_ports: Vec<String>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_COMPOSE_FILE),
            services: DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
            traefik_ports: DEFAULT_TRAEFIK_PORTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SanitizeConfig {
    /// Reject blank service names and blank port mappings
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(PortfixError::InvalidConfig(
                "compose file path is empty".to_string(),
            ));
        }

        if let Some(name) = self.services.iter().find(|s| s.trim().is_empty()) {
            return Err(PortfixError::InvalidConfig(format!(
                "invalid service name '{}'",
                name
            )));
        }

        if self.traefik_ports.iter().any(|p| p.trim().is_empty()) {
            return Err(PortfixError::InvalidConfig(
                "traefik port mapping must not be empty".to_string(),
            ));
        }

        for mapping in self.ambiguous_traefik_ports() {
            tracing::warn!(
                "Port mapping {} is written unquoted and YAML 1.1 readers parse it as a base-60 number",
                mapping
            );
        }

        Ok(())
    }

    /// Traefik mappings a YAML 1.1 reader would take for base-60 integers
    pub fn ambiguous_traefik_ports(&self) -> Vec<&str> {
        self.traefik_ports
            .iter()
            .map(String::as_str)
            .filter(|p| is_sexagesimal(p))
            .collect()
    }
}

/// `1:30`, `22:22`: digits with a non-zero lead, then `:` groups of 0-59
fn is_sexagesimal(s: &str) -> bool {
    let mut parts = s.split(':');
    let Some(head) = parts.next() else {
        return false;
    };

    let head_ok = head.starts_with(|c: char| ('1'..='9').contains(&c))
        && head.chars().all(|c| c.is_ascii_digit() || c == '_');
    let mut tail = parts.peekable();
    if !head_ok || tail.peek().is_none() {
        return false;
    }

    tail.all(|part| {
        (1..=2).contains(&part.len())
            && part.chars().all(|c| c.is_ascii_digit())
            && part.parse::<u8>().is_ok_and(|n| n < 60)
    })
}

/// Why a service was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not listed under `services`
    NotPresent,
    /// Present but without a `ports` key
    NoPorts,
    /// Definition is not a mapping (e.g. an empty entry)
    NotAMapping,
}

/// What happened to one allow-listed service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceOutcome {
    /// `ports` key deleted
    PortsRemoved,
    /// `ports` replaced with the traefik mappings
    PortsRewritten,
    /// Nothing changed
    Untouched(SkipReason),
}

impl fmt::Display for ServiceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceOutcome::PortsRemoved => write!(f, "ports removed"),
            ServiceOutcome::PortsRewritten => write!(f, "ports rewritten"),
            ServiceOutcome::Untouched(SkipReason::NotPresent) => write!(f, "not present"),
            ServiceOutcome::Untouched(SkipReason::NoPorts) => write!(f, "no ports"),
            ServiceOutcome::Untouched(SkipReason::NotAMapping) => write!(f, "not a mapping"),
        }
    }
}

/// Per-service result of a sanitizer pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub name: String,
    pub outcome: ServiceOutcome,
}

/// Result of a sanitizer pass, ordered by service name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub services: Vec<ServiceReport>,
}

impl SanitizeReport {
    /// Whether any service was modified
    pub fn changed(&self) -> bool {
        self.changed_count() > 0
    }

    /// Number of modified services
    pub fn changed_count(&self) -> usize {
        self.services
            .iter()
            .filter(|s| !matches!(s.outcome, ServiceOutcome::Untouched(_)))
            .count()
    }

    /// Outcome recorded for `name`
    pub fn outcome(&self, name: &str) -> Option<ServiceOutcome> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.outcome)
    }

    fn record(&mut self, name: &str, outcome: ServiceOutcome) {
        self.services.push(ServiceReport {
            name: name.to_string(),
            outcome,
        });
    }
}

/// Sanitize `document` in place.
///
/// Only services named in `config.services` are inspected. A missing or
/// non-mapping `services` entry is treated as empty.
pub fn sanitize(document: &mut ComposeDocument, config: &SanitizeConfig) -> SanitizeReport {
    let mut report = SanitizeReport::default();

    let Some(services) = document.services_mut() else {
        tracing::debug!("No services mapping found, nothing to sanitize");
        for name in &config.services {
            report.record(name, ServiceOutcome::Untouched(SkipReason::NotPresent));
        }
        return report;
    };

    for name in &config.services {
        let outcome = sanitize_service(services, name, &config.traefik_ports);
        match outcome {
            ServiceOutcome::Untouched(_) => tracing::debug!("Service {}: {}", name, outcome),
            _ => tracing::info!("Service {}: {}", name, outcome),
        }
        report.record(name, outcome);
    }

    report
}

fn sanitize_service(services: &mut Mapping, name: &str, traefik_ports: &[String]) -> ServiceOutcome {
    let Some(service) = services.get_mut(name) else {
        return ServiceOutcome::Untouched(SkipReason::NotPresent);
    };

    let Some(service) = service.as_mapping_mut() else {
        return ServiceOutcome::Untouched(SkipReason::NotAMapping);
    };

    if !service.contains_key(PORTS_KEY) {
        return ServiceOutcome::Untouched(SkipReason::NoPorts);
    }

    if name == TRAEFIK {
        let ports = traefik_ports.iter().cloned().map(Value::String).collect();
        // insert on an existing key keeps its position
        service.insert(Value::String(PORTS_KEY.to_string()), Value::Sequence(ports));
        ServiceOutcome::PortsRewritten
    } else {
        service.shift_remove(PORTS_KEY);
        ServiceOutcome::PortsRemoved
    }
}

/// Load and sanitize the configured compose file without writing it
pub fn preview(config: &SanitizeConfig) -> Result<(ComposeDocument, SanitizeReport)> {
    config.validate()?;

    let mut document = ComposeDocument::load(&config.path)?;
    let report = sanitize(&mut document, config);

    Ok((document, report))
}

/// Load the configured compose file, sanitize it and write it back
pub fn run(config: &SanitizeConfig) -> Result<SanitizeReport> {
    let (document, report) = preview(config)?;
    document.save(&config.path)?;

    Ok(report)
}

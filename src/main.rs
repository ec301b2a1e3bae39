//! portfix - strips published ports from a docker-compose file
//!
//! This is the CLI entry point. Run without arguments it rewrites
//! `docker-compose.yml` in the current directory.

use anyhow::Context;
use clap::Parser;
use portfix::compose::DEFAULT_COMPOSE_FILE;
use portfix::sanitize::{self, SanitizeConfig, DEFAULT_SERVICES, DEFAULT_TRAEFIK_PORTS};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Printed to stdout after the file has been written
const CONFIRMATION: &str = "YAML repariert!";

/// portfix - remove published ports of infrastructure services
#[derive(Parser)]
#[command(name = "portfix")]
#[command(author = "Evoker Industries")]
#[command(version)]
#[command(about = "Remove published ports of infrastructure services from a compose file", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Compose file to rewrite
    #[arg(short, long, default_value = DEFAULT_COMPOSE_FILE)]
    file: PathBuf,

    /// Service to sanitize (repeatable, replaces the default list)
    #[arg(short, long = "service", value_name = "NAME")]
    services: Vec<String>,

    /// Port mapping kept for traefik (repeatable)
    #[arg(long = "traefik-port", value_name = "MAPPING")]
    traefik_ports: Vec<String>,

    /// Print the sanitized file instead of writing it
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn sanitize_config(&self) -> SanitizeConfig {
        let services = if self.services.is_empty() {
            DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect()
        } else {
            self.services.iter().cloned().collect()
        };

        let traefik_ports = if self.traefik_ports.is_empty() {
            DEFAULT_TRAEFIK_PORTS.iter().map(|s| s.to_string()).collect()
        } else {
            self.traefik_ports.clone()
        };

        SanitizeConfig {
            path: self.file.clone(),
            services,
            traefik_ports,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.sanitize_config();
    execute(&config, cli.dry_run, &mut std::io::stdout().lock())
}

/// Sanitize (or preview) the compose file and report on `out`.
///
/// The confirmation line is written only after the file has been saved.
fn execute(config: &SanitizeConfig, dry_run: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if dry_run {
        let (document, report) = sanitize::preview(config)
            .with_context(|| format!("Failed to load {}", config.path.display()))?;
        tracing::info!("{} service(s) would change", report.changed_count());
        write!(out, "{}", document.to_yaml_string()?)?;
        return Ok(());
    }

    let report = sanitize::run(config)
        .with_context(|| format!("Failed to sanitize {}", config.path.display()))?;

    for service in &report.services {
        tracing::debug!("{}: {}", service.name, service.outcome);
    }
    tracing::info!("{} service(s) changed", report.changed_count());

    writeln!(out, "{}", CONFIRMATION)?;
    Ok(())
}

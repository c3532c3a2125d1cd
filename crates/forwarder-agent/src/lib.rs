//! Startup configuration for the forwarder agent.
//!
//! Loads the agent config (with any overrides), the agent identity, and the
//! service declarations named by the agent config, in that order. The result
//! is handed to the tunnel and TLS layers as plain values.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use forwarder_config::{
    AgentConfig, AgentConfigOptions, ConfigError, ConfigLayer, LayeredAgentConfig, ServiceConfig,
    ServiceSchema, load_agent_info,
};
use forwarder_protocol::AgentInfo;
use log::{debug, info};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Agent config path used when `--config` is not given.
pub const DEFAULT_AGENT_CONFIG_PATH: &str = "/app/config/config.yaml";
/// Agent identity path used when `--identity` is not given.
pub const DEFAULT_IDENTITY_PATH: &str = "/app/config/identity.yaml";

/// Command-line options for the agent.
#[derive(Debug, Clone, Parser)]
#[command(name = "forwarder-agent", version)]
pub struct Cli {
    /// Path to the agent config file
    #[arg(long, default_value = DEFAULT_AGENT_CONFIG_PATH)]
    pub config: PathBuf,
    /// Extra agent config files merged over the base, in order
    #[arg(long = "override", value_name = "PATH")]
    pub overrides: Vec<PathBuf>,
    /// Path to the agent identity file
    #[arg(long, default_value = DEFAULT_IDENTITY_PATH)]
    pub identity: PathBuf,
    /// Replace the services file named in the agent config
    #[arg(long)]
    pub services: Option<PathBuf>,
    /// Service document shape
    #[arg(long, value_enum, default_value_t = SchemaArg::Auto)]
    pub schema: SchemaArg,
    /// Print the effective configuration as YAML
    #[arg(long)]
    pub print: bool,
}

/// Service document shape selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemaArg {
    /// Detect from the document's top-level keys.
    Auto,
    Unified,
    Split,
}

/// Everything the agent loads before opening a tunnel.
#[derive(Debug, Clone)]
pub struct AgentBootstrap {
    pub config: AgentConfig,
    pub layers: Vec<ConfigLayer>,
    pub identity: AgentInfo,
    pub services: ServiceConfig,
}

/// Effective configuration as printed by `--print`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EffectiveConfig<'a> {
    agent_config: &'a AgentConfig,
    agent_info: &'a AgentInfo,
    service_config: &'a ServiceConfig,
}

impl AgentBootstrap {
    /// Render the effective configuration as a YAML document.
    pub fn render_yaml(&self) -> Result<String> {
        let effective = EffectiveConfig {
            agent_config: &self.config,
            agent_info: &self.identity,
            service_config: &self.services,
        };
        serde_yaml::to_string(&effective).context("failed to render effective config")
    }

    /// Number of outgoing services that are enabled.
    pub fn enabled_services(&self) -> usize {
        self.services.enabled_outgoing().count()
    }
}

/// Load and validate every configuration document the agent needs.
pub fn bootstrap(cli: &Cli) -> Result<AgentBootstrap> {
    let options = cli
        .overrides
        .iter()
        .fold(AgentConfigOptions::new(&cli.config), |options, path| {
            options.with_override_path(path)
        });
    let LayeredAgentConfig { config, layers } = AgentConfig::load_layered(options)
        .with_context(|| format!("failed to load agent config {}", cli.config.display()))?;
    let config = match &cli.services {
        Some(path) => AgentConfig {
            services_config_path: path.display().to_string(),
            ..config
        },
        None => config,
    };
    config.validate().context("invalid agent config")?;
    debug!("agent config ready (layers={})", layers.len());

    let identity = load_agent_info(&cli.identity)
        .with_context(|| format!("failed to load agent identity {}", cli.identity.display()))?;

    let services_path = Path::new(&config.services_config_path);
    let services = load_services(services_path, cli.schema)
        .with_context(|| format!("failed to load service config {}", services_path.display()))?;
    services
        .validate()
        .with_context(|| format!("invalid service config {}", services_path.display()))?;

    info!(
        "configuration loaded (agent={}, controller={}, schema={:?}, incoming={}, outgoing={})",
        identity.name,
        config.controller_hostname,
        services.schema(),
        services.incoming().len(),
        services.outgoing().len()
    );
    Ok(AgentBootstrap {
        config,
        layers,
        identity,
        services,
    })
}

fn load_services(path: &Path, schema: SchemaArg) -> Result<ServiceConfig, ConfigError> {
    match schema {
        SchemaArg::Auto => ServiceConfig::load_from_path(path),
        SchemaArg::Unified => ServiceConfig::load_with_schema(path, ServiceSchema::Unified),
        SchemaArg::Split => ServiceConfig::load_with_schema(path, ServiceSchema::Split),
    }
}

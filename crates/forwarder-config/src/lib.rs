//! Configuration models and loaders for the forwarder agent.
//!
//! This crate owns the agent config schema, its defaulting rules, the service
//! declaration schemas, and the YAML loaders used at process start.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered agent config types and loader entry points.
pub use loader::{
    AgentConfigOptions, ConfigLayer, ConfigLayerSource, LayeredAgentConfig, load_agent_info,
};
/// Configuration schema models.
pub use model::*;

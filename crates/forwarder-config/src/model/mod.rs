//! Configuration schema for the forwarder agent.

mod agent;
mod lenient;
mod services;

pub use agent::{
    AgentConfig, AgentConfigDocument, DEFAULT_CERT_PATH, DEFAULT_CONTROLLER_HOSTNAME,
    DEFAULT_KEY_PATH, DEFAULT_SERVICES_CONFIG_PATH, apply_defaults,
};
pub use forwarder_protocol::AgentInfo;
pub use services::{
    AgentServiceConfig, IncomingService, ServiceConfig, ServiceDeclaration, ServiceNamespace,
    ServiceSchema, SplitServiceConfig,
};

//! Service declarations the agent exposes to, or proxies for, the controller.
//!
//! Two document shapes exist: the unified `services` list, and the split
//! `incomingServices`/`outgoingServices` pair. The per-service `config` payload
//! is opaque here; each service type decodes it with
//! [`ServiceDeclaration::decode_config`].

use super::lenient;
use crate::ConfigError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

/// Named grouping restricting which namespaces of a target a service may act on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceNamespace {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

/// A service the agent originates traffic toward, such as a Jenkins endpoint.
///
/// This is the entry shape of both the unified `services` list and the split
/// `outgoingServices` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDeclaration {
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub enabled: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub service_type: String,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub config: Mapping,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<ServiceNamespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role: Option<String>,
}

impl ServiceDeclaration {
    /// Decode the opaque `config` payload into a service type's own schema.
    pub fn decode_config<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_yaml::from_value(Value::Mapping(self.config.clone()))
            .map_err(|err| ConfigError::invalid(format!("{}.config", self.name), err.to_string()))
    }

    /// Fetch a single raw `config` entry by string key.
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }
}

/// Traffic the agent accepts locally and forwards through the tunnel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingService {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub service_type: String,
    #[serde(default, rename = "useHTTP", deserialize_with = "lenient::boolean")]
    pub use_http: bool,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub destination_service: String,
}

/// Unified service document: a single `services` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentServiceConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceDeclaration>,
}

/// Split service document: separate incoming and outgoing lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitServiceConfig {
    /// Always written, even when empty, so the document reloads as split.
    #[serde(default)]
    pub incoming_services: Vec<IncomingService>,
    #[serde(default)]
    pub outgoing_services: Vec<ServiceDeclaration>,
}

/// Which document shape a service config file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSchema {
    /// Single `services` list.
    Unified,
    /// `incomingServices` and `outgoingServices` lists.
    Split,
}

/// Service config in either document shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceConfig {
    Unified(AgentServiceConfig),
    Split(SplitServiceConfig),
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::Unified(AgentServiceConfig::default())
    }
}

impl ServiceConfig {
    /// Document shape this value was decoded from.
    pub fn schema(&self) -> ServiceSchema {
        match self {
            Self::Unified(_) => ServiceSchema::Unified,
            Self::Split(_) => ServiceSchema::Split,
        }
    }

    /// Incoming services; always empty for the unified shape.
    pub fn incoming(&self) -> &[IncomingService] {
        match self {
            Self::Unified(_) => &[],
            Self::Split(split) => &split.incoming_services,
        }
    }

    /// Outgoing services. Unified `services` entries are outgoing-shaped.
    pub fn outgoing(&self) -> &[ServiceDeclaration] {
        match self {
            Self::Unified(unified) => &unified.services,
            Self::Split(split) => &split.outgoing_services,
        }
    }

    /// Outgoing services with `enabled: true`, in document order.
    pub fn enabled_outgoing(&self) -> impl Iterator<Item = &ServiceDeclaration> {
        self.outgoing().iter().filter(|service| service.enabled)
    }

    /// Check identifier presence and name uniqueness.
    ///
    /// Loading never calls this; the caller decides when declarations must be
    /// well-formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Unified(unified) => validate_declarations(&unified.services, "services"),
            Self::Split(split) => {
                validate_incoming(&split.incoming_services, "incomingServices")?;
                validate_declarations(&split.outgoing_services, "outgoingServices")
            }
        }
    }
}

fn validate_declarations(services: &[ServiceDeclaration], label: &str) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (idx, service) in services.iter().enumerate() {
        let path = format!("{label}[{idx}]");
        expect_identifier(&service.name, &path, "name")?;
        expect_identifier(&service.service_type, &path, "type")?;
        ensure_unique(&mut seen, &service.name, &path)?;
        for (ns_idx, namespace) in service.namespaces.iter().enumerate() {
            expect_identifier(
                &namespace.name,
                &format!("{path}.namespaces[{ns_idx}]"),
                "name",
            )?;
        }
    }
    Ok(())
}

fn validate_incoming(services: &[IncomingService], label: &str) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (idx, service) in services.iter().enumerate() {
        let path = format!("{label}[{idx}]");
        expect_identifier(&service.name, &path, "name")?;
        expect_identifier(&service.service_type, &path, "serviceType")?;
        ensure_unique(&mut seen, &service.name, &path)?;
        if service.port == 0 {
            return Err(ConfigError::invalid(
                format!("{path}.port"),
                "port must be non-zero",
            ));
        }
    }
    Ok(())
}

fn expect_identifier(value: &str, path: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(
            format!("{path}.{field}"),
            format!("{field} is required"),
        ));
    }
    Ok(())
}

fn ensure_unique<'a>(
    seen: &mut HashSet<&'a str>,
    name: &'a str,
    path: &str,
) -> Result<(), ConfigError> {
    if !seen.insert(name) {
        return Err(ConfigError::invalid(
            format!("{path}.name"),
            format!("duplicate service name: {name}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn declaration(name: &str, service_type: &str) -> ServiceDeclaration {
        ServiceDeclaration {
            enabled: true,
            name: name.to_string(),
            service_type: service_type.to_string(),
            ..ServiceDeclaration::default()
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct JenkinsConfig {
        url: String,
        #[serde(default)]
        insecure: bool,
    }

    #[test]
    fn decode_config_uses_service_schema() {
        let service: ServiceDeclaration =
            serde_yaml::from_str("name: jenkins1\ntype: jenkins\nconfig:\n  url: http://x\n")
                .expect("decode");
        let config: JenkinsConfig = service.decode_config().expect("config");
        assert_eq!(
            config,
            JenkinsConfig {
                url: "http://x".to_string(),
                insecure: false,
            }
        );
    }

    #[test]
    fn decode_config_mismatch_names_the_service() {
        let service: ServiceDeclaration =
            serde_yaml::from_str("name: jenkins1\ntype: jenkins\nconfig:\n  insecure: yes-please\n")
                .expect("decode");
        let err = service.decode_config::<JenkinsConfig>().unwrap_err();
        assert!(format!("{err}").contains("jenkins1.config"));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let config = ServiceConfig::Unified(AgentServiceConfig {
            services: vec![declaration("a", "jenkins"), declaration("a", "argocd")],
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("services[1].name"));
    }

    #[test]
    fn validate_requires_type() {
        let config = ServiceConfig::Unified(AgentServiceConfig {
            services: vec![declaration("a", "")],
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("services[0].type"));
    }

    #[test]
    fn incoming_and_outgoing_names_are_independent() {
        let config = ServiceConfig::Split(SplitServiceConfig {
            incoming_services: vec![IncomingService {
                name: "a".to_string(),
                port: 8080,
                service_type: "jenkins".to_string(),
                ..IncomingService::default()
            }],
            outgoing_services: vec![declaration("a", "jenkins")],
        });
        config.validate().expect("valid");
    }

    #[test]
    fn incoming_port_must_be_set() {
        let config = ServiceConfig::Split(SplitServiceConfig {
            incoming_services: vec![IncomingService {
                name: "a".to_string(),
                service_type: "jenkins".to_string(),
                ..IncomingService::default()
            }],
            outgoing_services: Vec::new(),
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("incomingServices[0].port"));
    }

    #[test]
    fn enabled_outgoing_skips_disabled_entries() {
        let mut disabled = declaration("b", "jenkins");
        disabled.enabled = false;
        let config = ServiceConfig::Unified(AgentServiceConfig {
            services: vec![declaration("a", "jenkins"), disabled],
        });
        let names: Vec<_> = config
            .enabled_outgoing()
            .map(|service| service.name.as_str())
            .collect();
        assert_eq!(names, vec!["a"]);
        assert!(config.incoming().is_empty());
    }
}

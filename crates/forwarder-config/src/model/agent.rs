//! Agent process configuration and its defaulting rules.

use super::lenient;
use crate::ConfigError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// Controller address used when the document leaves it empty.
pub const DEFAULT_CONTROLLER_HOSTNAME: &str = "forwarder-controller:9001";
/// Agent certificate path used when the document leaves it empty.
pub const DEFAULT_CERT_PATH: &str = "/app/secrets/agent/tls.crt";
/// Agent key path used when the document leaves it empty.
pub const DEFAULT_KEY_PATH: &str = "/app/secrets/agent/tls.key";
/// Service declarations path used when the document leaves it empty.
pub const DEFAULT_SERVICES_CONFIG_PATH: &str = "/app/config/services.yaml";

/// Agent config exactly as written on disk, before defaults are applied.
///
/// Every field is optional; `null` and absent keys both decode to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_config_path: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::option_boolean",
        skip_serializing_if = "Option::is_none"
    )]
    pub insecure_controller_allowed: Option<bool>,
}

/// Fully-defaulted agent configuration.
///
/// The four path/address fields are never empty. Decoding goes through
/// [`AgentConfigDocument`] and [`apply_defaults`], so a deserialized value is
/// always complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "AgentConfigDocument")]
pub struct AgentConfig {
    /// Address of the remote controller (`host:port`).
    pub controller_hostname: String,
    /// Inline base64 CA certificate. `None` means the file-based trust store is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert64: Option<String>,
    /// Path to the agent's TLS certificate.
    pub cert_file: String,
    /// Path to the agent's TLS key.
    pub key_file: String,
    /// Path to the service declarations file.
    pub services_config_path: String,
    /// Relax controller hostname and trust verification.
    pub insecure_controller_allowed: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        apply_defaults(AgentConfigDocument::default())
    }
}

impl From<AgentConfigDocument> for AgentConfig {
    fn from(document: AgentConfigDocument) -> Self {
        apply_defaults(document)
    }
}

/// Fill every empty or absent field of a raw document with its default.
///
/// Values present in the document are kept unchanged.
pub fn apply_defaults(document: AgentConfigDocument) -> AgentConfig {
    AgentConfig {
        controller_hostname: or_default(document.controller_hostname, DEFAULT_CONTROLLER_HOSTNAME),
        ca_cert64: document.ca_cert64,
        cert_file: or_default(document.cert_file, DEFAULT_CERT_PATH),
        key_file: or_default(document.key_file, DEFAULT_KEY_PATH),
        services_config_path: or_default(
            document.services_config_path,
            DEFAULT_SERVICES_CONFIG_PATH,
        ),
        insecure_controller_allowed: document.insecure_controller_allowed.unwrap_or(false),
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl AgentConfig {
    /// Decode the inline CA certificate, if one is configured.
    ///
    /// Whitespace inside the value is ignored so YAML block scalars work.
    pub fn ca_cert(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let Some(encoded) = self.ca_cert64.as_deref() else {
            return Ok(None);
        };
        let compact: String = encoded.split_whitespace().collect();
        if compact.is_empty() {
            return Ok(None);
        }
        STANDARD
            .decode(compact.as_bytes())
            .map(Some)
            .map_err(|err| ConfigError::invalid("caCert64", err.to_string()))
    }

    /// Validate invariants that decoding alone does not check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ca_cert()?;
        Ok(())
    }
}

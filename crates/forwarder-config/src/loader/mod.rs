//! YAML loaders for the agent config, agent identity, and service declarations.
//!
//! Every loader reads the whole file, decodes it, and either returns a complete
//! value or an error. Nothing is retried and no partial value is produced.

mod document;
mod merge;


use crate::{
    AgentConfig, AgentConfigDocument, AgentInfo, AgentServiceConfig, ConfigError, ServiceConfig,
    ServiceSchema, SplitServiceConfig,
};
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// Label used in errors for documents that did not come from a file.
const INLINE_SOURCE: &str = "<inline>";
/// Top-level keys that mark the split service schema.
const SPLIT_SCHEMA_KEYS: &[&str] = &["incomingServices", "outgoingServices"];

/// Effective agent config plus the layers it was merged from.
#[derive(Debug, Clone)]
pub struct LayeredAgentConfig {
    /// The merged, defaulted config.
    pub config: AgentConfig,
    /// Each layer read, in merge order.
    pub layers: Vec<ConfigLayer>,
}

/// Origin of a single agent config layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// The primary agent config file.
    Base,
    /// An override file applied on top of the base.
    Override,
}

/// Metadata about a loaded config layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling which agent config files are merged.
#[derive(Debug, Clone)]
pub struct AgentConfigOptions {
    /// The primary agent config file.
    pub path: PathBuf,
    /// Override files applied in order after the base.
    pub override_paths: Vec<PathBuf>,
}

impl AgentConfigOptions {
    /// Options reading only the given base file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            override_paths: Vec::new(),
        }
    }

    /// Add an override file that is applied after every earlier layer.
    pub fn with_override_path(mut self, path: impl AsRef<Path>) -> Self {
        self.override_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl AgentConfig {
    /// Load a single agent config file and apply defaults.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("loading agent config from path: {}", path.display());
        let contents = document::read(path)?;
        let config: AgentConfig = document::decode(&contents, path)?;
        report_agent_config(&config);
        Ok(config)
    }

    /// Load an agent config from YAML contents and apply defaults.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading agent config from raw contents (len={})", contents.len());
        let config: AgentConfig = document::decode(contents, Path::new(INLINE_SOURCE))?;
        report_agent_config(&config);
        Ok(config)
    }

    /// Load the base file and every override, merge them, then apply defaults.
    ///
    /// Mappings merge recursively and later layers win. A `null` or empty
    /// string in a later layer leaves the earlier value in place.
    pub fn load_layered(options: AgentConfigOptions) -> Result<LayeredAgentConfig, ConfigError> {
        info!(
            "loading layered agent config (base={}, overrides={})",
            options.path.display(),
            options.override_paths.len()
        );
        let sources = std::iter::once((ConfigLayerSource::Base, options.path.as_path())).chain(
            options
                .override_paths
                .iter()
                .map(|path| (ConfigLayerSource::Override, path.as_path())),
        );

        let mut merged = Value::Mapping(Mapping::new());
        let mut layers = Vec::new();
        for (source, path) in sources {
            let contents = document::read(path)?;
            // Decode each layer on its own first so type errors point at the right file.
            let _: AgentConfigDocument = document::decode(&contents, path)?;
            let value = document::parse_value(&contents, path)?;
            merge::merge_yaml_values(&mut merged, &value);
            debug!("merged agent config layer (source={source:?}, path={})", path.display());
            layers.push(ConfigLayer {
                source,
                path: path.to_path_buf(),
            });
        }

        let config: AgentConfig = serde_yaml::from_value(merged)
            .map_err(|err| ConfigError::decode(&options.path, err))?;
        report_agent_config(&config);
        info!("layered agent config loaded (layers={})", layers.len());
        Ok(LayeredAgentConfig { config, layers })
    }
}

impl AgentServiceConfig {
    /// Load a unified `services` document.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = document::read(path)?;
        let config: AgentServiceConfig = document::decode(&contents, path)?;
        info!(
            "loaded service config (path={}, services={})",
            path.display(),
            config.services.len()
        );
        Ok(config)
    }
}

impl SplitServiceConfig {
    /// Load a split `incomingServices`/`outgoingServices` document.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = document::read(path)?;
        let config: SplitServiceConfig = document::decode(&contents, path)?;
        info!(
            "loaded service config (path={}, incoming={}, outgoing={})",
            path.display(),
            config.incoming_services.len(),
            config.outgoing_services.len()
        );
        Ok(config)
    }
}

impl ServiceConfig {
    /// Load a service config file, detecting its document shape.
    ///
    /// A document with `incomingServices` or `outgoingServices` at the top
    /// level is read as the split shape; anything else as the unified shape.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = document::read(path)?;
        Self::decode_detected(&contents, path)
    }

    /// Load service config YAML contents, detecting the document shape.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        Self::decode_detected(contents, Path::new(INLINE_SOURCE))
    }

    /// Load a service config file using an explicit document shape.
    pub fn load_with_schema(
        path: impl AsRef<Path>,
        schema: ServiceSchema,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = document::read(path)?;
        Self::decode_as(&contents, path, schema)
    }

    fn decode_detected(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let value = document::parse_value(contents, path)?;
        let schema = detect_schema(&value);
        debug!("detected {schema:?} service schema (path={})", path.display());
        Self::decode_as(contents, path, schema)
    }

    fn decode_as(contents: &str, path: &Path, schema: ServiceSchema) -> Result<Self, ConfigError> {
        let config = match schema {
            ServiceSchema::Unified => Self::Unified(document::decode(contents, path)?),
            ServiceSchema::Split => Self::Split(document::decode(contents, path)?),
        };
        info!(
            "loaded service config (path={}, schema={schema:?}, incoming={}, outgoing={})",
            path.display(),
            config.incoming().len(),
            config.outgoing().len()
        );
        Ok(config)
    }
}

/// Wrapper document holding the agent identity.
#[derive(Debug, Deserialize)]
struct AgentInfoContainer {
    #[serde(rename = "agentInfo", deserialize_with = "null_as_default")]
    agent_info: AgentInfo,
}

/// `agentInfo: ~` reads as an empty identity; a missing key is still an error.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Load the agent identity from the `agentInfo` key of a YAML file.
///
/// A document without `agentInfo` is a decode error.
pub fn load_agent_info(path: impl AsRef<Path>) -> Result<AgentInfo, ConfigError> {
    let path = path.as_ref();
    info!("loading agent identity from path: {}", path.display());
    let contents = document::read(path)?;
    let container: AgentInfoContainer = document::decode(&contents, path)?;
    debug!("loaded agent identity (name={})", container.agent_info.name);
    Ok(container.agent_info)
}

fn detect_schema(value: &Value) -> ServiceSchema {
    let is_split = value
        .as_mapping()
        .is_some_and(|map| SPLIT_SCHEMA_KEYS.iter().any(|key| map.contains_key(*key)));
    if is_split {
        ServiceSchema::Split
    } else {
        ServiceSchema::Unified
    }
}

fn report_agent_config(config: &AgentConfig) {
    debug!(
        "agent config resolved (controller={}, services={})",
        config.controller_hostname, config.services_config_path
    );
    if config.insecure_controller_allowed {
        warn!(
            "insecure controller connections allowed (controller={})",
            config.controller_hostname
        );
    }
}

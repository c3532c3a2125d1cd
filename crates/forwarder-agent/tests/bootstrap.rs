//! End-to-end loading of the agent's startup documents.

use clap::Parser;
use forwarder_agent::{Cli, SchemaArg, bootstrap};
use forwarder_config::{DEFAULT_CERT_PATH, ServiceSchema};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp directory holding a complete set of agent documents.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(services: &str) -> Self {
        let dir = TempDir::new().expect("tmp");
        let services_path = dir.path().join("services.yaml");
        fs::write(&services_path, services).expect("services");
        fs::write(
            dir.path().join("config.yaml"),
            format!(
                "controllerHostname: ctl:9001\nservicesConfigPath: {}\n",
                services_path.display()
            ),
        )
        .expect("config");
        fs::write(
            dir.path().join("identity.yaml"),
            "agentInfo:\n  name: agent-1\n",
        )
        .expect("identity");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cli(&self, extra: &[&str]) -> Cli {
        let config = self.path("config.yaml");
        let identity = self.path("identity.yaml");
        let mut args = vec![
            "forwarder-agent".to_string(),
            "--config".to_string(),
            config.display().to_string(),
            "--identity".to_string(),
            identity.display().to_string(),
        ];
        args.extend(extra.iter().map(|arg| arg.to_string()));
        Cli::try_parse_from(args).expect("cli")
    }
}

fn write(path: &Path, contents: &str) {
    fs::write(path, contents).expect("write");
}

const UNIFIED_SERVICES: &str = r#"
services:
  - enabled: true
    name: jenkins1
    type: jenkins
    config:
      url: http://x
  - enabled: false
    name: argo
    type: argocd
"#;

#[test]
fn loads_all_three_documents() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    let loaded = bootstrap(&fixture.cli(&[])).expect("bootstrap");

    assert_eq!(loaded.config.controller_hostname, "ctl:9001");
    assert_eq!(loaded.config.cert_file, DEFAULT_CERT_PATH);
    assert_eq!(loaded.identity.name, "agent-1");
    assert_eq!(loaded.services.schema(), ServiceSchema::Unified);
    assert_eq!(loaded.services.outgoing().len(), 2);
    assert_eq!(loaded.enabled_services(), 1);
    assert_eq!(loaded.layers.len(), 1);
}

#[test]
fn services_flag_replaces_configured_path() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    let split = fixture.path("split.yaml");
    write(
        &split,
        "incomingServices:\n  - {name: in, port: 8002, serviceType: jenkins}\n",
    );
    let split_arg = split.display().to_string();

    let loaded = bootstrap(&fixture.cli(&["--services", &split_arg])).expect("bootstrap");
    assert_eq!(loaded.config.services_config_path, split_arg);
    assert_eq!(loaded.services.schema(), ServiceSchema::Split);
    assert_eq!(loaded.services.incoming()[0].port, 8002);
}

#[test]
fn overrides_are_merged_in_order() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    let first = fixture.path("first.yaml");
    write(&first, "controllerHostname: first:9001\n");
    let second = fixture.path("second.yaml");
    write(&second, "insecureControllerAllowed: true\n");
    let first_arg = first.display().to_string();
    let second_arg = second.display().to_string();

    let cli = fixture.cli(&["--override", &first_arg, "--override", &second_arg]);
    let loaded = bootstrap(&cli).expect("bootstrap");
    assert_eq!(loaded.config.controller_hostname, "first:9001");
    assert!(loaded.config.insecure_controller_allowed);
    assert_eq!(loaded.layers.len(), 3);
}

#[test]
fn schema_flag_is_parsed() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    let cli = fixture.cli(&["--schema", "split"]);
    assert_eq!(cli.schema, SchemaArg::Split);

    let loaded = bootstrap(&cli).expect("bootstrap");
    assert!(loaded.services.outgoing().is_empty());
}

#[test]
fn missing_identity_names_the_file() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    fs::remove_file(fixture.path("identity.yaml")).expect("remove");

    let err = bootstrap(&fixture.cli(&[])).unwrap_err();
    assert!(format!("{err}").contains("identity.yaml"));
}

#[test]
fn duplicate_service_names_fail_bootstrap() {
    let fixture = Fixture::new(
        "services:\n  - {name: a, type: jenkins}\n  - {name: a, type: argocd}\n",
    );
    let err = bootstrap(&fixture.cli(&[])).unwrap_err();
    assert!(format!("{err:#}").contains("duplicate service name: a"));
}

#[test]
fn effective_config_renders_wire_keys() {
    let fixture = Fixture::new(UNIFIED_SERVICES);
    let loaded = bootstrap(&fixture.cli(&[])).expect("bootstrap");
    let rendered = loaded.render_yaml().expect("render");

    assert!(rendered.contains("agentConfig:"));
    assert!(rendered.contains("controllerHostname:"));
    assert!(rendered.contains("ctl:9001"));
    assert!(rendered.contains("insecureControllerAllowed: false"));
    assert!(rendered.contains("agentInfo:"));
    assert!(rendered.contains("name: jenkins1"));
}

use clap::Parser;
use forwarder_agent::{Cli, bootstrap};
use log::info;

/// Entry point for the forwarder agent configuration bootstrap.
fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();

    let cli = Cli::parse();
    info!(
        "starting agent (config={}, overrides={}, identity={})",
        cli.config.display(),
        cli.overrides.len(),
        cli.identity.display()
    );

    let loaded = bootstrap(&cli)?;
    info!(
        "agent ready to connect (controller={}, enabled_services={})",
        loaded.config.controller_hostname,
        loaded.enabled_services()
    );

    if cli.print {
        print!("{}", loaded.render_yaml()?);
    }
    Ok(())
}

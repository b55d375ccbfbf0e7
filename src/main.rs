//! Observation-State Transition Graph

use clap::Parser;
use obsstate_graph::{Config, Result, VERSION, cli, init_logging};

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let config_path = args.config.clone().or_else(Config::find);
    let config = match &config_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    init_logging(&config.logging.level);

    tracing::info!("obsstate-graph v{}", VERSION);
    match &config_path {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::debug!("No config file found, using defaults"),
    }
    tracing::debug!("Parsed arguments: {:?}", args);
    tracing::debug!("Loaded configuration: {:?}", config);

    cli::execute(args, config)?;

    Ok(())
}

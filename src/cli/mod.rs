//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::parser::ModelSchema;
use crate::state_machine::{StateMachineModel, TransitionAnalyzer, reference_model};
use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Observation-state transition graph CLI
#[derive(Parser, Debug)]
#[command(name = "obsstate-graph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model schema file (TOML or JSON); defaults to the reference catalog
    #[arg(short, long, global = true, env = "OBSSTATE_MODEL")]
    pub model: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every transition, numbered in declaration order
    Transitions {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print the source x target transition matrix as markdown
    Matrix,

    /// Show the transitions leaving a state
    Outgoing {
        /// State name
        state: String,

        /// Keep parallel transitions instead of one entry per target
        #[arg(long)]
        all: bool,
    },

    /// Show the transitions entering a state
    Incoming {
        /// State name
        state: String,

        /// Keep parallel transitions instead of one entry per source
        #[arg(long)]
        all: bool,
    },

    /// List every two-hop path that does not return to its origin
    Paths {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List command and event trigger labels
    Triggers,

    /// Check an observed transition against the model
    Check {
        /// State before the change
        previous: String,

        /// Trigger label (command or event)
        trigger: String,

        /// State after the change
        next: String,
    },

    /// Find the shortest path between two states
    Path {
        /// Starting state
        from: String,

        /// Goal state
        to: String,

        /// Print the command/wait steps, avoiding fault transitions
        #[arg(long)]
        steps: bool,
    },

    /// Summarise the model structure
    Report {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Export the model as Graphviz DOT
    Dot {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the model as a schema file (format from the extension)
    Export {
        /// Destination file
        output: PathBuf,
    },

    /// Validate a schema file
    SchemaValidate {
        /// Path to schema file
        schema: PathBuf,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text table
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    /// Explicit flag first, then the configured default
    pub fn resolve(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
        flag.unwrap_or_else(|| {
            OutputFormat::from_str(&config.default.format, true).unwrap_or(OutputFormat::Table)
        })
    }
}

/// Model schema to load: `--model`, then `OBSSTATE_MODEL`, then the config file
pub fn model_path(args: &Cli, config: &Config) -> Option<PathBuf> {
    args.model.clone().or_else(|| config.model_path())
}

/// Load the model named on the command line or in the config, falling back
/// to the reference catalog
pub fn load_model(args: &Cli, config: &Config) -> Result<StateMachineModel> {
    match model_path(args, config) {
        Some(path) => {
            tracing::info!("Loading model from {:?}", path);
            ModelSchema::load_model(path)
        }
        None => {
            tracing::debug!("Using reference obsState model");
            reference_model()
        }
    }
}

/// Execute the CLI command
pub fn execute(args: Cli, config: Config) -> Result<()> {
    if let Commands::SchemaValidate { schema } = &args.command {
        return commands::schema_validate::execute(&mut std::io::stdout(), schema);
    }

    let model = load_model(&args, &config)?;
    let analyzer =
        TransitionAnalyzer::new(&model).with_fault_keywords(config.analysis.fault_keywords.clone());
    let mut out = std::io::stdout().lock();

    match args.command {
        Commands::Transitions { format } => {
            commands::transitions(&mut out, &analyzer, OutputFormat::resolve(format, &config))
        }
        Commands::Matrix => commands::matrix(&mut out, &analyzer),
        Commands::Outgoing { state, all } => commands::outgoing(&mut out, &analyzer, &state, all),
        Commands::Incoming { state, all } => commands::incoming(&mut out, &analyzer, &state, all),
        Commands::Paths { format } => {
            commands::paths(&mut out, &analyzer, OutputFormat::resolve(format, &config))
        }
        Commands::Triggers => commands::triggers(&mut out, &analyzer),
        Commands::Check {
            previous,
            trigger,
            next,
        } => commands::check(&mut out, &analyzer, &previous, &trigger, &next),
        Commands::Path { from, to, steps } => {
            commands::path(&mut out, &analyzer, &from, &to, steps)
        }
        Commands::Report { format } => {
            commands::report(&mut out, &analyzer, OutputFormat::resolve(format, &config))
        }
        Commands::Dot { output } => commands::dot(&mut out, &model, output.as_deref()),
        Commands::Export { output } => commands::export(&mut out, &model, &output),
        Commands::SchemaValidate { .. } => unreachable!("handled before the model is loaded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["obsstate-graph", "outgoing", "ABORTING", "--all"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Outgoing { ref state, all: true } if state == "ABORTING"
        ));

        let cli = Cli::try_parse_from([
            "obsstate-graph",
            "--model",
            "csp.toml",
            "check",
            "IDLE",
            "Configure",
            "CONFIGURING",
        ])
        .unwrap();
        assert_eq!(cli.model, Some(PathBuf::from("csp.toml")));
        assert!(matches!(cli.command, Commands::Check { .. }));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["obsstate-graph", "report", "--format", "dot"]).is_err());
    }

    #[test]
    fn test_format_resolution() {
        let mut config = Config::default();
        assert_eq!(OutputFormat::resolve(None, &config), OutputFormat::Table);

        config.default.format = "JSON".to_string();
        assert_eq!(OutputFormat::resolve(None, &config), OutputFormat::Json);
        assert_eq!(
            OutputFormat::resolve(Some(OutputFormat::Table), &config),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_model_path_precedence() {
        let mut config = Config::default();
        config.default.model = Some(PathBuf::from("configured.toml"));

        let mut cli =
            Cli::try_parse_from(["obsstate-graph", "--model", "flag.toml", "matrix"]).unwrap();
        assert_eq!(model_path(&cli, &config), Some(PathBuf::from("flag.toml")));

        cli.model = None;
        assert_eq!(
            model_path(&cli, &config),
            Some(PathBuf::from("configured.toml"))
        );
    }

    #[test]
    fn test_load_reference_model_by_default() {
        let mut cli = Cli::try_parse_from(["obsstate-graph", "matrix"]).unwrap();
        cli.model = None;
        let config = Config::default();

        assert_eq!(model_path(&cli, &config), None);
        let model = load_model(&cli, &config).unwrap();
        assert_eq!(model.states().len(), 14);
        assert_eq!(model.transitions().len(), 50);
    }

    #[test]
    fn test_load_model_names_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[[states]]\nname = \"IDLE\"\nclass = \"power\"\n").unwrap();

        let mut cli = Cli::try_parse_from(["obsstate-graph", "matrix"]).unwrap();
        cli.model = Some(path.clone());
        match load_model(&cli, &Config::default()) {
            Err(crate::Error::SchemaParse { file, .. }) => assert_eq!(file, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

//! Observation-State Transition Graph
//!
//! Models the operational and observation state machine implemented by
//! telescope subsystem controllers (TMC, CSP, SDP, MCCS) and analyzes its
//! transition graph.
//!
//! This library provides functionality for:
//! - Declaring state machine models as insertion-ordered multigraphs
//! - Querying transitions, adjacency, commands/events, self loops and two-hop paths
//! - Rendering transition listings, markdown matrices and DOT graphs
//! - Validating transitions observed on live devices against the model
//! - Loading and saving models as TOML or JSON schema files
//!
//! ```
//! use obsstate_graph::state_machine::{TransitionAnalyzer, reference_model};
//!
//! let model = reference_model().unwrap();
//! let analyzer = TransitionAnalyzer::new(&model);
//! assert!(analyzer.all_commands().contains("AssignResources"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod state_machine;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "obsstate-graph");
    }
}

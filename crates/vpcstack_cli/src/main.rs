//! vpcstack CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Configuration error
//! - 3: Validation failure
//! - 4: Topology error

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vpcstack_config::ConfigError;
use vpcstack_topology::TopologyError;

mod commands;

use commands::validate::ValidationFailed;
use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
    pub const VALIDATION_FAILURE: u8 = 3;
    pub const TOPOLOGY_ERROR: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "vpcstack=debug" } else { "vpcstack=info,warn" };
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = match cli.command {
        Commands::Synth(args) => commands::synth::execute(&cli.environment, args),
        Commands::Validate(args) => commands::validate::execute(&cli.environment, args),
        Commands::List(args) => commands::list::execute(&cli.environment, args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the first typed error in the chain to an exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if cause.is::<ValidationFailed>() {
            return ExitCodes::VALIDATION_FAILURE;
        }
        if cause.is::<ConfigError>() {
            return ExitCodes::CONFIG_ERROR;
        }
        if cause.is::<TopologyError>() {
            return ExitCodes::TOPOLOGY_ERROR;
        }
    }
    ExitCodes::GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_categorize_config_error_through_context() {
        let err = Err::<(), _>(ConfigError::AccountNotFound("nope".to_string()))
            .context("Failed to resolve account")
            .unwrap_err();
        assert_eq!(categorize_error(&err), ExitCodes::CONFIG_ERROR);
    }

    #[test]
    fn test_categorize_topology_error() {
        let err = anyhow::Error::new(TopologyError::MissingNatGateway {
            zone: "a".to_string(),
        });
        assert_eq!(categorize_error(&err), ExitCodes::TOPOLOGY_ERROR);
    }

    #[test]
    fn test_categorize_validation_failure() {
        let err = anyhow::Error::new(ValidationFailed { errors: 2 });
        assert_eq!(categorize_error(&err), ExitCodes::VALIDATION_FAILURE);
    }

    #[test]
    fn test_categorize_other_errors() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }
}

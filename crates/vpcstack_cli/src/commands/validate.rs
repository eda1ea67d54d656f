//! Validate command - Check a network document without building it.

use anyhow::{Context, Result};
use clap::Args;
use thiserror::Error;
use tracing::info;

use vpcstack_config::ConfigValidator;

use super::EnvironmentArgs;

/// Raised when the document has validation errors.
#[derive(Error, Debug)]
#[error("Validation failed with {errors} error(s)")]
pub struct ValidationFailed {
    pub errors: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

pub fn execute(env: &EnvironmentArgs, args: ValidateArgs) -> Result<()> {
    let dir = env.config_directory();
    info!("Validating {}", dir.vpc_file(&env.account, &env.region).display());

    dir.account_id(&env.account)
        .with_context(|| format!("Failed to resolve account '{}'", env.account))?;
    let config = dir
        .vpc_config(&env.account, &env.region)
        .with_context(|| format!("Failed to load network document for {}", env.account))?;

    let result = ConfigValidator::validate(&config);

    println!("Validating VPC '{}' ({})...", config.vpc_name, config.ip_addresses);
    if result.valid {
        println!("   OK  {} subnets checked", config.subnet_count());
    } else {
        println!("   FAILED");
        for error in &result.errors {
            println!("      - {}", error);
        }
    }
    for warning in &result.warnings {
        println!("   WARN  {}", warning);
    }

    let failures = if args.strict {
        result.errors.len() + result.warnings.len()
    } else {
        result.errors.len()
    };
    if failures > 0 {
        return Err(ValidationFailed { errors: failures }.into());
    }

    println!("All validations passed!");
    Ok(())
}

//! CLI command definitions.
//!
//! Every subcommand works on one environment, selected by the global
//! arguments or their environment variables.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use vpcstack_config::ConfigDirectory;

pub mod list;
pub mod synth;
pub mod validate;

/// vpcstack - VPC network topology synthesizer
#[derive(Parser)]
#[command(name = "vpcstack")]
#[command(version, about = "vpcstack - VPC network topology synthesizer")]
#[command(long_about = r#"
vpcstack turns a per-account, per-region network document into a VPC
topology: public, private and data subnet tiers, NAT gateways, route
tables and network ACLs.

COMMANDS:
  synth     → Build the topology and emit a CloudFormation-style template
  validate  → Check the network document without building
  list      → List network documents in the config directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Configuration error
  3 - Validation failure
  4 - Topology error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub environment: EnvironmentArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Selects the deployment environment.
#[derive(Args, Debug, Clone)]
pub struct EnvironmentArgs {
    /// Environment name, used in the stack name
    #[arg(long, env = "ENVIRONMENT_NAME", default_value = "kate", global = true)]
    pub environment: String,

    /// Account name, resolved through the account directory
    #[arg(long, env = "ACCOUNT_NAME", default_value = "sandpit1", global = true)]
    pub account: String,

    /// Target region
    #[arg(long, env = "REGION", default_value = "ap-southeast-2", global = true)]
    pub region: String,

    /// Directory holding aws_account.yaml and the network documents
    #[arg(long, env = "CONFIG_DIR", default_value = "config", global = true)]
    pub config_dir: PathBuf,
}

impl EnvironmentArgs {
    pub fn stack_name(&self) -> String {
        format!("vpc-{}", self.environment)
    }

    pub fn config_directory(&self) -> ConfigDirectory {
        ConfigDirectory::new(&self.config_dir)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the topology and write the template
    Synth(synth::SynthArgs),

    /// Validate the network document
    Validate(validate::ValidateArgs),

    /// List network documents
    List(list::ListArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vpcstack",
            "synth",
            "--environment",
            "dev",
            "--region",
            "us-east-1",
        ])
        .unwrap();

        assert_eq!(cli.environment.environment, "dev");
        assert_eq!(cli.environment.region, "us-east-1");
        assert_eq!(cli.environment.stack_name(), "vpc-dev");
        assert!(matches!(cli.command, Commands::Synth(_)));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["vpcstack"]).is_err());
    }
}

//! Synth command - Build the topology and emit its template.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use vpcstack_config::ConfigValidator;
use vpcstack_engine::{RecordingEngine, StackDescriptor, Template};
use vpcstack_topology::TopologyBuilder;

use super::EnvironmentArgs;

const CREATED_VIA: &str = "vpcstack";

#[derive(Args)]
pub struct SynthArgs {
    /// Write the template to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Value of the `createdby` stack tag
    #[arg(long, env = "CREATED_BY", default_value = "vpcstack")]
    pub created_by: String,

    /// Value of the `repo` stack tag
    #[arg(long, env = "REPO_URL", default_value = "https://github.com/vpcstack/vpcstack")]
    pub repo: String,
}

pub fn execute(env: &EnvironmentArgs, args: SynthArgs) -> Result<()> {
    let template = synthesize(env, &args)?;

    match &args.output {
        Some(path) => {
            template
                .write_to(path)
                .with_context(|| format!("Failed to write template to {}", path.display()))?;
            println!(
                "Synthesized {} resources for stack {} into {}",
                template.resources.len(),
                template.metadata.stack_name,
                path.display()
            );
        }
        None => println!("{}", template.to_json_pretty()?),
    }

    Ok(())
}

/// Resolve the environment, build it into a recording engine and render it.
pub fn synthesize(env: &EnvironmentArgs, args: &SynthArgs) -> Result<Template> {
    let dir = env.config_directory();
    let stack_name = env.stack_name();
    info!(
        "Synthesizing stack {} for account {} in {}",
        stack_name, env.account, env.region
    );

    let account_id = dir
        .account_id(&env.account)
        .with_context(|| format!("Failed to resolve account '{}'", env.account))?;
    let config = dir
        .vpc_config(&env.account, &env.region)
        .with_context(|| format!("Failed to load network document for {}", env.account))?;

    for warning in ConfigValidator::validate(&config).warnings {
        warn!("{}", warning);
    }

    let mut engine = RecordingEngine::new();
    let topology = TopologyBuilder::new(&stack_name, &env.region)
        .build(&mut engine, &config)
        .with_context(|| format!("Failed to build VPC '{}'", config.vpc_name))?;
    info!(
        "Built {} subnets and {} NAT gateways",
        topology.subnets().count(),
        topology.nat_gateway_count()
    );

    engine.tag_stack("createdby", &args.created_by);
    engine.tag_stack("createdvia", CREATED_VIA);
    engine.tag_stack("environment", &env.environment);
    engine.tag_stack("repo", &args.repo);

    let stack = StackDescriptor::new(&stack_name, &env.region)
        .with_account(account_id)
        .with_description(format!("VPC {} for environment {}", config.vpc_name, env.environment));

    Ok(engine.into_template(stack)?)
}

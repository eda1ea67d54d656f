//! List command - Show the network documents in a config directory.

use anyhow::{Context, Result};
use clap::Args;

use super::EnvironmentArgs;

#[derive(Args)]
pub struct ListArgs {
    /// Only show documents for this account
    #[arg(long)]
    pub only_account: Option<String>,
}

pub fn execute(env: &EnvironmentArgs, args: ListArgs) -> Result<()> {
    let dir = env.config_directory();
    let documents = dir
        .environments()
        .with_context(|| format!("Failed to list {}", dir.root().display()))?;
    let accounts = dir.accounts().ok();

    let documents: Vec<_> = documents
        .into_iter()
        .filter(|d| args.only_account.as_deref().map_or(true, |a| a == d.account))
        .collect();

    if documents.is_empty() {
        println!("No network documents found in {}", dir.root().display());
        return Ok(());
    }

    for document in &documents {
        let selected = document.account == env.account && document.region == env.region;
        let account_id = accounts
            .as_ref()
            .and_then(|a| a.account_id(&document.account).ok())
            .unwrap_or("unknown");
        println!(
            "{} {:<16} {:<16} {:<14} {}",
            if selected { "*" } else { " " },
            document.account,
            document.region,
            account_id,
            document.path.display()
        );
    }

    Ok(())
}

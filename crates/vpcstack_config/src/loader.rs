//! File-backed configuration loading.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ConfigError, ConfigResult};
use crate::models::{AwsAccount, VpcConfig};
use crate::ACCOUNT_FILE;

/// `{account}-{region}.yaml`, where the region looks like `ap-southeast-2`.
const ENVIRONMENT_FILE_PATTERN: &str = r"^(?P<account>.+)-(?P<region>[a-z]{2}(?:-[a-z]+)+-\d+)\.yaml$";

impl VpcConfig {
    /// Load `{config_dir}/{account}-{region}.yaml`.
    pub fn load(config_dir: impl Into<PathBuf>, account: &str, region: &str) -> ConfigResult<Self> {
        ConfigDirectory::new(config_dir).vpc_config(account, region)
    }
}

/// Parsed account directory.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Vec<AwsAccount>,
}

impl AccountDirectory {
    pub fn new(accounts: Vec<AwsAccount>) -> Self {
        Self { accounts }
    }

    /// Load the account directory from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let accounts: Vec<AwsAccount> = read_yaml(path.as_ref())?;
        debug!("Loaded {} accounts from {:?}", accounts.len(), path.as_ref());
        Ok(Self { accounts })
    }

    /// Resolve an account name to its account id.
    pub fn account_id(&self, name: &str) -> ConfigResult<&str> {
        self.accounts
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.account_id.as_str())
            .ok_or_else(|| ConfigError::AccountNotFound(name.to_string()))
    }

    pub fn accounts(&self) -> &[AwsAccount] {
        &self.accounts
    }
}

/// A per-environment network document found in a config directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDocument {
    pub account: String,
    pub region: String,
    pub path: PathBuf,
}

/// Directory holding the account directory and network documents.
#[derive(Debug, Clone)]
pub struct ConfigDirectory {
    root: PathBuf,
}

impl ConfigDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn account_file(&self) -> PathBuf {
        self.root.join(ACCOUNT_FILE)
    }

    /// Path of the network document for `account` in `region`.
    pub fn vpc_file(&self, account: &str, region: &str) -> PathBuf {
        self.root.join(format!("{}-{}.yaml", account, region))
    }

    pub fn accounts(&self) -> ConfigResult<AccountDirectory> {
        AccountDirectory::load(self.account_file())
    }

    /// Resolve an account name through the account directory.
    pub fn account_id(&self, account: &str) -> ConfigResult<String> {
        let accounts = self.accounts()?;
        accounts.account_id(account).map(str::to_string)
    }

    /// Load the network document for `account` in `region`.
    pub fn vpc_config(&self, account: &str, region: &str) -> ConfigResult<VpcConfig> {
        let path = self.vpc_file(account, region);
        let config: VpcConfig = read_yaml(&path)?;
        debug!(
            "Loaded VPC config '{}' with {} subnets from {:?}",
            config.vpc_name,
            config.subnet_count(),
            path
        );
        Ok(config)
    }

    /// List network documents, sorted by account then region.
    pub fn environments(&self) -> ConfigResult<Vec<EnvironmentDocument>> {
        if !self.root.is_dir() {
            return Err(ConfigError::DirectoryNotFound(self.root.clone()));
        }

        let pattern = Regex::new(ENVIRONMENT_FILE_PATTERN)?;

        let mut documents: Vec<EnvironmentDocument> = WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                let captures = pattern.captures(&name)?;
                Some(EnvironmentDocument {
                    account: captures["account"].to_string(),
                    region: captures["region"].to_string(),
                    path: e.path().to_path_buf(),
                })
            })
            .collect();

        documents.sort_by(|a, b| (&a.account, &a.region).cmp(&(&b.account, &b.region)));
        Ok(documents)
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailure {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseFailure {
        path: path.to_path_buf(),
        source,
    })
}

//! # vpcstack_config
//!
//! Configuration documents consumed by the vpcstack topology builder.
//!
//! Two YAML documents live in a config directory:
//!
//! - `aws_account.yaml`: list of `{name, account_id}` records
//! - `{account}-{region}.yaml`: one network declaration per environment
//!
//! ## Example
//!
//! ```rust,no_run
//! use vpcstack_config::{ConfigDirectory, ConfigValidator};
//!
//! let dir = ConfigDirectory::new("config");
//! let account_id = dir.account_id("sandpit1").unwrap();
//! let config = dir.vpc_config("sandpit1", "ap-southeast-2").unwrap();
//!
//! let result = ConfigValidator::validate(&config);
//! assert!(result.valid, "{:?}", result.errors);
//! # let _ = account_id;
//! ```

pub mod error;
pub mod loader;
pub mod models;
pub mod validator;

pub use error::{ConfigError, ConfigResult};
pub use loader::{AccountDirectory, ConfigDirectory, EnvironmentDocument};
pub use models::{
    AclIcmp, AwsAccount, NaclRule, RuleAction, SubnetConfig, TrafficDirection, VpcConfig,
    SUPPORTED_PROTOCOL_CODES,
};
pub use validator::{ConfigValidator, ValidationResult};

/// File name of the account directory inside a config directory.
pub const ACCOUNT_FILE: &str = "aws_account.yaml";

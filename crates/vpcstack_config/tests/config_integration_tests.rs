//! Integration tests for file-backed configuration.

use std::fs;

use tempfile::tempdir;
use vpcstack_config::{ConfigDirectory, ConfigError, ConfigValidator, ACCOUNT_FILE};

const ACCOUNTS: &str = r#"
- name: sandpit1
  account_id: "123456789012"
- name: prod
  account_id: "210987654321"
"#;

const NETWORK: &str = r#"
vpcName: sandpit
ipAddresses: 10.10.0.0/16
enable_per_az_nat_gateway: false
publicSubnets:
  - availabilityZone: a
    ipAddress: 10.10.0.0/24
    mapPublicIpOnLaunch: true
  - availabilityZone: b
    ipAddress: 10.10.1.0/24
privateSubnets:
  - availabilityZone: a
    ipAddress: 10.10.10.0/24
dataSubnets:
  - availabilityZone: a
    ipAddress: 10.10.20.0/24
publicSubnetNACLs:
  - ruleNumber: 100
    ruleAction: allow
    isIpV4Block: true
    cidrBlock: 0.0.0.0/0
    protocol: "6"
    startPort: 443
    endPort: 443
    direction: ingress
privateSubnetNACLs:
  - ruleNumber: 100
    ruleAction: allow
    isIpV4Block: true
    cidrBlock: 10.10.0.0/16
    protocol: "-1"
    direction: ingress
dataSubnetNACLs:
  - ruleNumber: 100
    ruleAction: allow
    isIpV4Block: true
    cidrBlock: 10.10.10.0/24
    protocol: "6"
    startPort: 5432
    endPort: 5432
    direction: ingress
"#;

fn config_dir() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join(ACCOUNT_FILE), ACCOUNTS).unwrap();
    fs::write(dir.path().join("sandpit1-ap-southeast-2.yaml"), NETWORK).unwrap();
    fs::write(dir.path().join("prod-us-east-1.yaml"), NETWORK).unwrap();
    fs::write(dir.path().join("staging-us-west-2.yml"), NETWORK).unwrap();
    fs::write(dir.path().join("README.md"), "not a config").unwrap();
    dir
}

#[test]
fn test_load_account_and_network() {
    let temp = config_dir();
    let dir = ConfigDirectory::new(temp.path());

    assert_eq!(dir.account_id("sandpit1").unwrap(), "123456789012");

    let config = dir.vpc_config("sandpit1", "ap-southeast-2").unwrap();
    assert_eq!(config.vpc_name, "sandpit");
    assert_eq!(config.public_subnets.len(), 2);
    assert_eq!(config.data_subnet_nacls[0].start_port, Some(5432));

    let result = ConfigValidator::validate(&config);
    assert!(result.valid, "{:?}", result.errors);
}

#[test]
fn test_unknown_account() {
    let temp = config_dir();
    let dir = ConfigDirectory::new(temp.path());

    let err = dir.account_id("staging").unwrap_err();
    assert!(matches!(err, ConfigError::AccountNotFound(ref name) if name == "staging"));
    assert!(!err.is_read_failure());
}

#[test]
fn test_missing_document_is_read_failure() {
    let temp = config_dir();
    let dir = ConfigDirectory::new(temp.path());

    let err = dir.vpc_config("sandpit1", "eu-west-1").unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailure { .. }));
    assert!(err.is_read_failure());
    assert!(err.to_string().contains("sandpit1-eu-west-1.yaml"));
}

#[test]
fn test_malformed_document_is_parse_failure() {
    let temp = config_dir();
    fs::write(temp.path().join("broken-ap-southeast-2.yaml"), "vpcName: [unterminated").unwrap();
    let dir = ConfigDirectory::new(temp.path());

    let err = dir.vpc_config("broken", "ap-southeast-2").unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailure { .. }));
    assert!(err.is_read_failure());
}

#[test]
fn test_list_environments() {
    let temp = config_dir();
    let dir = ConfigDirectory::new(temp.path());

    let environments = dir.environments().unwrap();
    let pairs: Vec<(&str, &str)> = environments
        .iter()
        .map(|e| (e.account.as_str(), e.region.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("prod", "us-east-1"), ("sandpit1", "ap-southeast-2")]
    );
}

#[test]
fn test_listed_environments_are_loadable() {
    let temp = config_dir();
    let dir = ConfigDirectory::new(temp.path());

    let environments = dir.environments().unwrap();
    assert!(environments.iter().all(|e| e.path.extension().unwrap() == "yaml"));
    for env in &environments {
        assert_eq!(dir.vpc_file(&env.account, &env.region), env.path);
        dir.vpc_config(&env.account, &env.region).unwrap();
    }
}

#[test]
fn test_list_environments_missing_directory() {
    let temp = tempdir().unwrap();
    let dir = ConfigDirectory::new(temp.path().join("nope"));
    assert!(matches!(
        dir.environments(),
        Err(ConfigError::DirectoryNotFound(_))
    ));
}

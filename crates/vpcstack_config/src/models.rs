//! Data models for network configuration documents.

use serde::{Deserialize, Deserializer, Serialize};

/// Protocol codes a NACL rule may reference.
///
/// `-1` all traffic, `1` ICMP, `6` TCP, `17` UDP, `53` ICMPv6.
pub const SUPPORTED_PROTOCOL_CODES: [&str; 5] = ["-1", "1", "6", "17", "53"];

/// One record of the account directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsAccount {
    pub name: String,
    pub account_id: String,
}

/// One subnet declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetConfig {
    /// Zone suffix within the region, e.g. `a`.
    pub availability_zone: String,
    /// Subnet CIDR block.
    pub ip_address: String,
    /// Only honoured for public subnets.
    #[serde(default)]
    pub map_public_ip_on_launch: bool,
}

impl SubnetConfig {
    pub fn new(availability_zone: impl Into<String>, ip_address: impl Into<String>) -> Self {
        Self {
            availability_zone: availability_zone.into(),
            ip_address: ip_address.into(),
            map_public_ip_on_launch: false,
        }
    }

    pub fn with_public_ip_on_launch(mut self, enabled: bool) -> Self {
        self.map_public_ip_on_launch = enabled;
        self
    }

    /// Lower-cased zone suffix, used as the key for zone-scoped resources.
    pub fn zone_key(&self) -> String {
        self.availability_zone.to_lowercase()
    }

    /// Full availability zone name in `region`.
    pub fn availability_zone_in(&self, region: &str) -> String {
        format!("{}{}", region, self.zone_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficDirection {
    Ingress,
    Egress,
}

impl TrafficDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficDirection::Ingress => "ingress",
            TrafficDirection::Egress => "egress",
        }
    }
}

impl std::fmt::Display for TrafficDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ICMP type/code selector. `-1` matches any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclIcmp {
    #[serde(rename = "type", default = "any_icmp")]
    pub icmp_type: i32,
    #[serde(default = "any_icmp")]
    pub code: i32,
}

impl AclIcmp {
    pub fn any() -> Self {
        Self {
            icmp_type: -1,
            code: -1,
        }
    }
}

impl Default for AclIcmp {
    fn default() -> Self {
        Self::any()
    }
}

fn any_icmp() -> i32 {
    -1
}

/// One network ACL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaclRule {
    pub rule_number: u32,
    pub rule_action: RuleAction,
    pub is_ip_v4_block: bool,
    pub cidr_block: String,
    /// Raw protocol code, checked when the ACL is built.
    #[serde(deserialize_with = "protocol_code")]
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icmp: Option<AclIcmp>,
    pub direction: TrafficDirection,
}

impl NaclRule {
    /// Rule matching a TCP port range from an IPv4 block.
    pub fn tcp(
        rule_number: u32,
        action: RuleAction,
        direction: TrafficDirection,
        cidr_block: impl Into<String>,
        start_port: u16,
        end_port: u16,
    ) -> Self {
        Self {
            rule_number,
            rule_action: action,
            is_ip_v4_block: true,
            cidr_block: cidr_block.into(),
            protocol: "6".to_string(),
            start_port: Some(start_port),
            end_port: Some(end_port),
            icmp: None,
            direction,
        }
    }

    /// Rule matching all traffic from an IPv4 block.
    pub fn all_traffic(
        rule_number: u32,
        action: RuleAction,
        direction: TrafficDirection,
        cidr_block: impl Into<String>,
    ) -> Self {
        Self {
            rule_number,
            rule_action: action,
            is_ip_v4_block: true,
            cidr_block: cidr_block.into(),
            protocol: "-1".to_string(),
            start_port: None,
            end_port: None,
            icmp: None,
            direction,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_ipv6_block(mut self, cidr_block: impl Into<String>) -> Self {
        self.is_ip_v4_block = false;
        self.cidr_block = cidr_block.into();
        self
    }
}

/// Accept protocol codes written as YAML strings or integers.
fn protocol_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Text(String),
        Number(i64),
    }

    Ok(match RawCode::deserialize(deserializer)? {
        RawCode::Text(s) => s.trim().to_string(),
        RawCode::Number(n) => n.to_string(),
    })
}

/// Full declaration of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpcConfig {
    pub vpc_name: String,
    /// Primary CIDR block of the network.
    pub ip_addresses: String,
    #[serde(rename = "enable_per_az_nat_gateway", default)]
    pub enable_per_az_nat_gateway: bool,
    #[serde(default)]
    pub public_subnets: Vec<SubnetConfig>,
    #[serde(default)]
    pub private_subnets: Vec<SubnetConfig>,
    #[serde(default)]
    pub data_subnets: Vec<SubnetConfig>,
    #[serde(rename = "publicSubnetNACLs", default)]
    pub public_subnet_nacls: Vec<NaclRule>,
    #[serde(rename = "privateSubnetNACLs", default)]
    pub private_subnet_nacls: Vec<NaclRule>,
    #[serde(rename = "dataSubnetNACLs", default)]
    pub data_subnet_nacls: Vec<NaclRule>,
}

impl VpcConfig {
    pub fn new(vpc_name: impl Into<String>, ip_addresses: impl Into<String>) -> Self {
        Self {
            vpc_name: vpc_name.into(),
            ip_addresses: ip_addresses.into(),
            enable_per_az_nat_gateway: false,
            public_subnets: Vec::new(),
            private_subnets: Vec::new(),
            data_subnets: Vec::new(),
            public_subnet_nacls: Vec::new(),
            private_subnet_nacls: Vec::new(),
            data_subnet_nacls: Vec::new(),
        }
    }

    pub fn with_per_az_nat_gateway(mut self, enabled: bool) -> Self {
        self.enable_per_az_nat_gateway = enabled;
        self
    }

    pub fn with_public_subnet(mut self, subnet: SubnetConfig) -> Self {
        self.public_subnets.push(subnet);
        self
    }

    pub fn with_private_subnet(mut self, subnet: SubnetConfig) -> Self {
        self.private_subnets.push(subnet);
        self
    }

    pub fn with_data_subnet(mut self, subnet: SubnetConfig) -> Self {
        self.data_subnets.push(subnet);
        self
    }

    pub fn with_public_nacl(mut self, rule: NaclRule) -> Self {
        self.public_subnet_nacls.push(rule);
        self
    }

    pub fn with_private_nacl(mut self, rule: NaclRule) -> Self {
        self.private_subnet_nacls.push(rule);
        self
    }

    pub fn with_data_nacl(mut self, rule: NaclRule) -> Self {
        self.data_subnet_nacls.push(rule);
        self
    }

    /// Parse a network document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn subnet_count(&self) -> usize {
        self.public_subnets.len() + self.private_subnets.len() + self.data_subnets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
vpcName: sandpit
ipAddresses: 10.0.0.0/16
enable_per_az_nat_gateway: true
publicSubnets:
  - availabilityZone: A
    ipAddress: 10.0.0.0/24
    mapPublicIpOnLaunch: true
privateSubnets:
  - availabilityZone: a
    ipAddress: 10.0.1.0/24
publicSubnetNACLs:
  - ruleNumber: 100
    ruleAction: allow
    isIpV4Block: true
    cidrBlock: 0.0.0.0/0
    protocol: "6"
    startPort: 443
    endPort: 443
    direction: ingress
  - ruleNumber: 110
    ruleAction: deny
    isIpV4Block: false
    cidrBlock: "::/0"
    protocol: 1
    icmp:
      type: 8
    direction: egress
"#;

    #[test]
    fn test_parse_document() {
        let config = VpcConfig::from_yaml(DOCUMENT).unwrap();

        assert_eq!(config.vpc_name, "sandpit");
        assert!(config.enable_per_az_nat_gateway);
        assert_eq!(config.public_subnets.len(), 1);
        assert!(config.public_subnets[0].map_public_ip_on_launch);
        assert!(!config.private_subnets[0].map_public_ip_on_launch);
        assert!(config.data_subnets.is_empty());
        assert!(config.data_subnet_nacls.is_empty());
        assert_eq!(config.subnet_count(), 2);
    }

    #[test]
    fn test_parse_rules() {
        let config = VpcConfig::from_yaml(DOCUMENT).unwrap();
        let rules = &config.public_subnet_nacls;

        assert_eq!(
            rules[0],
            NaclRule::tcp(
                100,
                RuleAction::Allow,
                TrafficDirection::Ingress,
                "0.0.0.0/0",
                443,
                443
            )
        );
        assert_eq!(rules[1].protocol, "1");
        assert_eq!(rules[1].rule_action, RuleAction::Deny);
        assert!(!rules[1].is_ip_v4_block);
        assert_eq!(
            rules[1].icmp,
            Some(AclIcmp {
                icmp_type: 8,
                code: -1
            })
        );
    }

    #[test]
    fn test_unknown_direction_rejected() {
        let yaml = r#"
vpcName: x
ipAddresses: 10.0.0.0/16
dataSubnetNACLs:
  - ruleNumber: 1
    ruleAction: allow
    isIpV4Block: true
    cidrBlock: 0.0.0.0/0
    protocol: "-1"
    direction: sideways
"#;
        assert!(VpcConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zone_helpers() {
        let subnet = SubnetConfig::new("B", "10.0.2.0/24");
        assert_eq!(subnet.zone_key(), "b");
        assert_eq!(subnet.availability_zone_in("ap-southeast-2"), "ap-southeast-2b");
    }
}

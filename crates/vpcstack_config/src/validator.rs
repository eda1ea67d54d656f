//! Static checks on a network declaration.
//!
//! The topology builder fails fast on the first bad input. The validator
//! instead collects every problem it can find so they can be fixed in one pass.

use std::collections::HashSet;

use ipnet::IpNet;

use crate::models::{NaclRule, SubnetConfig, VpcConfig, SUPPORTED_PROTOCOL_CODES};

/// Highest rule number a network ACL entry may use.
pub const MAX_RULE_NUMBER: u32 = 32766;

/// Validation result with details.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validator for network declarations.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run every check against a configuration.
    pub fn validate(config: &VpcConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.vpc_name.trim().is_empty() {
            result.add_error("vpcName cannot be empty");
        }

        let primary = match config.ip_addresses.parse::<IpNet>() {
            Ok(net) => Some(net),
            Err(_) => {
                result.add_error(format!(
                    "ipAddresses '{}' is not a valid CIDR block",
                    config.ip_addresses
                ));
                None
            }
        };

        let tiers = [
            ("public", &config.public_subnets, &config.public_subnet_nacls),
            ("private", &config.private_subnets, &config.private_subnet_nacls),
            ("data", &config.data_subnets, &config.data_subnet_nacls),
        ];

        for (tier, subnets, rules) in tiers {
            result.merge(Self::validate_subnets(tier, subnets, primary.as_ref()));
            result.merge(Self::validate_rules(tier, rules));
            if !subnets.is_empty() && rules.is_empty() {
                result.add_warning(format!(
                    "{} subnets have an empty NACL rule list; all traffic will be denied",
                    tier
                ));
            }
        }

        result.merge(Self::validate_overlaps(config));
        result.merge(Self::validate_nat_coverage(config));

        result
    }

    /// Validate one tier's subnet declarations.
    pub fn validate_subnets(
        tier: &str,
        subnets: &[SubnetConfig],
        primary: Option<&IpNet>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut zones = HashSet::new();

        for subnet in subnets {
            if subnet.availability_zone.trim().is_empty() {
                result.add_error(format!(
                    "{} subnet {} has no availability zone",
                    tier, subnet.ip_address
                ));
            } else if !zones.insert(subnet.zone_key()) {
                result.add_error(format!(
                    "{} tier declares zone '{}' more than once",
                    tier, subnet.availability_zone
                ));
            }

            match subnet.ip_address.parse::<IpNet>() {
                Ok(net) => {
                    if let Some(primary) = primary {
                        if !primary.contains(&net) {
                            result.add_error(format!(
                                "{} subnet {} is outside the VPC block {}",
                                tier, net, primary
                            ));
                        }
                    }
                }
                Err(_) => result.add_error(format!(
                    "{} subnet '{}' is not a valid CIDR block",
                    tier, subnet.ip_address
                )),
            }

            if tier != "public" && subnet.map_public_ip_on_launch {
                result.add_warning(format!(
                    "mapPublicIpOnLaunch is ignored for {} subnet {}",
                    tier, subnet.ip_address
                ));
            }
        }

        result
    }

    /// Validate one tier's NACL rule list.
    pub fn validate_rules(tier: &str, rules: &[NaclRule]) -> ValidationResult {
        let mut result = ValidationResult::new();
        let mut seen = HashSet::new();

        for rule in rules {
            let label = format!("{} NACL rule {} ({})", tier, rule.rule_number, rule.direction);

            if rule.rule_number == 0 || rule.rule_number > MAX_RULE_NUMBER {
                result.add_error(format!(
                    "{}: rule number must be between 1 and {}",
                    label, MAX_RULE_NUMBER
                ));
            }

            if !seen.insert((rule.direction, rule.rule_number)) {
                result.add_error(format!("{}: duplicate rule number", label));
            }

            match rule.protocol.as_str() {
                "6" | "17" => match (rule.start_port, rule.end_port) {
                    (Some(start), Some(end)) if start > end => result.add_error(format!(
                        "{}: start port {} is greater than end port {}",
                        label, start, end
                    )),
                    (Some(_), Some(_)) => {}
                    _ => result.add_error(format!("{}: TCP/UDP rules need startPort and endPort", label)),
                },
                code if !SUPPORTED_PROTOCOL_CODES.contains(&code) => result.add_error(format!(
                    "{}: unsupported protocol '{}', expected one of {:?}",
                    label, code, SUPPORTED_PROTOCOL_CODES
                )),
                _ => {}
            }

            if rule.icmp.is_some() && !matches!(rule.protocol.as_str(), "1" | "53") {
                result.add_warning(format!("{}: icmp is ignored for protocol {}", label, rule.protocol));
            }

            match rule.cidr_block.parse::<IpNet>() {
                Ok(IpNet::V4(_)) if !rule.is_ip_v4_block => result.add_error(format!(
                    "{}: {} is IPv4 but isIpV4Block is false",
                    label, rule.cidr_block
                )),
                Ok(IpNet::V6(_)) if rule.is_ip_v4_block => result.add_error(format!(
                    "{}: {} is IPv6 but isIpV4Block is true",
                    label, rule.cidr_block
                )),
                Ok(_) => {}
                Err(_) => result.add_error(format!(
                    "{}: '{}' is not a valid CIDR block",
                    label, rule.cidr_block
                )),
            }
        }

        result
    }

    /// Subnet blocks must not overlap, across all tiers.
    pub fn validate_overlaps(config: &VpcConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        let nets: Vec<IpNet> = config
            .public_subnets
            .iter()
            .chain(&config.private_subnets)
            .chain(&config.data_subnets)
            .filter_map(|s| s.ip_address.parse::<IpNet>().ok())
            .collect();

        for (i, a) in nets.iter().enumerate() {
            for b in &nets[i + 1..] {
                if a.contains(&b.network()) || b.contains(&a.network()) {
                    result.add_error(format!("Subnet blocks {} and {} overlap", a, b));
                }
            }
        }

        result
    }

    /// Every private subnet needs a NAT gateway to route through.
    pub fn validate_nat_coverage(config: &VpcConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.private_subnets.is_empty() {
            return result;
        }

        if config.public_subnets.is_empty() {
            result.add_error(
                "Private subnets are declared but there are no public subnets to host a NAT gateway",
            );
            return result;
        }

        if config.enable_per_az_nat_gateway {
            let public_zones: HashSet<String> =
                config.public_subnets.iter().map(|s| s.zone_key()).collect();
            for subnet in &config.private_subnets {
                if !public_zones.contains(&subnet.zone_key()) {
                    result.add_warning(format!(
                        "Private subnet in zone '{}' has no public subnet in the same zone; \
                         it will route through the shared NAT gateway in another zone",
                        subnet.availability_zone
                    ));
                }
            }
        }

        result
    }
}

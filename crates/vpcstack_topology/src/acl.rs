//! Network ACL construction.

use tracing::debug;

use vpcstack_config::{AclIcmp, NaclRule, RuleAction, TrafficDirection};
use vpcstack_engine::{
    AclAction, IcmpTypeCode, NetworkAclEntryProps, NetworkAclProps, PortRange, ProvisioningEngine,
    Resource, ResourceHandle, SubnetNetworkAclAssociationProps,
};

use crate::context::NetworkContext;
use crate::error::{TopologyError, TopologyResult};

/// Traffic matched by one ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclTraffic {
    TcpPortRange { from: u16, to: u16 },
    UdpPortRange { from: u16, to: u16 },
    Icmp(AclIcmp),
    Icmpv6(AclIcmp),
    AllTraffic,
}

impl AclTraffic {
    /// IANA protocol number written to the entry.
    pub fn protocol_number(&self) -> i32 {
        match self {
            AclTraffic::TcpPortRange { .. } => 6,
            AclTraffic::UdpPortRange { .. } => 17,
            AclTraffic::Icmp(_) => 1,
            AclTraffic::Icmpv6(_) => 58,
            AclTraffic::AllTraffic => -1,
        }
    }

    pub fn port_range(&self) -> Option<PortRange> {
        match *self {
            AclTraffic::TcpPortRange { from, to } | AclTraffic::UdpPortRange { from, to } => {
                Some(PortRange { from, to })
            }
            _ => None,
        }
    }

    pub fn icmp(&self) -> Option<IcmpTypeCode> {
        match self {
            AclTraffic::Icmp(icmp) | AclTraffic::Icmpv6(icmp) => Some(IcmpTypeCode {
                icmp_type: icmp.icmp_type,
                code: icmp.code,
            }),
            _ => None,
        }
    }
}

/// Maps rule protocol codes to traffic matchers.
pub struct AclTrafficResolver;

impl AclTrafficResolver {
    /// Resolve a protocol code plus optional ports or ICMP selector.
    ///
    /// `6`/`17` need both ports, `1`/`53` default to any type and code,
    /// `-1` ignores ports and ICMP. Anything else is rejected.
    pub fn resolve(
        protocol: &str,
        start_port: Option<u16>,
        end_port: Option<u16>,
        icmp: Option<AclIcmp>,
    ) -> TopologyResult<AclTraffic> {
        let ports = || match (start_port, end_port) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(TopologyError::MissingPortRange {
                protocol: protocol.to_string(),
            }),
        };

        match protocol {
            "6" => ports().map(|(from, to)| AclTraffic::TcpPortRange { from, to }),
            "17" => ports().map(|(from, to)| AclTraffic::UdpPortRange { from, to }),
            "1" => Ok(AclTraffic::Icmp(icmp.unwrap_or_default())),
            "53" => Ok(AclTraffic::Icmpv6(icmp.unwrap_or_default())),
            "-1" => Ok(AclTraffic::AllTraffic),
            other => Err(TopologyError::InvalidProtocol {
                protocol: other.to_string(),
            }),
        }
    }

    pub fn resolve_rule(rule: &NaclRule) -> TopologyResult<AclTraffic> {
        Self::resolve(&rule.protocol, rule.start_port, rule.end_port, rule.icmp)
    }
}

/// A declared, tier-scoped network ACL.
#[derive(Debug, Clone)]
pub struct NetworkAcl {
    name: String,
    handle: ResourceHandle,
    entries: Vec<ResourceHandle>,
}

impl NetworkAcl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Entry handles in rule-list order.
    pub fn entries(&self) -> &[ResourceHandle] {
        &self.entries
    }

    /// Bind a subnet to this ACL under `group_id`.
    pub fn associate_with_subnet<E>(
        &self,
        engine: &mut E,
        group_id: &str,
        subnet: &ResourceHandle,
    ) -> TopologyResult<ResourceHandle>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let declared = engine.declare(
            &format!("{}/{}", self.name, group_id),
            Resource::SubnetNetworkAclAssociation(SubnetNetworkAclAssociationProps {
                network_acl_id: self.handle.reference(),
                subnet_id: subnet.reference(),
            }),
        )?;
        Ok(declared.handle)
    }
}

/// Builds one ACL per tier from an ordered rule list.
pub struct NetworkAclBuilder<'a> {
    ctx: &'a NetworkContext,
}

impl<'a> NetworkAclBuilder<'a> {
    pub fn new(ctx: &'a NetworkContext) -> Self {
        Self { ctx }
    }

    /// Declare the ACL `name` and one entry per rule, in list order.
    ///
    /// Every rule's traffic is resolved before anything is declared, so a bad
    /// protocol leaves no partial ACL behind.
    pub fn build<E>(&self, engine: &mut E, name: &str, rules: &[NaclRule]) -> TopologyResult<NetworkAcl>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let resolved = rules
            .iter()
            .map(|rule| AclTrafficResolver::resolve_rule(rule).map(|traffic| (rule, traffic)))
            .collect::<TopologyResult<Vec<_>>>()?;

        let handle = engine
            .declare(
                name,
                Resource::NetworkAcl(NetworkAclProps {
                    vpc_id: self.ctx.vpc.reference(),
                }),
            )?
            .handle;
        engine.tag(&handle, "Name", name)?;

        let mut entries = Vec::with_capacity(resolved.len());
        for (rule, traffic) in resolved {
            let entry_id = format!(
                "{}/{}-{}-{}",
                name, self.ctx.stack_name, rule.direction, rule.rule_number
            );
            let (cidr_block, ipv6_cidr_block) = if rule.is_ip_v4_block {
                (Some(rule.cidr_block.clone()), None)
            } else {
                (None, Some(rule.cidr_block.clone()))
            };

            let entry = engine.declare(
                &entry_id,
                Resource::NetworkAclEntry(NetworkAclEntryProps {
                    network_acl_id: handle.reference(),
                    rule_number: rule.rule_number,
                    rule_action: match rule.rule_action {
                        RuleAction::Allow => AclAction::Allow,
                        RuleAction::Deny => AclAction::Deny,
                    },
                    egress: rule.direction == TrafficDirection::Egress,
                    cidr_block,
                    ipv6_cidr_block,
                    protocol: traffic.protocol_number(),
                    port_range: traffic.port_range(),
                    icmp: traffic.icmp(),
                }),
            )?;
            entries.push(entry.handle);
        }

        debug!("Built ACL {} with {} entries", name, entries.len());
        Ok(NetworkAcl {
            name: name.to_string(),
            handle,
            entries,
        })
    }
}

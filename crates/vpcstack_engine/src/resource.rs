//! Typed resource declarations.
//!
//! Every declaration serializes to the `{"Type": ..., "Properties": ...}` shape
//! used by CloudFormation-style templates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Pointer from one declaration to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reference {
    /// The target's primary identifier.
    #[serde(rename = "Ref")]
    Ref(String),
    /// A named attribute of the target.
    #[serde(rename = "Fn::GetAtt")]
    GetAtt(String, String),
}

impl Reference {
    /// Logical id of the referenced resource.
    pub fn target(&self) -> &str {
        match self {
            Reference::Ref(id) => id,
            Reference::GetAtt(id, _) => id,
        }
    }

    /// Whether this reference points at `logical_id`.
    pub fn points_to(&self, logical_id: &str) -> bool {
        self.target() == logical_id
    }
}

/// Kinds of resources the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Vpc,
    InternetGateway,
    VpcGatewayAttachment,
    NetworkAcl,
    NetworkAclEntry,
    SubnetNetworkAclAssociation,
    RouteTable,
    Route,
    Subnet,
    SubnetRouteTableAssociation,
    Eip,
    NatGateway,
}

impl ResourceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ResourceKind::Vpc => "AWS::EC2::VPC",
            ResourceKind::InternetGateway => "AWS::EC2::InternetGateway",
            ResourceKind::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            ResourceKind::NetworkAcl => "AWS::EC2::NetworkAcl",
            ResourceKind::NetworkAclEntry => "AWS::EC2::NetworkAclEntry",
            ResourceKind::SubnetNetworkAclAssociation => "AWS::EC2::SubnetNetworkAclAssociation",
            ResourceKind::RouteTable => "AWS::EC2::RouteTable",
            ResourceKind::Route => "AWS::EC2::Route",
            ResourceKind::Subnet => "AWS::EC2::Subnet",
            ResourceKind::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            ResourceKind::Eip => "AWS::EC2::EIP",
            ResourceKind::NatGateway => "AWS::EC2::NatGateway",
        }
    }

    /// Whether resources of this kind carry tags.
    pub fn is_taggable(&self) -> bool {
        matches!(
            self,
            ResourceKind::Vpc
                | ResourceKind::InternetGateway
                | ResourceKind::NetworkAcl
                | ResourceKind::RouteTable
                | ResourceKind::Subnet
                | ResourceKind::Eip
                | ResourceKind::NatGateway
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcProps {
    pub cidr_block: String,
    pub enable_dns_hostnames: bool,
    pub enable_dns_support: bool,
}

impl VpcProps {
    /// VPC with DNS resolution and hostnames enabled.
    pub fn new(cidr_block: impl Into<String>) -> Self {
        Self {
            cidr_block: cidr_block.into(),
            enable_dns_hostnames: true,
            enable_dns_support: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetGatewayProps {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachmentProps {
    pub vpc_id: Reference,
    pub internet_gateway_id: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAclProps {
    pub vpc_id: Reference,
}

/// Whether an ACL entry admits or drops matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcmpTypeCode {
    #[serde(rename = "Type")]
    pub icmp_type: i32,
    #[serde(rename = "Code")]
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAclEntryProps {
    pub network_acl_id: Reference,
    pub rule_number: u32,
    pub rule_action: AclAction,
    pub egress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_cidr_block: Option<String>,
    /// IANA protocol number, `-1` for all protocols.
    pub protocol: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range: Option<PortRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp: Option<IcmpTypeCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetNetworkAclAssociationProps {
    pub network_acl_id: Reference,
    pub subnet_id: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTableProps {
    pub vpc_id: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteProps {
    pub route_table_id: Reference,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway_id: Option<Reference>,
}

impl RouteProps {
    /// Route whose target is the route table's `gateway`.
    pub fn via_gateway(route_table: Reference, destination: impl Into<String>, gateway: Reference) -> Self {
        Self {
            route_table_id: route_table,
            destination_cidr_block: destination.into(),
            gateway_id: Some(gateway),
            nat_gateway_id: None,
        }
    }

    /// Route whose target is a NAT gateway.
    pub fn via_nat_gateway(route_table: Reference, destination: impl Into<String>, nat_gateway: Reference) -> Self {
        Self {
            route_table_id: route_table,
            destination_cidr_block: destination.into(),
            gateway_id: None,
            nat_gateway_id: Some(nat_gateway),
        }
    }

    /// Logical id of the route's target, whichever kind it is.
    pub fn target(&self) -> Option<&str> {
        self.gateway_id
            .as_ref()
            .or(self.nat_gateway_id.as_ref())
            .map(|r| r.target())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetProps {
    pub vpc_id: Reference,
    pub availability_zone: String,
    pub cidr_block: String,
    pub map_public_ip_on_launch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociationProps {
    pub route_table_id: Reference,
    pub subnet_id: Reference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EipProps {
    pub domain: String,
}

impl Default for EipProps {
    fn default() -> Self {
        Self {
            domain: "vpc".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGatewayProps {
    pub subnet_id: Reference,
    pub allocation_id: Reference,
}

/// A resource declaration handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Properties")]
pub enum Resource {
    #[serde(rename = "AWS::EC2::VPC")]
    Vpc(VpcProps),
    #[serde(rename = "AWS::EC2::InternetGateway")]
    InternetGateway(InternetGatewayProps),
    #[serde(rename = "AWS::EC2::VPCGatewayAttachment")]
    VpcGatewayAttachment(VpcGatewayAttachmentProps),
    #[serde(rename = "AWS::EC2::NetworkAcl")]
    NetworkAcl(NetworkAclProps),
    #[serde(rename = "AWS::EC2::NetworkAclEntry")]
    NetworkAclEntry(NetworkAclEntryProps),
    #[serde(rename = "AWS::EC2::SubnetNetworkAclAssociation")]
    SubnetNetworkAclAssociation(SubnetNetworkAclAssociationProps),
    #[serde(rename = "AWS::EC2::RouteTable")]
    RouteTable(RouteTableProps),
    #[serde(rename = "AWS::EC2::Route")]
    Route(RouteProps),
    #[serde(rename = "AWS::EC2::Subnet")]
    Subnet(SubnetProps),
    #[serde(rename = "AWS::EC2::SubnetRouteTableAssociation")]
    SubnetRouteTableAssociation(SubnetRouteTableAssociationProps),
    #[serde(rename = "AWS::EC2::EIP")]
    Eip(EipProps),
    #[serde(rename = "AWS::EC2::NatGateway")]
    NatGateway(NatGatewayProps),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Vpc(_) => ResourceKind::Vpc,
            Resource::InternetGateway(_) => ResourceKind::InternetGateway,
            Resource::VpcGatewayAttachment(_) => ResourceKind::VpcGatewayAttachment,
            Resource::NetworkAcl(_) => ResourceKind::NetworkAcl,
            Resource::NetworkAclEntry(_) => ResourceKind::NetworkAclEntry,
            Resource::SubnetNetworkAclAssociation(_) => ResourceKind::SubnetNetworkAclAssociation,
            Resource::RouteTable(_) => ResourceKind::RouteTable,
            Resource::Route(_) => ResourceKind::Route,
            Resource::Subnet(_) => ResourceKind::Subnet,
            Resource::SubnetRouteTableAssociation(_) => ResourceKind::SubnetRouteTableAssociation,
            Resource::Eip(_) => ResourceKind::Eip,
            Resource::NatGateway(_) => ResourceKind::NatGateway,
        }
    }

    /// Every reference this declaration holds to other resources.
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Resource::Vpc(_) | Resource::InternetGateway(_) | Resource::Eip(_) => Vec::new(),
            Resource::VpcGatewayAttachment(p) => vec![&p.vpc_id, &p.internet_gateway_id],
            Resource::NetworkAcl(p) => vec![&p.vpc_id],
            Resource::NetworkAclEntry(p) => vec![&p.network_acl_id],
            Resource::SubnetNetworkAclAssociation(p) => vec![&p.network_acl_id, &p.subnet_id],
            Resource::RouteTable(p) => vec![&p.vpc_id],
            Resource::Route(p) => {
                let mut refs = vec![&p.route_table_id];
                refs.extend(p.gateway_id.iter());
                refs.extend(p.nat_gateway_id.iter());
                refs
            }
            Resource::Subnet(p) => vec![&p.vpc_id],
            Resource::SubnetRouteTableAssociation(p) => vec![&p.route_table_id, &p.subnet_id],
            Resource::NatGateway(p) => vec![&p.subnet_id, &p.allocation_id],
        }
    }

    /// Whether any reference in this declaration targets `logical_id`.
    pub fn refers_to(&self, logical_id: &str) -> bool {
        self.references().iter().any(|r| r.points_to(logical_id))
    }
}

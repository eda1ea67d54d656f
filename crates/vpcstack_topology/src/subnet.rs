//! Subnet construction for the three tiers.
//!
//! A subnet is built in two phases. [`BareSubnet::create`] declares the subnet
//! and strips whatever routing the engine attached on its own; [`BareSubnet::attach`]
//! then binds it to its tier's route table and ACL.

use std::fmt;

use tracing::debug;

use vpcstack_config::SubnetConfig;
use vpcstack_engine::{
    ProvisioningEngine, Resource, ResourceHandle, RouteProps, RouteTableProps, SubnetProps,
    SubnetRouteTableAssociationProps, DEFAULT_ROUTE_CIDR,
};

use crate::acl::NetworkAcl;
use crate::context::NetworkContext;
use crate::error::TopologyResult;
use crate::nat::{NatGatewayRegistry, NatMode};

/// Tag key carrying the subnet's tier classification.
pub const SUBNET_TYPE_TAG: &str = "aws-cdk:subnet-type";

/// Routing and isolation class of a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetTier {
    Public,
    Private,
    Data,
}

impl SubnetTier {
    pub fn all() -> [SubnetTier; 3] {
        [SubnetTier::Public, SubnetTier::Private, SubnetTier::Data]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::Private => "Private",
            SubnetTier::Data => "Data",
        }
    }

    /// Value of [`SUBNET_TYPE_TAG`] for this tier.
    pub fn subnet_type(&self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::Private => "Private",
            SubnetTier::Data => "Isolated",
        }
    }

    /// Name of the tier's ACL in network `vpc_name`.
    pub fn acl_name(&self, vpc_name: &str) -> String {
        format!("ACL-{}-{}", self.label(), vpc_name)
    }

    /// Zone-qualified ACL association group.
    pub fn acl_group(&self, zone: &str) -> String {
        format!("{}_NACL-{}", self.label().to_uppercase(), zone)
    }

    pub fn subnet_id(&self, availability_zone: &str) -> String {
        format!("{}Subnet{}", self.label(), availability_zone)
    }

    fn route_association_id(&self, zone: &str, availability_zone: &str) -> String {
        match self {
            SubnetTier::Private => format!("RouteAssociationPrivate{}Default", zone),
            _ => format!("RouteAssociation{}{}Default", self.label(), availability_zone),
        }
    }
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A declared subnet with no routing or ACL yet.
#[derive(Debug)]
pub struct BareSubnet {
    tier: SubnetTier,
    zone: String,
    availability_zone: String,
    handle: ResourceHandle,
    stripped: Vec<ResourceHandle>,
}

impl BareSubnet {
    /// Declare the subnet, drop engine-attached routing, and label it.
    pub fn create<E>(
        engine: &mut E,
        ctx: &NetworkContext,
        tier: SubnetTier,
        config: &SubnetConfig,
    ) -> TopologyResult<Self>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let availability_zone = config.availability_zone_in(&ctx.region);
        let subnet_id = tier.subnet_id(&config.availability_zone);

        let declared = engine.declare(
            &subnet_id,
            Resource::Subnet(SubnetProps {
                vpc_id: ctx.vpc.reference(),
                availability_zone: availability_zone.clone(),
                cidr_block: config.ip_address.clone(),
                map_public_ip_on_launch: tier == SubnetTier::Public && config.map_public_ip_on_launch,
            }),
        )?;

        // Children reference their predecessors, so drop them newest first.
        for implicit in declared.implicit.iter().rev() {
            engine.remove(implicit)?;
        }

        let handle = declared.handle;
        engine.tag(&handle, SUBNET_TYPE_TAG, tier.subnet_type())?;
        engine.tag(&handle, "Name", &format!("{}-{}", ctx.vpc_name, subnet_id))?;

        debug!(
            "Declared {} subnet {} in {} ({} implicit resources stripped)",
            tier,
            config.ip_address,
            availability_zone,
            declared.implicit.len()
        );

        Ok(Self {
            tier,
            zone: config.zone_key(),
            availability_zone,
            handle,
            stripped: declared.implicit,
        })
    }

    pub fn tier(&self) -> SubnetTier {
        self.tier
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// Engine-attached resources removed during creation.
    pub fn stripped(&self) -> &[ResourceHandle] {
        &self.stripped
    }

    /// Bind the subnet to `route_table` and `acl`.
    pub fn attach<E>(
        self,
        engine: &mut E,
        route_table: &ResourceHandle,
        acl: &NetworkAcl,
    ) -> TopologyResult<Subnet>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let route_table_association = engine
            .declare(
                &self.tier.route_association_id(&self.zone, &self.availability_zone),
                Resource::SubnetRouteTableAssociation(SubnetRouteTableAssociationProps {
                    route_table_id: route_table.reference(),
                    subnet_id: self.handle.reference(),
                }),
            )?
            .handle;

        let acl_association =
            acl.associate_with_subnet(engine, &self.tier.acl_group(&self.zone), &self.handle)?;

        Ok(Subnet {
            tier: self.tier,
            zone: self.zone,
            availability_zone: self.availability_zone,
            handle: self.handle,
            route_table: route_table.clone(),
            route_table_association,
            acl_association,
            nat_gateway: None,
        })
    }
}

/// A subnet bound to its tier's routing and ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub tier: SubnetTier,
    /// Lower-cased zone suffix.
    pub zone: String,
    pub availability_zone: String,
    pub handle: ResourceHandle,
    pub route_table: ResourceHandle,
    pub route_table_association: ResourceHandle,
    pub acl_association: ResourceHandle,
    /// NAT gateway targeted by the default route (private tier only).
    pub nat_gateway: Option<ResourceHandle>,
}

/// Creates subnets for each tier.
pub struct SubnetFactory<'a> {
    ctx: &'a NetworkContext,
}

impl<'a> SubnetFactory<'a> {
    pub fn new(ctx: &'a NetworkContext) -> Self {
        Self { ctx }
    }

    /// Public subnet on the shared public route table.
    ///
    /// Hosts a NAT gateway when `mode` asks for one in this zone.
    pub fn public<E>(
        &self,
        engine: &mut E,
        config: &SubnetConfig,
        route_table: &ResourceHandle,
        acl: &NetworkAcl,
        registry: &mut NatGatewayRegistry,
        mode: NatMode,
    ) -> TopologyResult<Subnet>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let bare = BareSubnet::create(engine, self.ctx, SubnetTier::Public, config)?;
        let subnet = bare.attach(engine, route_table, acl)?;

        if mode.wants_gateway(registry) {
            registry.create(engine, self.ctx, &subnet.zone, &subnet.handle)?;
        }

        Ok(subnet)
    }

    /// Private subnet with its own route table, defaulting to a NAT gateway.
    ///
    /// The gateway is resolved before anything is declared, so a missing
    /// gateway leaves no partial subnet behind.
    pub fn private<E>(
        &self,
        engine: &mut E,
        config: &SubnetConfig,
        acl: &NetworkAcl,
        registry: &NatGatewayRegistry,
    ) -> TopologyResult<Subnet>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let zone = config.zone_key();
        let nat_gateway = registry.resolve(&zone)?.handle.clone();

        let bare = BareSubnet::create(engine, self.ctx, SubnetTier::Private, config)?;

        let route_table = engine
            .declare(
                &format!("privateSubnetRouteTable{}", zone),
                Resource::RouteTable(RouteTableProps {
                    vpc_id: self.ctx.vpc.reference(),
                }),
            )?
            .handle;
        engine.declare(
            &format!("PrivateRoute{}", zone),
            Resource::Route(RouteProps::via_nat_gateway(
                route_table.reference(),
                DEFAULT_ROUTE_CIDR,
                nat_gateway.reference(),
            )),
        )?;
        engine.tag(
            &route_table,
            "Name",
            &format!("RT-{}-PRIVATE-{}", self.ctx.vpc_name, zone),
        )?;

        let mut subnet = bare.attach(engine, &route_table, acl)?;
        subnet.nat_gateway = Some(nat_gateway);
        Ok(subnet)
    }

    /// Data subnet on the shared, route-less data route table.
    pub fn data<E>(
        &self,
        engine: &mut E,
        config: &SubnetConfig,
        route_table: &ResourceHandle,
        acl: &NetworkAcl,
    ) -> TopologyResult<Subnet>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let bare = BareSubnet::create(engine, self.ctx, SubnetTier::Data, config)?;
        bare.attach(engine, route_table, acl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acl::NetworkAclBuilder;
    use crate::error::TopologyError;
    use vpcstack_engine::{RecordingEngine, ResourceKind, VpcProps};

    struct Fixture {
        engine: RecordingEngine,
        ctx: NetworkContext,
        table: ResourceHandle,
        acl: NetworkAcl,
    }

    fn fixture() -> Fixture {
        let mut engine = RecordingEngine::new();
        let vpc = engine
            .declare("vpc", Resource::Vpc(VpcProps::new("10.0.0.0/16")))
            .unwrap()
            .handle;
        let ctx = NetworkContext::new("vpc-kate", "ap-southeast-2", "sandpit", vpc);
        let table = engine
            .declare(
                "dataSubnetRouteTable",
                Resource::RouteTable(RouteTableProps {
                    vpc_id: ctx.vpc.reference(),
                }),
            )
            .unwrap()
            .handle;
        let acl = NetworkAclBuilder::new(&ctx)
            .build(&mut engine, "ACL-Data-sandpit", &[])
            .unwrap();
        Fixture {
            engine,
            ctx,
            table,
            acl,
        }
    }

    #[test]
    fn test_tier_naming() {
        assert_eq!(SubnetTier::Data.acl_name("sandpit"), "ACL-Data-sandpit");
        assert_eq!(SubnetTier::Private.acl_group("b"), "PRIVATE_NACL-b");
        assert_eq!(SubnetTier::Data.subnet_type(), "Isolated");
        assert_eq!(SubnetTier::Public.subnet_id("A"), "PublicSubnetA");
        assert_eq!(
            SubnetTier::Public.route_association_id("a", "ap-southeast-2a"),
            "RouteAssociationPublicap-southeast-2aDefault"
        );
        assert_eq!(
            SubnetTier::Private.route_association_id("a", "ap-southeast-2a"),
            "RouteAssociationPrivateaDefault"
        );
    }

    #[test]
    fn test_bare_subnet_strips_engine_routing() {
        let mut f = fixture();
        let bare = BareSubnet::create(
            &mut f.engine,
            &f.ctx,
            SubnetTier::Data,
            &SubnetConfig::new("a", "10.0.20.0/24").with_public_ip_on_launch(true),
        )
        .unwrap();

        assert_eq!(bare.stripped().len(), 2);
        assert!(f.engine.route_table_of("DataSubneta").is_none());
        assert!(!f.engine.contains("DataSubnetaRouteTable"));
        assert_eq!(f.engine.tag_value("DataSubneta", SUBNET_TYPE_TAG), Some("Isolated"));
        assert_eq!(f.engine.tag_value("DataSubneta", "Name"), Some("sandpit-DataSubneta"));

        match &f.engine.get("DataSubneta").unwrap().resource {
            Resource::Subnet(props) => {
                assert_eq!(props.availability_zone, "ap-southeast-2a");
                assert!(!props.map_public_ip_on_launch);
            }
            other => panic!("unexpected resource {:?}", other),
        }
    }

    #[test]
    fn test_data_subnet_binding() {
        let mut f = fixture();
        let subnet = SubnetFactory::new(&f.ctx)
            .data(&mut f.engine, &SubnetConfig::new("a", "10.0.20.0/24"), &f.table, &f.acl)
            .unwrap();

        assert_eq!(subnet.route_table, f.table);
        assert!(subnet.nat_gateway.is_none());
        assert_eq!(f.engine.route_table_of("DataSubneta"), Some("dataSubnetRouteTable"));
        assert_eq!(f.engine.acls_of("DataSubneta"), vec!["ACL-Data-sandpit"]);
        assert_eq!(subnet.acl_association.logical_id(), "ACL-Data-sandpit/DATA_NACL-a");
        assert!(f.engine.routes_in("dataSubnetRouteTable").is_empty());
    }

    #[test]
    fn test_private_subnet_without_gateway_declares_nothing() {
        let mut f = fixture();
        let before = f.engine.len();
        let registry = NatGatewayRegistry::new();

        let err = SubnetFactory::new(&f.ctx)
            .private(&mut f.engine, &SubnetConfig::new("a", "10.0.10.0/24"), &f.acl, &registry)
            .unwrap_err();

        assert!(matches!(err, TopologyError::MissingNatGateway { .. }));
        assert_eq!(f.engine.len(), before);
        assert_eq!(f.engine.count(ResourceKind::Subnet), 0);
    }
}

//! Topology orchestration.

use std::collections::HashSet;

use tracing::info;

use vpcstack_config::{SubnetConfig, VpcConfig};
use vpcstack_engine::{
    InternetGatewayProps, ProvisioningEngine, Resource, ResourceHandle, RouteProps,
    RouteTableProps, VpcGatewayAttachmentProps, VpcProps, DEFAULT_ROUTE_CIDR,
};

use crate::acl::{NetworkAcl, NetworkAclBuilder};
use crate::context::NetworkContext;
use crate::error::{TopologyError, TopologyResult};
use crate::nat::{NatGateway, NatGatewayRegistry, NatMode};
use crate::subnet::{Subnet, SubnetFactory, SubnetTier};

/// One ACL per tier.
#[derive(Debug, Clone)]
pub struct TierAcls {
    pub public: NetworkAcl,
    pub private: NetworkAcl,
    pub data: NetworkAcl,
}

impl TierAcls {
    pub fn for_tier(&self, tier: SubnetTier) -> &NetworkAcl {
        match tier {
            SubnetTier::Public => &self.public,
            SubnetTier::Private => &self.private,
            SubnetTier::Data => &self.data,
        }
    }
}

/// Handles of everything a build declared.
#[derive(Debug, Clone)]
pub struct VpcTopology {
    pub vpc: ResourceHandle,
    pub internet_gateway: ResourceHandle,
    pub gateway_attachment: ResourceHandle,
    pub acls: TierAcls,
    pub public_route_table: ResourceHandle,
    pub data_route_table: ResourceHandle,
    pub public_subnets: Vec<Subnet>,
    pub private_subnets: Vec<Subnet>,
    pub data_subnets: Vec<Subnet>,
    pub nat_mode: NatMode,
    /// NAT gateways in creation order.
    pub nat_gateways: Vec<NatGateway>,
}

impl VpcTopology {
    pub fn nat_gateway_count(&self) -> usize {
        self.nat_gateways.len()
    }

    pub fn nat_gateway(&self, zone: &str) -> Option<&NatGateway> {
        let zone = zone.to_lowercase();
        self.nat_gateways.iter().find(|g| g.zone == zone)
    }

    /// All subnets in build order: public, private, data.
    pub fn subnets(&self) -> impl Iterator<Item = &Subnet> {
        self.public_subnets
            .iter()
            .chain(&self.private_subnets)
            .chain(&self.data_subnets)
    }
}

/// Drives a full build against a provisioning engine.
#[derive(Debug, Clone)]
pub struct TopologyBuilder {
    stack_name: String,
    region: String,
}

impl TopologyBuilder {
    pub fn new(stack_name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            region: region.into(),
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Declare the whole topology for `config`.
    ///
    /// Steps run in a fixed order and the first failure aborts the build.
    /// Private subnets are only built once every public subnet is in place,
    /// since a shared NAT gateway may come from any of them. A tier naming the
    /// same zone twice is rejected before anything is declared.
    pub fn build<E>(&self, engine: &mut E, config: &VpcConfig) -> TopologyResult<VpcTopology>
    where
        E: ProvisioningEngine + ?Sized,
    {
        check_zones(SubnetTier::Public, &config.public_subnets)?;
        check_zones(SubnetTier::Private, &config.private_subnets)?;
        check_zones(SubnetTier::Data, &config.data_subnets)?;

        let nat_mode = NatMode::from_config(config);
        info!(
            "Building VPC '{}' ({}) in {} with {:?} NAT gateways",
            config.vpc_name, config.ip_addresses, self.region, nat_mode
        );

        // Network shell
        let vpc = engine
            .declare("vpc", Resource::Vpc(VpcProps::new(config.ip_addresses.clone())))?
            .handle;
        engine.tag(&vpc, "Name", &config.vpc_name)?;
        let ctx = NetworkContext::new(&self.stack_name, &self.region, &config.vpc_name, vpc);

        // Internet gateway
        let internet_gateway = engine
            .declare("InternetGateway", Resource::InternetGateway(InternetGatewayProps {}))?
            .handle;
        engine.tag(
            &internet_gateway,
            "Name",
            &format!("IGW-{}", config.vpc_name.to_uppercase()),
        )?;
        let gateway_attachment = engine
            .declare(
                "IGWAttachment",
                Resource::VpcGatewayAttachment(VpcGatewayAttachmentProps {
                    vpc_id: ctx.vpc.reference(),
                    internet_gateway_id: internet_gateway.reference(),
                }),
            )?
            .handle;

        // Tier ACLs
        let acl_builder = NetworkAclBuilder::new(&ctx);
        let acls = TierAcls {
            public: acl_builder.build(
                engine,
                &SubnetTier::Public.acl_name(&config.vpc_name),
                &config.public_subnet_nacls,
            )?,
            private: acl_builder.build(
                engine,
                &SubnetTier::Private.acl_name(&config.vpc_name),
                &config.private_subnet_nacls,
            )?,
            data: acl_builder.build(
                engine,
                &SubnetTier::Data.acl_name(&config.vpc_name),
                &config.data_subnet_nacls,
            )?,
        };
        info!("Created network ACLs for public, private and data tiers");

        // Public route table with its default route
        let public_route_table = self.route_table(engine, &ctx, "PublicSubnetRouteTable")?;
        engine.declare(
            "PublicRoute",
            Resource::Route(RouteProps::via_gateway(
                public_route_table.reference(),
                DEFAULT_ROUTE_CIDR,
                internet_gateway.reference(),
            )),
        )?;
        engine.tag(
            &public_route_table,
            "Name",
            &format!("RT-{}-PUBLIC", config.vpc_name),
        )?;

        // Data route table, no default route
        let data_route_table = self.route_table(engine, &ctx, "dataSubnetRouteTable")?;
        engine.tag(&data_route_table, "Name", &format!("RT-{}-DATA", config.vpc_name))?;

        let factory = SubnetFactory::new(&ctx);
        let mut registry = NatGatewayRegistry::new();

        let mut public_subnets = Vec::with_capacity(config.public_subnets.len());
        for subnet in &config.public_subnets {
            public_subnets.push(factory.public(
                engine,
                subnet,
                &public_route_table,
                &acls.public,
                &mut registry,
                nat_mode,
            )?);
        }
        info!(
            "Created {} public subnets and {} NAT gateways",
            public_subnets.len(),
            registry.len()
        );

        let mut private_subnets = Vec::with_capacity(config.private_subnets.len());
        for subnet in &config.private_subnets {
            private_subnets.push(factory.private(engine, subnet, &acls.private, &registry)?);
        }
        info!("Created {} private subnets", private_subnets.len());

        let mut data_subnets = Vec::with_capacity(config.data_subnets.len());
        for subnet in &config.data_subnets {
            data_subnets.push(factory.data(engine, subnet, &data_route_table, &acls.data)?);
        }
        info!("Created {} data subnets", data_subnets.len());

        Ok(VpcTopology {
            vpc: ctx.vpc.clone(),
            internet_gateway,
            gateway_attachment,
            acls,
            public_route_table,
            data_route_table,
            public_subnets,
            private_subnets,
            data_subnets,
            nat_mode,
            nat_gateways: registry.into_gateways(),
        })
    }

    fn route_table<E>(
        &self,
        engine: &mut E,
        ctx: &NetworkContext,
        logical_id: &str,
    ) -> TopologyResult<ResourceHandle>
    where
        E: ProvisioningEngine + ?Sized,
    {
        Ok(engine
            .declare(
                logical_id,
                Resource::RouteTable(RouteTableProps {
                    vpc_id: ctx.vpc.reference(),
                }),
            )?
            .handle)
    }
}

/// Zone keys are case-insensitive and unique within a tier.
fn check_zones(tier: SubnetTier, subnets: &[SubnetConfig]) -> TopologyResult<()> {
    let mut seen = HashSet::new();
    for subnet in subnets {
        if !seen.insert(subnet.zone_key()) {
            return Err(TopologyError::DuplicateZone {
                tier: tier.to_string(),
                zone: subnet.availability_zone.clone(),
            });
        }
    }
    Ok(())
}

//! NAT gateway registry.
//!
//! Holds at most one NAT gateway per availability zone. Whether a public subnet
//! gets a gateway is the orchestrator's call, expressed through [`NatMode`].

use tracing::{debug, warn};

use vpcstack_config::VpcConfig;
use vpcstack_engine::{EipProps, NatGatewayProps, ProvisioningEngine, Resource, ResourceHandle};

use crate::context::NetworkContext;
use crate::error::{TopologyError, TopologyResult};

/// NAT gateway placement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NatMode {
    /// One gateway per public subnet, hence per zone.
    PerAz,
    /// A single gateway, in the zone of the first public subnet.
    Shared,
}

impl NatMode {
    pub fn from_config(config: &VpcConfig) -> Self {
        if config.enable_per_az_nat_gateway {
            NatMode::PerAz
        } else {
            NatMode::Shared
        }
    }

    /// Whether the next public subnet should host a new gateway.
    pub fn wants_gateway(&self, registry: &NatGatewayRegistry) -> bool {
        match self {
            NatMode::PerAz => true,
            NatMode::Shared => registry.is_empty(),
        }
    }
}

/// A NAT gateway with its Elastic IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatGateway {
    pub zone: String,
    pub handle: ResourceHandle,
    pub elastic_ip: ResourceHandle,
    /// Public subnet the gateway lives in.
    pub subnet: ResourceHandle,
}

/// Zone-indexed NAT gateways of one build.
#[derive(Debug, Clone, Default)]
pub struct NatGatewayRegistry {
    gateways: Vec<NatGateway>,
    shared_gateway: Option<ResourceHandle>,
}

impl NatGatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an Elastic IP and a NAT gateway in `subnet`, indexed by `zone`.
    ///
    /// The first gateway created becomes the shared gateway.
    pub fn create<E>(
        &mut self,
        engine: &mut E,
        ctx: &NetworkContext,
        zone: &str,
        subnet: &ResourceHandle,
    ) -> TopologyResult<&NatGateway>
    where
        E: ProvisioningEngine + ?Sized,
    {
        let zone = zone.to_lowercase();

        let elastic_ip = engine
            .declare(&format!("NATGatewayEIP{}", zone), Resource::Eip(EipProps::default()))?
            .handle;
        let handle = engine
            .declare(
                &format!("NatGateway{}", zone),
                Resource::NatGateway(NatGatewayProps {
                    subnet_id: subnet.reference(),
                    allocation_id: elastic_ip.attribute("AllocationId"),
                }),
            )?
            .handle;
        engine.tag(
            &handle,
            "Name",
            &format!("NatGateway-{}-{}", ctx.vpc_name.to_uppercase(), zone),
        )?;

        debug!("Created NAT gateway {} in zone {}", handle.logical_id(), zone);

        if self.shared_gateway.is_none() {
            self.shared_gateway = Some(handle.clone());
        }
        self.gateways.push(NatGateway {
            zone,
            handle,
            elastic_ip,
            subnet: subnet.clone(),
        });

        let index = self.gateways.len() - 1;
        Ok(&self.gateways[index])
    }

    pub fn has(&self, zone: &str) -> bool {
        self.get(zone).is_some()
    }

    pub fn get(&self, zone: &str) -> Option<&NatGateway> {
        let zone = zone.to_lowercase();
        self.gateways.iter().find(|g| g.zone == zone)
    }

    /// The shared gateway: the first one ever created.
    pub fn first_entry(&self) -> Option<&NatGateway> {
        let shared = self.shared_gateway.as_ref()?;
        self.gateways.iter().find(|g| &g.handle == shared)
    }

    pub fn shared_gateway(&self) -> Option<&ResourceHandle> {
        self.shared_gateway.as_ref()
    }

    /// Gateway a private subnet in `zone` should route through.
    ///
    /// Same-zone gateway first, then the shared gateway. An empty registry is
    /// an error rather than a placeholder target.
    pub fn resolve(&self, zone: &str) -> TopologyResult<&NatGateway> {
        if let Some(gateway) = self.get(zone) {
            return Ok(gateway);
        }

        match self.first_entry() {
            Some(gateway) => {
                warn!(
                    "No NAT gateway in zone {}, routing through {} in zone {}",
                    zone,
                    gateway.handle.logical_id(),
                    gateway.zone
                );
                Ok(gateway)
            }
            None => Err(TopologyError::MissingNatGateway {
                zone: zone.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.gateways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gateways.is_empty()
    }

    /// Gateways in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &NatGateway> {
        self.gateways.iter()
    }

    pub fn zones(&self) -> Vec<&str> {
        self.gateways.iter().map(|g| g.zone.as_str()).collect()
    }

    pub fn into_gateways(self) -> Vec<NatGateway> {
        self.gateways
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpcstack_engine::{RecordingEngine, ResourceKind, SubnetProps, VpcProps};

    fn setup() -> (RecordingEngine, NetworkContext) {
        let mut engine = RecordingEngine::new().with_implicit_subnet_routing(false);
        let vpc = engine
            .declare("vpc", Resource::Vpc(VpcProps::new("10.0.0.0/16")))
            .unwrap()
            .handle;
        let ctx = NetworkContext::new("vpc-kate", "ap-southeast-2", "sandpit", vpc);
        (engine, ctx)
    }

    fn public_subnet(engine: &mut RecordingEngine, ctx: &NetworkContext, zone: &str) -> ResourceHandle {
        engine
            .declare(
                &format!("PublicSubnet{}", zone),
                Resource::Subnet(SubnetProps {
                    vpc_id: ctx.vpc.reference(),
                    availability_zone: format!("{}{}", ctx.region, zone),
                    cidr_block: "10.0.0.0/24".to_string(),
                    map_public_ip_on_launch: true,
                }),
            )
            .unwrap()
            .handle
    }

    #[test]
    fn test_create_registers_gateway() {
        let (mut engine, ctx) = setup();
        let subnet = public_subnet(&mut engine, &ctx, "A");
        let mut registry = NatGatewayRegistry::new();

        let gateway = registry.create(&mut engine, &ctx, "A", &subnet).unwrap().clone();

        assert_eq!(gateway.zone, "a");
        assert_eq!(gateway.handle.logical_id(), "NatGatewaya");
        assert_eq!(gateway.elastic_ip.logical_id(), "NATGatewayEIPa");
        assert!(registry.has("a"));
        assert!(registry.has("A"));
        assert_eq!(registry.shared_gateway(), Some(&gateway.handle));
        assert_eq!(engine.tag_value("NatGatewaya", "Name"), Some("NatGateway-SANDPIT-a"));
        assert_eq!(engine.count(ResourceKind::Eip), 1);
    }

    #[test]
    fn test_resolve_prefers_same_zone() {
        let (mut engine, ctx) = setup();
        let mut registry = NatGatewayRegistry::new();
        for zone in ["a", "b"] {
            let subnet = public_subnet(&mut engine, &ctx, zone);
            registry.create(&mut engine, &ctx, zone, &subnet).unwrap();
        }

        assert_eq!(registry.resolve("b").unwrap().zone, "b");
        assert_eq!(registry.resolve("c").unwrap().zone, "a");
        assert_eq!(registry.first_entry().unwrap().zone, "a");
        assert_eq!(registry.zones(), vec!["a", "b"]);
    }

    #[test]
    fn test_resolve_empty_registry_fails() {
        let registry = NatGatewayRegistry::new();
        let err = registry.resolve("a").unwrap_err();
        assert!(matches!(err, TopologyError::MissingNatGateway { ref zone } if zone == "a"));
    }

    #[test]
    fn test_mode_policy() {
        let (mut engine, ctx) = setup();
        let mut registry = NatGatewayRegistry::new();

        assert!(NatMode::Shared.wants_gateway(&registry));
        assert!(NatMode::PerAz.wants_gateway(&registry));

        let subnet = public_subnet(&mut engine, &ctx, "a");
        registry.create(&mut engine, &ctx, "a", &subnet).unwrap();

        assert!(!NatMode::Shared.wants_gateway(&registry));
        assert!(NatMode::PerAz.wants_gateway(&registry));
    }

    #[test]
    fn test_mode_from_config() {
        let config = VpcConfig::new("sandpit", "10.0.0.0/16");
        assert_eq!(NatMode::from_config(&config), NatMode::Shared);
        let config = config.with_per_az_nat_gateway(true);
        assert_eq!(NatMode::from_config(&config), NatMode::PerAz);
    }
}

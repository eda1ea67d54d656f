//! # vpcstack_topology
//!
//! Builds a three-tier network (public, private, data) from a [`VpcConfig`].
//!
//! The build is one synchronous pass with a fixed order: network shell,
//! internet gateway, the three tier ACLs, the public and data route tables,
//! then public, private and data subnets. The NAT gateway registry is filled
//! while the public subnets are processed and only read afterwards.
//!
//! ## Example
//!
//! ```rust
//! use vpcstack_config::{SubnetConfig, VpcConfig};
//! use vpcstack_engine::RecordingEngine;
//! use vpcstack_topology::TopologyBuilder;
//!
//! let config = VpcConfig::new("sandpit", "10.0.0.0/16")
//!     .with_public_subnet(SubnetConfig::new("a", "10.0.0.0/24"))
//!     .with_private_subnet(SubnetConfig::new("a", "10.0.1.0/24"));
//!
//! let mut engine = RecordingEngine::new();
//! let topology = TopologyBuilder::new("vpc-kate", "ap-southeast-2")
//!     .build(&mut engine, &config)
//!     .unwrap();
//!
//! assert_eq!(topology.nat_gateway_count(), 1);
//! ```
//!
//! [`VpcConfig`]: vpcstack_config::VpcConfig

pub mod acl;
pub mod builder;
pub mod context;
pub mod error;
pub mod nat;
pub mod subnet;

pub use acl::{AclTraffic, AclTrafficResolver, NetworkAcl, NetworkAclBuilder};
pub use builder::{TierAcls, TopologyBuilder, VpcTopology};
pub use context::NetworkContext;
pub use error::{TopologyError, TopologyResult};
pub use nat::{NatGateway, NatGatewayRegistry, NatMode};
pub use subnet::{BareSubnet, Subnet, SubnetFactory, SubnetTier, SUBNET_TYPE_TAG};

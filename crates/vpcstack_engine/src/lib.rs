//! # vpcstack_engine
//!
//! The provisioning engine seam for vpcstack.
//!
//! The topology builder never talks to a cloud API directly. It hands typed
//! resource declarations to a [`ProvisioningEngine`] and gets back opaque
//! [`ResourceHandle`]s that later declarations reference.
//!
//! # Features
//!
//! - **Typed declarations**: VPC, gateways, ACLs, route tables, subnets, NAT
//! - **Reference checking**: declarations may only point at resources that exist
//! - **Implicit defaults**: subnets come with an engine-attached route table pair
//!   that callers are expected to strip
//! - **Recording engine**: in-memory engine that renders a CloudFormation-style template
//!
//! # Example
//!
//! ```rust
//! use vpcstack_engine::{ProvisioningEngine, RecordingEngine, Resource, VpcProps};
//!
//! let mut engine = RecordingEngine::new();
//! let vpc = engine
//!     .declare("vpc", Resource::Vpc(VpcProps::new("10.0.0.0/16")))
//!     .unwrap()
//!     .handle;
//! engine.tag(&vpc, "Name", "main").unwrap();
//! assert_eq!(engine.len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod recording;
pub mod resource;
pub mod template;

pub use engine::{Declared, ProvisioningEngine, ResourceHandle};
pub use error::{EngineError, EngineResult};
pub use recording::{RecordingEngine, ResourceRecord};
pub use resource::{
    AclAction, EipProps, IcmpTypeCode, InternetGatewayProps, NatGatewayProps, NetworkAclEntryProps,
    NetworkAclProps, PortRange, Reference, Resource, ResourceKind, RouteProps, RouteTableProps,
    SubnetNetworkAclAssociationProps, SubnetProps, SubnetRouteTableAssociationProps,
    VpcGatewayAttachmentProps, VpcProps,
};
pub use template::{StackDescriptor, Tag, Template, TemplateMetadata};

/// Destination of a default route.
pub const DEFAULT_ROUTE_CIDR: &str = "0.0.0.0/0";

//! Error types for topology builds.

use thiserror::Error;
use vpcstack_engine::EngineError;

/// Result type alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that abort a topology build.
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Invalid ACL protocol '{protocol}': must be one of 1, 6, 17, 53 or -1")]
    InvalidProtocol { protocol: String },

    #[error("ACL protocol {protocol} requires both startPort and endPort")]
    MissingPortRange { protocol: String },

    #[error("{tier} tier declares zone '{zone}' more than once")]
    DuplicateZone { tier: String, zone: String },

    #[error("No NAT gateway available for private subnet in zone '{zone}'")]
    MissingNatGateway { zone: String },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

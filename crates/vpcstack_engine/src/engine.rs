//! Provisioning engine trait and handle types.

use std::fmt;

use crate::error::EngineResult;
use crate::resource::{Reference, Resource, ResourceKind};

/// Opaque identifier for a declared resource.
///
/// Handles are only minted by an engine. Callers wire resources together by
/// turning a handle into a [`Reference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceHandle {
    logical_id: String,
    kind: ResourceKind,
}

impl ResourceHandle {
    pub fn new(logical_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            logical_id: logical_id.into(),
            kind,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Reference to the resource's primary identifier.
    pub fn reference(&self) -> Reference {
        Reference::Ref(self.logical_id.clone())
    }

    /// Reference to one of the resource's attributes.
    pub fn attribute(&self, name: &str) -> Reference {
        Reference::GetAtt(self.logical_id.clone(), name.to_string())
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.logical_id, self.kind)
    }
}

/// Outcome of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared {
    /// Handle of the declared resource.
    pub handle: ResourceHandle,
    /// Children the engine attached on its own, in creation order.
    pub implicit: Vec<ResourceHandle>,
}

impl Declared {
    pub fn new(handle: ResourceHandle) -> Self {
        Self {
            handle,
            implicit: Vec::new(),
        }
    }

    pub fn with_implicit(mut self, implicit: Vec<ResourceHandle>) -> Self {
        self.implicit = implicit;
        self
    }
}

/// Engine that materializes resource declarations.
///
/// Implementations decide what "materialize" means: the recording engine keeps
/// an in-memory graph, a real backend would emit API calls or templates.
pub trait ProvisioningEngine {
    /// Declare a resource under `logical_id`.
    fn declare(&mut self, logical_id: &str, resource: Resource) -> EngineResult<Declared>;

    /// Remove a previously declared resource.
    fn remove(&mut self, handle: &ResourceHandle) -> EngineResult<()>;

    /// Attach a key/value label to a resource.
    fn tag(&mut self, handle: &ResourceHandle, key: &str, value: &str) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_references() {
        let handle = ResourceHandle::new("NATGatewayEIPa", ResourceKind::Eip);
        assert_eq!(handle.reference(), Reference::Ref("NATGatewayEIPa".to_string()));
        assert_eq!(
            handle.attribute("AllocationId"),
            Reference::GetAtt("NATGatewayEIPa".to_string(), "AllocationId".to_string())
        );
        assert_eq!(handle.to_string(), "NATGatewayEIPa (AWS::EC2::EIP)");
    }
}

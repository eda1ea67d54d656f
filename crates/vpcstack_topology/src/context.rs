//! Build-wide identity shared by the tier builders.

use vpcstack_engine::ResourceHandle;

/// Names and the network handle every tier resource is scoped to.
#[derive(Debug, Clone)]
pub struct NetworkContext {
    pub stack_name: String,
    pub region: String,
    pub vpc_name: String,
    pub vpc: ResourceHandle,
}

impl NetworkContext {
    pub fn new(
        stack_name: impl Into<String>,
        region: impl Into<String>,
        vpc_name: impl Into<String>,
        vpc: ResourceHandle,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            region: region.into(),
            vpc_name: vpc_name.into(),
            vpc,
        }
    }
}

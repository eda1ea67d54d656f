//! In-memory recording engine.
//!
//! Keeps every declaration in insertion order, enforces the reference rules a
//! real engine would, and renders the result as a [`Template`]. Tests use it to
//! inspect the graph the topology builder produced.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use crate::engine::{Declared, ProvisioningEngine, ResourceHandle};
use crate::error::{EngineError, EngineResult};
use crate::resource::{
    NetworkAclEntryProps, Resource, ResourceKind, RouteProps, RouteTableProps,
    SubnetRouteTableAssociationProps,
};
use crate::template::{StackDescriptor, Tag, Template, TemplateMetadata};

/// A declared resource with its labels.
#[derive(Debug, Clone)]
pub struct ResourceRecord {
    pub handle: ResourceHandle,
    pub resource: Resource,
    pub tags: Vec<Tag>,
    /// Attached by the engine rather than declared by the caller.
    pub implicit: bool,
}

impl ResourceRecord {
    pub fn logical_id(&self) -> &str {
        self.handle.logical_id()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Engine that records declarations in memory.
#[derive(Debug, Clone)]
pub struct RecordingEngine {
    records: Vec<ResourceRecord>,
    removed: Vec<ResourceHandle>,
    stack_tags: Vec<Tag>,
    implicit_subnet_routing: bool,
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingEngine {
    /// Create an engine that attaches default routing to new subnets.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            removed: Vec::new(),
            stack_tags: Vec::new(),
            implicit_subnet_routing: true,
        }
    }

    /// Toggle the implicit route table pair attached to new subnets.
    pub fn with_implicit_subnet_routing(mut self, enabled: bool) -> Self {
        self.implicit_subnet_routing = enabled;
        self
    }

    /// Add a label applied to every taggable resource at render time.
    ///
    /// Resource-level tags with the same key take precedence.
    pub fn tag_stack(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert_tag(&mut self.stack_tags, Tag::new(key, value));
    }

    pub fn stack_tags(&self) -> &[Tag] {
        &self.stack_tags
    }

    pub fn resources(&self) -> &[ResourceRecord] {
        &self.records
    }

    pub fn get(&self, logical_id: &str) -> Option<&ResourceRecord> {
        self.records.iter().find(|r| r.logical_id() == logical_id)
    }

    pub fn contains(&self, logical_id: &str) -> bool {
        self.get(logical_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Handles removed after declaration, in removal order.
    pub fn removed(&self) -> &[ResourceHandle] {
        &self.removed
    }

    pub fn of_kind(&self, kind: ResourceKind) -> Vec<&ResourceRecord> {
        self.records
            .iter()
            .filter(|r| r.handle.kind() == kind)
            .collect()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.records.iter().filter(|r| r.handle.kind() == kind).count()
    }

    pub fn tag_value(&self, logical_id: &str, key: &str) -> Option<&str> {
        self.get(logical_id).and_then(|r| r.tag(key))
    }

    /// Routes declared in the given route table.
    pub fn routes_in(&self, route_table: &str) -> Vec<&RouteProps> {
        self.records
            .iter()
            .filter_map(|r| match &r.resource {
                Resource::Route(p) if p.route_table_id.points_to(route_table) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Route table a subnet is associated with.
    pub fn route_table_of(&self, subnet: &str) -> Option<&str> {
        self.records.iter().find_map(|r| match &r.resource {
            Resource::SubnetRouteTableAssociation(p) if p.subnet_id.points_to(subnet) => {
                Some(p.route_table_id.target())
            }
            _ => None,
        })
    }

    /// Every network ACL a subnet is associated with.
    pub fn acls_of(&self, subnet: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| match &r.resource {
                Resource::SubnetNetworkAclAssociation(p) if p.subnet_id.points_to(subnet) => {
                    Some(p.network_acl_id.target())
                }
                _ => None,
            })
            .collect()
    }

    /// Entries of a network ACL in declaration order.
    pub fn acl_entries(&self, acl: &str) -> Vec<&NetworkAclEntryProps> {
        self.records
            .iter()
            .filter_map(|r| match &r.resource {
                Resource::NetworkAclEntry(p) if p.network_acl_id.points_to(acl) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Render the recorded graph.
    pub fn into_template(self, stack: StackDescriptor) -> EngineResult<Template> {
        let mut resources = serde_json::Map::new();

        for record in &self.records {
            let mut value = serde_json::to_value(&record.resource)?;
            if record.handle.kind().is_taggable() {
                let mut tags = record.tags.clone();
                for tag in &self.stack_tags {
                    if !tags.iter().any(|t| t.key == tag.key) {
                        tags.push(tag.clone());
                    }
                }
                if !tags.is_empty() {
                    if let Some(props) = value.get_mut("Properties").and_then(Value::as_object_mut) {
                        props.insert("Tags".to_string(), serde_json::to_value(&tags)?);
                    }
                }
            }
            resources.insert(record.logical_id().to_string(), value);
        }

        let description = stack
            .description
            .clone()
            .unwrap_or_else(|| format!("Network topology for stack {}", stack.stack_name));

        Ok(Template {
            description,
            metadata: TemplateMetadata {
                stack_name: stack.stack_name,
                region: stack.region,
                account_id: stack.account_id,
                generated_at: Utc::now(),
                resource_count: resources.len(),
                stack_tags: self.stack_tags,
            },
            resources,
        })
    }

    fn position(&self, logical_id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.logical_id() == logical_id)
    }

    fn push(&mut self, logical_id: &str, resource: Resource, implicit: bool) -> ResourceHandle {
        let handle = ResourceHandle::new(logical_id, resource.kind());
        debug!("Declared {}", handle);
        self.records.push(ResourceRecord {
            handle: handle.clone(),
            resource,
            tags: Vec::new(),
            implicit,
        });
        handle
    }

    fn attach_default_routing(&mut self, subnet: &ResourceHandle, resource: &Resource) -> Vec<ResourceHandle> {
        let Resource::Subnet(props) = resource else {
            return Vec::new();
        };

        let table = self.push(
            &format!("{}RouteTable", subnet.logical_id()),
            Resource::RouteTable(RouteTableProps {
                vpc_id: props.vpc_id.clone(),
            }),
            true,
        );
        let association = self.push(
            &format!("{}RouteTableAssociation", subnet.logical_id()),
            Resource::SubnetRouteTableAssociation(SubnetRouteTableAssociationProps {
                route_table_id: table.reference(),
                subnet_id: subnet.reference(),
            }),
            true,
        );
        vec![table, association]
    }
}

impl ProvisioningEngine for RecordingEngine {
    fn declare(&mut self, logical_id: &str, resource: Resource) -> EngineResult<Declared> {
        if logical_id.is_empty() {
            return Err(EngineError::Rejected("empty logical id".to_string()));
        }
        if self.contains(logical_id) {
            return Err(EngineError::DuplicateResource(logical_id.to_string()));
        }
        for reference in resource.references() {
            if !self.contains(reference.target()) {
                return Err(EngineError::UnresolvedReference {
                    from: logical_id.to_string(),
                    target: reference.target().to_string(),
                });
            }
        }

        let is_subnet = resource.kind() == ResourceKind::Subnet;
        let implicit_source = if is_subnet && self.implicit_subnet_routing {
            Some(resource.clone())
        } else {
            None
        };

        let handle = self.push(logical_id, resource, false);
        let implicit = match implicit_source {
            Some(subnet) => self.attach_default_routing(&handle, &subnet),
            None => Vec::new(),
        };

        Ok(Declared::new(handle).with_implicit(implicit))
    }

    fn remove(&mut self, handle: &ResourceHandle) -> EngineResult<()> {
        let index = self
            .position(handle.logical_id())
            .ok_or_else(|| EngineError::UnknownResource(handle.logical_id().to_string()))?;

        if let Some(dependent) = self
            .records
            .iter()
            .find(|r| r.resource.refers_to(handle.logical_id()))
        {
            return Err(EngineError::StillReferenced {
                id: handle.logical_id().to_string(),
                by: dependent.logical_id().to_string(),
            });
        }

        let record = self.records.remove(index);
        debug!("Removed {}", record.handle);
        self.removed.push(record.handle);
        Ok(())
    }

    fn tag(&mut self, handle: &ResourceHandle, key: &str, value: &str) -> EngineResult<()> {
        let index = self
            .position(handle.logical_id())
            .ok_or_else(|| EngineError::UnknownResource(handle.logical_id().to_string()))?;

        let record = &mut self.records[index];
        if !record.handle.kind().is_taggable() {
            return Err(EngineError::NotTaggable(handle.logical_id().to_string()));
        }
        upsert_tag(&mut record.tags, Tag::new(key, value));
        Ok(())
    }
}

fn upsert_tag(tags: &mut Vec<Tag>, tag: Tag) {
    match tags.iter_mut().find(|t| t.key == tag.key) {
        Some(existing) => existing.value = tag.value,
        None => tags.push(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{InternetGatewayProps, SubnetProps, VpcProps};

    fn engine_with_vpc() -> (RecordingEngine, ResourceHandle) {
        let mut engine = RecordingEngine::new();
        let vpc = engine
            .declare("vpc", Resource::Vpc(VpcProps::new("10.0.0.0/16")))
            .unwrap()
            .handle;
        (engine, vpc)
    }

    fn subnet(vpc: &ResourceHandle) -> Resource {
        Resource::Subnet(SubnetProps {
            vpc_id: vpc.reference(),
            availability_zone: "ap-southeast-2a".to_string(),
            cidr_block: "10.0.0.0/24".to_string(),
            map_public_ip_on_launch: false,
        })
    }

    #[test]
    fn test_declare_rejects_duplicates() {
        let (mut engine, _) = engine_with_vpc();
        let err = engine
            .declare("vpc", Resource::Vpc(VpcProps::new("10.1.0.0/16")))
            .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateResource(id) if id == "vpc"));
    }

    #[test]
    fn test_declare_rejects_dangling_reference() {
        let mut engine = RecordingEngine::new();
        let ghost = ResourceHandle::new("ghost", ResourceKind::Vpc);
        let err = engine.declare("PublicSubneta", subnet(&ghost)).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference { target, .. } if target == "ghost"));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_subnet_gets_implicit_routing() {
        let (mut engine, vpc) = engine_with_vpc();
        let declared = engine.declare("PublicSubneta", subnet(&vpc)).unwrap();

        assert_eq!(declared.implicit.len(), 2);
        assert_eq!(declared.implicit[0].kind(), ResourceKind::RouteTable);
        assert_eq!(declared.implicit[1].kind(), ResourceKind::SubnetRouteTableAssociation);
        assert_eq!(engine.route_table_of("PublicSubneta"), Some("PublicSubnetaRouteTable"));
        assert!(engine.get("PublicSubnetaRouteTable").unwrap().implicit);
    }

    #[test]
    fn test_implicit_routing_can_be_disabled() {
        let mut engine = RecordingEngine::new().with_implicit_subnet_routing(false);
        let vpc = engine
            .declare("vpc", Resource::Vpc(VpcProps::new("10.0.0.0/16")))
            .unwrap()
            .handle;
        let declared = engine.declare("DataSubneta", subnet(&vpc)).unwrap();
        assert!(declared.implicit.is_empty());
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_remove_refuses_referenced_resource() {
        let (mut engine, vpc) = engine_with_vpc();
        let declared = engine.declare("PublicSubneta", subnet(&vpc)).unwrap();

        let table = &declared.implicit[0];
        let err = engine.remove(table).unwrap_err();
        assert!(matches!(err, EngineError::StillReferenced { .. }));

        engine.remove(&declared.implicit[1]).unwrap();
        engine.remove(table).unwrap();
        assert_eq!(engine.removed().len(), 2);
        assert!(engine.route_table_of("PublicSubneta").is_none());
    }

    #[test]
    fn test_tagging_rules() {
        let (mut engine, vpc) = engine_with_vpc();
        engine.tag(&vpc, "Name", "first").unwrap();
        engine.tag(&vpc, "Name", "second").unwrap();
        assert_eq!(engine.tag_value("vpc", "Name"), Some("second"));

        let igw = engine
            .declare("InternetGateway", Resource::InternetGateway(InternetGatewayProps {}))
            .unwrap()
            .handle;
        engine.tag(&igw, "Name", "IGW").unwrap();

        let missing = ResourceHandle::new("nope", ResourceKind::Vpc);
        assert!(matches!(
            engine.tag(&missing, "Name", "x"),
            Err(EngineError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_template_merges_stack_tags() {
        let (mut engine, vpc) = engine_with_vpc();
        engine.tag(&vpc, "Name", "main").unwrap();
        engine.tag_stack("environment", "kate");
        engine.tag_stack("Name", "stack-name");

        let template = engine
            .into_template(StackDescriptor::new("vpc-kate", "ap-southeast-2"))
            .unwrap();

        let tags = &template.resource("vpc").unwrap()["Properties"]["Tags"];
        let tags: Vec<Tag> = serde_json::from_value(tags.clone()).unwrap();
        assert_eq!(
            tags,
            vec![Tag::new("Name", "main"), Tag::new("environment", "kate")]
        );
        assert_eq!(template.metadata.resource_count, 1);
        assert_eq!(template.description, "Network topology for stack vpc-kate");
    }

    #[test]
    fn test_template_keeps_declaration_order() {
        let (mut engine, vpc) = engine_with_vpc();
        engine
            .declare("InternetGateway", Resource::InternetGateway(InternetGatewayProps {}))
            .unwrap();
        engine.declare("PublicSubneta", subnet(&vpc)).unwrap();

        let template = engine
            .into_template(StackDescriptor::new("vpc-kate", "ap-southeast-2"))
            .unwrap();

        let ids: Vec<&str> = template.resources.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec![
                "vpc",
                "InternetGateway",
                "PublicSubneta",
                "PublicSubnetaRouteTable",
                "PublicSubnetaRouteTableAssociation"
            ]
        );

        let json = template.to_json_pretty().unwrap();
        let vpc_at = json.find("\"vpc\"").unwrap();
        let gateway_at = json.find("\"InternetGateway\"").unwrap();
        assert!(vpc_at < gateway_at);
    }
}

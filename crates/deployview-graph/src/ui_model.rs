use crate::graph::{GraphNode, NodeFont, NodeSize};
use deployview_core::{ResourceRecord, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPlacement {
    pub location: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<NodeFont>,
}

/// A resource as handed to the renderer: the input record plus where to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUIModel {
    #[serde(flatten)]
    pub resource: ResourceRecord,
    pub level: u32,
    pub weight: u32,
    pub ui: UiPlacement,
    pub is_group: bool,
}

impl ResourceUIModel {
    pub fn from_node(node: &GraphNode) -> Self {
        Self {
            resource: node.resource.clone(),
            level: node.level,
            weight: node.weight,
            ui: UiPlacement {
                location: node.location,
                size: node.size,
                font: node.font,
            },
            is_group: node.is_group,
        }
    }

    /// Members of a collapsed group are never placed themselves.
    pub fn unplaced(resource: ResourceRecord) -> Self {
        Self {
            resource,
            level: 0,
            weight: 0,
            ui: UiPlacement {
                location: Vec2::default(),
                size: None,
                font: None,
            },
            is_group: false,
        }
    }

    pub fn uid(&self) -> &str {
        &self.resource.uid
    }
}

/// Result of one layout run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentLayout {
    pub resources: Vec<ResourceUIModel>,
    /// Collapsed members, keyed by the uid of the group node that replaced them.
    pub resource_groups: BTreeMap<String, Vec<ResourceUIModel>>,
}

impl DeploymentLayout {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn find(&self, uid: &str) -> Option<&ResourceUIModel> {
        self.resources.iter().find(|r| r.uid() == uid)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

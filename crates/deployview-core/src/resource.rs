use crate::{LayoutError, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub uid: String,
    #[serde(default = "default_owner_kind")]
    pub kind: ResourceKind,
    #[serde(default)]
    pub name: String,
}

fn default_owner_kind() -> ResourceKind {
    ResourceKind::Other("N/A".to_string())
}

/// One cluster object as delivered by data collection.
///
/// The layout engine reads `uid`, `kind`, `owner_reference` and
/// `depends_on_uids`; everything else is passed through to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    pub uid: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_reference: Option<OwnerReference>,
    /// Soft dependency edges, in declaration order.
    #[serde(default, rename = "dependsOnUIDs", skip_serializing_if = "Vec::is_empty")]
    pub depends_on_uids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_status: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Named sub-components, e.g. the containers of a pod.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub childs: Vec<String>,
}

impl ResourceRecord {
    pub fn new(uid: impl Into<String>, kind: impl Into<ResourceKind>) -> Self {
        Self {
            uid: uid.into(),
            kind: kind.into(),
            name: String::new(),
            namespace: None,
            creation_timestamp: None,
            owner_reference: None,
            depends_on_uids: Vec::new(),
            status: None,
            full_status: None,
            spec: None,
            labels: BTreeMap::new(),
            childs: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn owned_by(mut self, uid: impl Into<String>, kind: impl Into<ResourceKind>) -> Self {
        self.owner_reference = Some(OwnerReference {
            uid: uid.into(),
            kind: kind.into(),
            name: String::new(),
        });
        self
    }

    pub fn depends_on(mut self, uid: impl Into<String>) -> Self {
        self.depends_on_uids.push(uid.into());
        self
    }

    /// Parse a JSON array of records in the dashboard wire format.
    pub fn parse_snapshot(json: &str) -> Result<Vec<ResourceRecord>, LayoutError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Whether the record is the pod running the operator itself.
pub fn is_operator_pod(resource: &ResourceRecord) -> bool {
    resource.kind == ResourceKind::Pod
        && resource.name.contains("operator")
        && !resource.name.contains("operator-ui")
        && resource
            .owner_reference
            .as_ref()
            .is_some_and(|owner| owner.kind == ResourceKind::ReplicaSet)
}

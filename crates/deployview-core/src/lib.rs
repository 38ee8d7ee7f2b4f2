use serde::{Deserialize, Serialize};
use std::fmt;

pub mod error;
pub mod resource;
pub mod settings;

pub use error::LayoutError;
pub use resource::{OwnerReference, ResourceRecord, is_operator_pod};
pub use settings::{
    DisplaySettings, LayoutConfig, NamespaceMargin, NetworkLayout, ResourceVisibility,
};

/// Cluster name reported when the dashboard runs inside the cluster it inspects.
pub const IN_CLUSTER_CONTEXT: &str = "inClusterContext";

/// Kind tag of a cluster resource.
///
/// The well-known Kubernetes and MongoDB kinds get their own variants so the
/// default policy and bias tables can be written against them. Anything else
/// (custom resources, kinds added by newer operators) is kept verbatim in
/// `Other`. The wire form is always the plain kind string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    // Kubernetes
    Pod,
    Deployment,
    ReplicaSet,
    StatefulSet,
    Secret,
    Service,
    ConfigMap,
    CustomResourceDefinition,
    PersistentVolumeClaim,
    PersistentVolume,
    Namespace,

    // MongoDB
    MongoDB,
    MongoDBMulti,
    MongoDBCommunity,
    MongoDBUser,
    MongoDBOpsManager,
    MongoDBOperator,

    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::ReplicaSet => "ReplicaSet",
            ResourceKind::StatefulSet => "StatefulSet",
            ResourceKind::Secret => "Secret",
            ResourceKind::Service => "Service",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::CustomResourceDefinition => "CustomResourceDefinition",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
            ResourceKind::PersistentVolume => "PersistentVolume",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::MongoDB => "MongoDB",
            ResourceKind::MongoDBMulti => "MongoDBMulti",
            ResourceKind::MongoDBCommunity => "MongoDBCommunity",
            ResourceKind::MongoDBUser => "MongoDBUser",
            ResourceKind::MongoDBOpsManager => "MongoDBOpsManager",
            ResourceKind::MongoDBOperator => "MongoDBOperator",
            ResourceKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for ResourceKind {
    fn from(value: &str) -> Self {
        match value {
            "Pod" => ResourceKind::Pod,
            "Deployment" => ResourceKind::Deployment,
            "ReplicaSet" => ResourceKind::ReplicaSet,
            "StatefulSet" => ResourceKind::StatefulSet,
            "Secret" => ResourceKind::Secret,
            "Service" => ResourceKind::Service,
            "ConfigMap" => ResourceKind::ConfigMap,
            "CustomResourceDefinition" => ResourceKind::CustomResourceDefinition,
            "PersistentVolumeClaim" => ResourceKind::PersistentVolumeClaim,
            "PersistentVolume" => ResourceKind::PersistentVolume,
            "Namespace" => ResourceKind::Namespace,
            "MongoDB" => ResourceKind::MongoDB,
            "MongoDBMulti" => ResourceKind::MongoDBMulti,
            "MongoDBCommunity" => ResourceKind::MongoDBCommunity,
            "MongoDBUser" => ResourceKind::MongoDBUser,
            "MongoDBOpsManager" => ResourceKind::MongoDBOpsManager,
            "MongoDBOperator" => ResourceKind::MongoDBOperator,
            other => ResourceKind::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceKind {
    fn from(value: String) -> Self {
        match ResourceKind::from(value.as_str()) {
            ResourceKind::Other(_) => ResourceKind::Other(value),
            known => known,
        }
    }
}

impl From<ResourceKind> for String {
    fn from(value: ResourceKind) -> Self {
        match value {
            ResourceKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

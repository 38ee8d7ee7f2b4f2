use deployview_core::{LayoutError, ResourceRecord, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// (uid, parent uid, sorted child uids, sorted dependency uids)
pub type AdjacencyRow = (String, Option<String>, Vec<String>, Vec<String>);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFont {
    pub size: u32,
    pub bold: bool,
}

/// One resource (or synthetic group) during a single layout run.
///
/// Relations are indices into the owning [`Graph`], never references, so a
/// node can be dropped mid-pass without leaving anything dangling.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub resource: ResourceRecord,

    // Ownership
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,

    // Soft dependencies
    pub depends_on: Vec<NodeIndex>,
    pub dependents: Vec<NodeIndex>,

    // Layout
    pub level: u32,
    pub weight: u32,
    pub location: Vec2,
    pub size: Option<NodeSize>,
    pub font: Option<NodeFont>,

    pub is_group: bool,
}

impl GraphNode {
    pub fn new(resource: ResourceRecord) -> Self {
        Self {
            resource,
            parent: None,
            children: Vec::new(),
            depends_on: Vec::new(),
            dependents: Vec::new(),
            level: 0,
            weight: 0,
            location: Vec2::default(),
            size: None,
            font: None,
            is_group: false,
        }
    }

    pub fn uid(&self) -> &str {
        &self.resource.uid
    }

    /// No parent, no children and no soft edge in either direction.
    pub fn is_isolated(&self) -> bool {
        self.parent.is_none()
            && self.children.is_empty()
            && self.depends_on.is_empty()
            && self.dependents.is_empty()
    }
}

/// Slot arena. Removed nodes leave an empty slot so indices stay stable.
#[derive(Debug, Default)]
pub struct Graph {
    slots: Vec<Option<GraphNode>>,
}

impl Graph {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let idx = NodeIndex(self.slots.len());
        self.slots.push(Some(node));
        idx
    }

    pub fn take_node(&mut self, index: NodeIndex) -> Option<GraphNode> {
        self.slots.get_mut(index.0).and_then(Option::take)
    }

    pub fn contains(&self, index: NodeIndex) -> bool {
        self.node_weight(index).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Live node indices in insertion order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeIndex(i))
    }

    pub fn node_weight(&self, index: NodeIndex) -> Option<&GraphNode> {
        self.slots.get(index.0).and_then(Option::as_ref)
    }

    pub fn node_weight_mut(&mut self, index: NodeIndex) -> Option<&mut GraphNode> {
        self.slots.get_mut(index.0).and_then(Option::as_mut)
    }
}

impl Index<NodeIndex> for Graph {
    type Output = GraphNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        match self.node_weight(index) {
            Some(node) => node,
            None => panic!("node {index} is not in the graph"),
        }
    }
}

impl IndexMut<NodeIndex> for Graph {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        match self.node_weight_mut(index) {
            Some(node) => node,
            None => panic!("node {index} is not in the graph"),
        }
    }
}

/// Node arena plus the uid lookup used to resolve references.
#[derive(Debug, Default)]
pub struct GraphModel {
    pub graph: Graph,
    pub node_map: HashMap<String, NodeIndex>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build the node arena for a snapshot and wire its relations.
    ///
    /// Fails on an empty or duplicate uid; dangling references are dropped.
    pub fn from_resources(
        resources: impl IntoIterator<Item = ResourceRecord>,
    ) -> Result<Self, LayoutError> {
        let mut model = Self::new();
        for resource in resources {
            model.add_resource(resource)?;
        }
        model.link_relations();
        Ok(model)
    }

    pub fn add_resource(&mut self, resource: ResourceRecord) -> Result<NodeIndex, LayoutError> {
        if resource.uid.is_empty() {
            return Err(LayoutError::EmptyUid {
                kind: resource.kind.to_string(),
                name: resource.name,
            });
        }
        if self.node_map.contains_key(&resource.uid) {
            return Err(LayoutError::DuplicateUid(resource.uid));
        }
        Ok(self.insert_node(GraphNode::new(resource)))
    }

    /// Insert an already-built node (used for synthetic nodes).
    pub fn insert_node(&mut self, node: GraphNode) -> NodeIndex {
        let uid = node.resource.uid.clone();
        let idx = self.graph.add_node(node);
        self.node_map.insert(uid, idx);
        idx
    }

    /// Resolve owner references and dependency uids into adjacency.
    ///
    /// A missing owner makes the node a forest root; a missing dependency
    /// target is skipped.
    pub fn link_relations(&mut self) {
        let indices: Vec<_> = self.graph.node_indices().collect();
        for node_idx in &indices {
            let node = &mut self.graph[*node_idx];
            node.parent = None;
            node.children.clear();
            node.depends_on.clear();
            node.dependents.clear();
        }

        for node_idx in indices {
            let owner_uid = self.graph[node_idx]
                .resource
                .owner_reference
                .as_ref()
                .map(|owner| owner.uid.clone());
            if let Some(owner_uid) = owner_uid {
                match self.node_map.get(&owner_uid).copied() {
                    Some(parent_idx) => {
                        self.graph[node_idx].parent = Some(parent_idx);
                        self.graph[parent_idx].children.push(node_idx);
                    }
                    None => tracing::debug!(
                        "Owner {} of {} is not in the snapshot, treating it as a root",
                        owner_uid,
                        self.graph[node_idx].uid()
                    ),
                }
            }

            let dependency_uids = self.graph[node_idx].resource.depends_on_uids.clone();
            for dependency_uid in dependency_uids {
                match self.node_map.get(&dependency_uid).copied() {
                    Some(target_idx) => {
                        self.graph[node_idx].depends_on.push(target_idx);
                        self.graph[target_idx].dependents.push(node_idx);
                    }
                    None => tracing::debug!(
                        "Dropping dependency {} -> {}: target is not in the snapshot",
                        self.graph[node_idx].uid(),
                        dependency_uid
                    ),
                }
            }
        }
    }

    /// Remove a node and repair every relation that pointed at it.
    ///
    /// Children become roots; they are not handed to the grandparent.
    pub fn remove_node(&mut self, node_idx: NodeIndex) -> Option<GraphNode> {
        let node = self.graph.take_node(node_idx)?;
        self.node_map.remove(node.uid());

        if let Some(parent) = node.parent.and_then(|p| self.graph.node_weight_mut(p)) {
            parent.children.retain(|&c| c != node_idx);
        }
        for &child_idx in &node.children {
            if let Some(child) = self.graph.node_weight_mut(child_idx) {
                child.parent = None;
            }
        }
        for &dependent_idx in &node.dependents {
            if let Some(dependent) = self.graph.node_weight_mut(dependent_idx) {
                dependent.depends_on.retain(|&d| d != node_idx);
            }
        }
        for &target_idx in &node.depends_on {
            if let Some(target) = self.graph.node_weight_mut(target_idx) {
                target.dependents.retain(|&d| d != node_idx);
            }
        }

        Some(node)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn get_node(&self, uid: &str) -> Option<&GraphNode> {
        self.node_map.get(uid).map(|&idx| &self.graph[idx])
    }

    pub fn get_node_mut(&mut self, uid: &str) -> Option<&mut GraphNode> {
        self.node_map.get(uid).map(|&idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, uid: &str) -> Option<NodeIndex> {
        self.node_map.get(uid).copied()
    }

    /// Forest roots in insertion order.
    pub fn roots(&self) -> Vec<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&idx| self.graph[idx].parent.is_none())
            .collect()
    }

    /// Uids of the nodes a node depends on, in edge order.
    pub fn dependency_uids(&self, node_idx: NodeIndex) -> Vec<String> {
        self.graph[node_idx]
            .depends_on
            .iter()
            .map(|&d| self.graph[d].uid().to_string())
            .collect()
    }

    /// Order-insensitive view of the adjacency, keyed by uid.
    pub fn adjacency_snapshot(&self) -> Vec<AdjacencyRow> {
        let uid = |idx: NodeIndex| self.graph[idx].uid().to_string();
        let mut snapshot: Vec<_> = self
            .graph
            .node_indices()
            .map(|idx| {
                let node = &self.graph[idx];
                let mut children: Vec<String> = node.children.iter().map(|&c| uid(c)).collect();
                children.sort();
                let mut depends_on: Vec<String> =
                    node.depends_on.iter().map(|&d| uid(d)).collect();
                depends_on.sort();
                (uid(idx), node.parent.map(uid), children, depends_on)
            })
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Live nodes ordered so that every parent and every dependency target
    /// comes before the nodes it constrains.
    ///
    /// Ties keep insertion order. Fails with the uids left unordered when the
    /// ownership and dependency relations form a cycle.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, LayoutError> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        let mut ready = VecDeque::new();
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let incoming = usize::from(node.parent.is_some()) + node.depends_on.len();
            in_degree.insert(idx, incoming);
            if incoming == 0 {
                ready.push_back(idx);
            }
        }

        let mut order = Vec::with_capacity(in_degree.len());
        while let Some(idx) = ready.pop_front() {
            order.push(idx);
            let node = &self.graph[idx];
            for &next in node.children.iter().chain(node.dependents.iter()) {
                if let Some(d) = in_degree.get_mut(&next) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push_back(next);
                    }
                }
            }
        }

        if order.len() == in_degree.len() {
            return Ok(order);
        }

        let ordered: HashSet<NodeIndex> = order.into_iter().collect();
        let mut uids: Vec<String> = self
            .graph
            .node_indices()
            .filter(|idx| !ordered.contains(idx))
            .map(|idx| self.graph[idx].uid().to_string())
            .collect();
        uids.sort();
        Err(LayoutError::RelationCycle { uids })
    }

    /// Uids of the nodes caught in (or behind) a relation cycle, if any.
    pub fn find_relation_cycle(&self) -> Option<Vec<String>> {
        match self.topological_order() {
            Err(LayoutError::RelationCycle { uids }) => Some(uids),
            _ => None,
        }
    }
}

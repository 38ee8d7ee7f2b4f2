use crate::graph::{GraphModel, NodeIndex};
use deployview_core::{DisplaySettings, ResourceKind, ResourceRecord, ResourceVisibility};
use std::collections::BTreeMap;

/// Copy of a node taken right before a `ShowGrouped` policy removed it.
///
/// Relations are kept as uids because the indices they came from may be
/// gone by the time the group is synthesized.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedMember {
    pub resource: ResourceRecord,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub depends_on: Vec<String>,
}

pub type GroupedNodes = BTreeMap<ResourceKind, Vec<GroupedMember>>;

/// Applies the per-kind display policy to a graph.
pub struct VisibilityReducer<'a> {
    settings: &'a DisplaySettings,
}

impl<'a> VisibilityReducer<'a> {
    /// Removing a node can isolate a neighbour, so the policy runs twice.
    /// Isolation that needs a third pass to surface is left in place.
    pub const PASSES: usize = 2;

    pub fn new(settings: &'a DisplaySettings) -> Self {
        Self { settings }
    }

    pub fn reduce(&self, model: &mut GraphModel) -> GroupedNodes {
        let mut grouped = GroupedNodes::new();
        for pass in 0..Self::PASSES {
            let removed = self.apply_pass(model, &mut grouped);
            tracing::debug!(
                "Visibility pass {} removed {} nodes, {} remain",
                pass + 1,
                removed,
                model.node_count()
            );
        }
        grouped
    }

    /// One sweep over the live nodes in insertion order. Returns how many
    /// nodes were removed.
    pub fn apply_pass(&self, model: &mut GraphModel, grouped: &mut GroupedNodes) -> usize {
        let indices: Vec<NodeIndex> = model.graph.node_indices().collect();
        let mut removed = 0;

        for node_idx in indices {
            let Some(node) = model.graph.node_weight(node_idx) else {
                continue;
            };
            let remove = match self.settings.visibility(&node.resource.kind) {
                ResourceVisibility::Show => false,
                ResourceVisibility::Hide => true,
                ResourceVisibility::ShowOnlyIfReferenced => {
                    node.is_isolated() && !Self::referenced_by_group(grouped, node.uid())
                }
                ResourceVisibility::ShowGrouped => {
                    let member = Self::snapshot_member(model, node_idx);
                    grouped
                        .entry(member.resource.kind.clone())
                        .or_default()
                        .push(member);
                    true
                }
            };

            if remove && model.remove_node(node_idx).is_some() {
                removed += 1;
            }
        }

        removed
    }

    /// Collapsed members still point at their relations; a group will
    /// inherit those edges, so they count as references.
    fn referenced_by_group(grouped: &GroupedNodes, uid: &str) -> bool {
        grouped.values().flatten().any(|member| {
            member.parent.as_deref() == Some(uid)
                || member.children.iter().any(|c| c == uid)
                || member.depends_on.iter().any(|d| d == uid)
        })
    }

    fn snapshot_member(model: &GraphModel, node_idx: NodeIndex) -> GroupedMember {
        let node = &model.graph[node_idx];
        let uid = |idx: NodeIndex| model.graph[idx].uid().to_string();
        GroupedMember {
            resource: node.resource.clone(),
            parent: node.parent.map(uid),
            children: node.children.iter().map(|&c| uid(c)).collect(),
            depends_on: node.depends_on.iter().map(|&d| uid(d)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(uid: &str, kind: ResourceKind) -> ResourceRecord {
        ResourceRecord::new(uid, kind)
    }

    fn sample_model() -> GraphModel {
        GraphModel::from_resources(vec![
            record("mdb", ResourceKind::MongoDB),
            record("sts", ResourceKind::StatefulSet).owned_by("mdb", ResourceKind::MongoDB),
            record("p0", ResourceKind::Pod).owned_by("sts", ResourceKind::StatefulSet),
            record("p1", ResourceKind::Pod)
                .owned_by("sts", ResourceKind::StatefulSet)
                .depends_on("secret"),
            record("secret", ResourceKind::Secret),
            record("crd", ResourceKind::CustomResourceDefinition),
        ])
        .unwrap()
    }

    #[test]
    fn test_show_all_leaves_graph_untouched() {
        let mut model = sample_model();
        let before = model.adjacency_snapshot();

        let settings = DisplaySettings::show_all();
        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);

        assert!(grouped.is_empty());
        assert_eq!(model.adjacency_snapshot(), before);
    }

    #[test]
    fn test_hide_orphans_children_and_drops_edges() {
        let mut model = sample_model();
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::StatefulSet, ResourceVisibility::Hide)
            .with_visibility(ResourceKind::Secret, ResourceVisibility::Hide);

        VisibilityReducer::new(&settings).reduce(&mut model);

        assert!(model.get_node("sts").is_none());
        assert!(model.get_node("secret").is_none());
        assert!(model.get_node("mdb").unwrap().children.is_empty());
        assert_eq!(model.get_node("p0").unwrap().parent, None);
        assert_eq!(model.get_node("p1").unwrap().parent, None);
        assert!(model.get_node("p1").unwrap().depends_on.is_empty());
    }

    #[test]
    fn test_show_only_if_referenced_keeps_connected_nodes() {
        let mut model = sample_model();
        let settings = DisplaySettings::show_all()
            .with_visibility(
                ResourceKind::CustomResourceDefinition,
                ResourceVisibility::ShowOnlyIfReferenced,
            )
            .with_visibility(ResourceKind::Secret, ResourceVisibility::ShowOnlyIfReferenced);

        VisibilityReducer::new(&settings).reduce(&mut model);

        assert!(model.get_node("crd").is_none());
        assert!(model.get_node("secret").is_some());
    }

    #[test]
    fn test_second_pass_removes_newly_isolated_nodes() {
        let build = || {
            GraphModel::from_resources(vec![
                record("a", ResourceKind::Deployment),
                record("b", ResourceKind::ReplicaSet).owned_by("a", ResourceKind::Deployment),
                record("c", ResourceKind::Pod).owned_by("b", ResourceKind::ReplicaSet),
            ])
            .unwrap()
        };
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::Deployment, ResourceVisibility::Hide)
            .with_visibility(
                ResourceKind::ReplicaSet,
                ResourceVisibility::ShowOnlyIfReferenced,
            )
            .with_visibility(ResourceKind::Pod, ResourceVisibility::Hide);
        let reducer = VisibilityReducer::new(&settings);

        let mut single = build();
        reducer.apply_pass(&mut single, &mut GroupedNodes::new());
        assert_eq!(single.node_count(), 1);
        assert!(single.get_node("b").unwrap().is_isolated());

        let mut model = build();
        reducer.reduce(&mut model);
        assert_eq!(model.node_count(), 0);
    }

    #[test]
    fn test_second_pass_follows_dependency_edges() {
        let mut model = GraphModel::from_resources(vec![
            record("secret", ResourceKind::Secret),
            record("user", ResourceKind::MongoDBUser).depends_on("secret"),
        ])
        .unwrap();
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::MongoDBUser, ResourceVisibility::Hide)
            .with_visibility(ResourceKind::Secret, ResourceVisibility::ShowOnlyIfReferenced);

        let reducer = VisibilityReducer::new(&settings);

        reducer.apply_pass(&mut model, &mut GroupedNodes::new());
        assert!(model.get_node("secret").is_some());

        reducer.apply_pass(&mut model, &mut GroupedNodes::new());
        assert_eq!(model.node_count(), 0);
    }

    #[test]
    fn test_target_of_grouped_members_counts_as_referenced() {
        let mut model = GraphModel::from_resources(vec![
            record("crd", ResourceKind::CustomResourceDefinition),
            record("m1", ResourceKind::MongoDB).depends_on("crd"),
            record("m2", ResourceKind::MongoDB).depends_on("crd"),
            record("unused", ResourceKind::CustomResourceDefinition),
        ])
        .unwrap();
        let settings = DisplaySettings::show_all()
            .with_visibility(
                ResourceKind::CustomResourceDefinition,
                ResourceVisibility::ShowOnlyIfReferenced,
            )
            .with_visibility(ResourceKind::MongoDB, ResourceVisibility::ShowGrouped);

        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);

        assert_eq!(grouped[&ResourceKind::MongoDB].len(), 2);
        assert!(model.get_node("crd").unwrap().is_isolated());
        assert!(model.get_node("unused").is_none());
    }

    #[test]
    fn test_show_grouped_snapshots_then_removes() {
        let mut model = sample_model();
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::Pod, ResourceVisibility::ShowGrouped);

        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);

        let pods = &grouped[&ResourceKind::Pod];
        assert_eq!(pods.len(), 2);
        assert_eq!(pods[0].resource.uid, "p0");
        assert_eq!(pods[0].parent.as_deref(), Some("sts"));
        assert_eq!(pods[1].depends_on, vec!["secret".to_string()]);
        assert!(model.get_node("p0").is_none());
        assert!(model.get_node("sts").unwrap().children.is_empty());
        assert!(model.get_node("secret").unwrap().dependents.is_empty());
    }
}

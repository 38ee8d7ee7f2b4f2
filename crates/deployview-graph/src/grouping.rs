use crate::graph::{GraphModel, GraphNode, NodeIndex};
use crate::visibility::{GroupedMember, GroupedNodes};
use deployview_core::{LayoutError, ResourceKind, ResourceRecord};
use std::collections::HashSet;

pub const GROUP_UID_PREFIX: &str = "GROUP: ";

pub fn group_uid(kind: &ResourceKind) -> String {
    format!("{GROUP_UID_PREFIX}{kind}")
}

/// Turns the members collapsed by `ShowGrouped` into one synthetic node per kind.
pub struct GroupSynthesizer;

struct PendingGroup {
    kind: ResourceKind,
    member_count: usize,
    namespace: Option<String>,
    children: Vec<NodeIndex>,
    depends_on: Vec<NodeIndex>,
}

impl GroupSynthesizer {
    /// Insert the group nodes into `model` and return their indices.
    ///
    /// A group owns the union of its members' children that are still in
    /// the graph, and depends on the union of the members' dependency
    /// targets and original parents. A node the group owns is never also one
    /// it depends on.
    ///
    /// Fails when an input resource already uses a group uid, whether it is
    /// still in the graph or was itself collapsed.
    pub fn execute(
        model: &mut GraphModel,
        grouped: &GroupedNodes,
    ) -> Result<Vec<NodeIndex>, LayoutError> {
        // 1. Resolve what every group needs against the current graph.
        let mut pending = Vec::with_capacity(grouped.len());
        for (kind, members) in grouped {
            if members.is_empty() {
                continue;
            }
            let uid = group_uid(kind);
            if model.index_of(&uid).is_some() || members.iter().any(|m| m.resource.uid == uid) {
                return Err(LayoutError::DuplicateUid(uid));
            }

            let children = Self::live_union(model, members.iter().flat_map(|m| &m.children))
                .into_iter()
                .filter(|&idx| model.graph[idx].parent.is_none())
                .collect::<Vec<_>>();
            let owned: HashSet<NodeIndex> = children.iter().copied().collect();
            let depends_on = Self::live_union(model, Self::member_dependencies(members))
                .into_iter()
                .filter(|idx| !owned.contains(idx))
                .collect();

            pending.push(PendingGroup {
                kind: kind.clone(),
                member_count: members.len(),
                namespace: members[0].resource.namespace.clone(),
                children,
                depends_on,
            });
        }

        // 2. Apply mutations
        let mut created = Vec::with_capacity(pending.len());
        for group in pending {
            let mut resource = ResourceRecord::new(group_uid(&group.kind), group.kind.clone())
                .with_name(format!("{} x{}", group.kind, group.member_count));
            resource.namespace = group.namespace;

            let mut node = GraphNode::new(resource);
            node.is_group = true;
            let group_idx = model.insert_node(node);

            for &child_idx in &group.children {
                model.graph[child_idx].parent = Some(group_idx);
            }
            for &target_idx in &group.depends_on {
                model.graph[target_idx].dependents.push(group_idx);
            }
            let group_node = &mut model.graph[group_idx];
            group_node.children = group.children;
            group_node.depends_on = group.depends_on;
            model.graph[group_idx].resource.depends_on_uids = model.dependency_uids(group_idx);

            tracing::debug!(
                "Created group {} for {} members",
                model.graph[group_idx].uid(),
                group.member_count
            );
            created.push(group_idx);
        }

        Ok(created)
    }

    fn member_dependencies(members: &[GroupedMember]) -> impl Iterator<Item = &String> {
        members
            .iter()
            .flat_map(|m| &m.depends_on)
            .chain(members.iter().filter_map(|m| m.parent.as_ref()))
    }

    /// First-seen-order union of the uids that still resolve to a node.
    fn live_union<'m>(
        model: &GraphModel,
        uids: impl IntoIterator<Item = &'m String>,
    ) -> Vec<NodeIndex> {
        let mut seen = HashSet::new();
        uids.into_iter()
            .filter_map(|uid| model.index_of(uid))
            .filter(|idx| seen.insert(*idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visibility::VisibilityReducer;
    use deployview_core::{DisplaySettings, ResourceVisibility};

    fn grouped_model(resources: Vec<ResourceRecord>, kind: ResourceKind) -> GraphModel {
        let mut model = GraphModel::from_resources(resources).unwrap();
        let settings =
            DisplaySettings::show_all().with_visibility(kind, ResourceVisibility::ShowGrouped);
        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);
        GroupSynthesizer::execute(&mut model, &grouped).unwrap();
        model
    }

    #[test]
    fn test_group_dependencies_union_parents_and_targets() {
        let model = grouped_model(
            vec![
                ResourceRecord::new("p", ResourceKind::Secret),
                ResourceRecord::new("q", ResourceKind::MongoDB),
                ResourceRecord::new("x1", ResourceKind::MongoDBUser).depends_on("p"),
                ResourceRecord::new("x2", ResourceKind::MongoDBUser)
                    .owned_by("q", ResourceKind::MongoDB)
                    .depends_on("p"),
            ],
            ResourceKind::MongoDBUser,
        );

        let group = model.get_node("GROUP: MongoDBUser").unwrap();
        assert!(group.is_group);
        assert_eq!(group.resource.kind, ResourceKind::MongoDBUser);
        assert_eq!(
            group.resource.depends_on_uids,
            vec!["p".to_string(), "q".to_string()]
        );
        assert_eq!(group.parent, None);

        let group_idx = model.index_of("GROUP: MongoDBUser").unwrap();
        assert_eq!(model.get_node("p").unwrap().dependents, vec![group_idx]);
        assert_eq!(model.get_node("q").unwrap().dependents, vec![group_idx]);
        assert!(model.get_node("q").unwrap().children.is_empty());
    }

    #[test]
    fn test_group_adopts_deduplicated_children() {
        let model = grouped_model(
            vec![
                ResourceRecord::new("rs1", ResourceKind::ReplicaSet),
                ResourceRecord::new("rs2", ResourceKind::ReplicaSet),
                ResourceRecord::new("pod-a", ResourceKind::Pod)
                    .owned_by("rs1", ResourceKind::ReplicaSet),
                ResourceRecord::new("pod-b", ResourceKind::Pod)
                    .owned_by("rs2", ResourceKind::ReplicaSet),
            ],
            ResourceKind::ReplicaSet,
        );

        let group_idx = model.index_of("GROUP: ReplicaSet").unwrap();
        let group = &model.graph[group_idx];
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.resource.name, "ReplicaSet x2");
        assert_eq!(model.get_node("pod-a").unwrap().parent, Some(group_idx));
        assert_eq!(model.get_node("pod-b").unwrap().parent, Some(group_idx));
        assert_eq!(model.find_relation_cycle(), None);
    }

    #[test]
    fn test_group_never_depends_on_its_own_child() {
        let model = grouped_model(
            vec![
                ResourceRecord::new("cm", ResourceKind::ConfigMap),
                ResourceRecord::new("svc-a", ResourceKind::Service),
                ResourceRecord::new("svc-b", ResourceKind::Service).depends_on("cm"),
                ResourceRecord::new("child", ResourceKind::Pod)
                    .owned_by("svc-a", ResourceKind::Service),
            ],
            ResourceKind::Service,
        );

        let group = model.get_node("GROUP: Service").unwrap();
        assert_eq!(group.resource.depends_on_uids, vec!["cm".to_string()]);
        assert_eq!(model.find_relation_cycle(), None);

        let mut looping = GraphModel::from_resources(vec![
            ResourceRecord::new("svc-a", ResourceKind::Service),
            ResourceRecord::new("svc-b", ResourceKind::Service).depends_on("child"),
            ResourceRecord::new("child", ResourceKind::Pod)
                .owned_by("svc-a", ResourceKind::Service),
        ])
        .unwrap();
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::Service, ResourceVisibility::ShowGrouped);
        let grouped = VisibilityReducer::new(&settings).reduce(&mut looping);
        GroupSynthesizer::execute(&mut looping, &grouped).unwrap();

        let group = looping.get_node("GROUP: Service").unwrap();
        assert!(group.resource.depends_on_uids.is_empty());
        assert_eq!(group.children.len(), 1);
        assert_eq!(looping.find_relation_cycle(), None);
    }

    #[test]
    fn test_no_groups_without_grouped_members() {
        let mut model =
            GraphModel::from_resources(vec![ResourceRecord::new("a", ResourceKind::Pod)]).unwrap();
        let created = GroupSynthesizer::execute(&mut model, &GroupedNodes::new()).unwrap();
        assert!(created.is_empty());
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn test_taken_group_uid_is_rejected() {
        let settings = DisplaySettings::show_all()
            .with_visibility(ResourceKind::Pod, ResourceVisibility::ShowGrouped);

        // Taken by a node that stays in the graph.
        let mut model = GraphModel::from_resources(vec![
            ResourceRecord::new("GROUP: Pod", ResourceKind::Service),
            ResourceRecord::new("p0", ResourceKind::Pod),
        ])
        .unwrap();
        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);
        let err = GroupSynthesizer::execute(&mut model, &grouped).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateUid(uid) if uid == "GROUP: Pod"));

        // Taken by one of the collapsed members.
        let mut model = GraphModel::from_resources(vec![
            ResourceRecord::new("GROUP: Pod", ResourceKind::Pod),
            ResourceRecord::new("p0", ResourceKind::Pod),
        ])
        .unwrap();
        let grouped = VisibilityReducer::new(&settings).reduce(&mut model);
        let err = GroupSynthesizer::execute(&mut model, &grouped).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateUid(_)));
    }
}

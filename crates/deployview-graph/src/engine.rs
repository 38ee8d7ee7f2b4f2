use crate::graph::{GraphModel, NodeIndex};
use crate::grouping::{GroupSynthesizer, group_uid};
use crate::layout::{AutoLayouter, FixedLayouter, Layouter, NamespaceFrame};
use crate::ranking::RankAssigner;
use crate::ui_model::{DeploymentLayout, ResourceUIModel};
use crate::visibility::{GroupedNodes, VisibilityReducer};
use crate::weight::WeightCalculator;
use deployview_core::{
    DisplaySettings, LayoutConfig, LayoutError, NetworkLayout, ResourceRecord, Vec2,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Everything one layout run needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutRequest {
    pub resources: Vec<ResourceRecord>,
    pub settings: DisplaySettings,
    pub config: LayoutConfig,
    /// Background node for the fixed layout; none is drawn when unset.
    pub namespace: Option<NamespaceFrame>,
}

impl LayoutRequest {
    pub fn new(resources: Vec<ResourceRecord>) -> Self {
        Self {
            resources,
            ..Self::default()
        }
    }

    pub fn with_settings(mut self, settings: DisplaySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_namespace(mut self, frame: NamespaceFrame) -> Self {
        self.namespace = Some(frame);
        self
    }
}

/// Lay out a resource snapshot for the deployment view.
///
/// Relations are indexed, the display policy is applied (twice), collapsed
/// kinds are replaced by group nodes and the survivors are placed by the
/// layout the settings ask for. Fails on a duplicate or empty uid, and in
/// the fixed layout on a relation cycle.
pub fn compute_layout(request: LayoutRequest) -> Result<DeploymentLayout, LayoutError> {
    let LayoutRequest {
        resources,
        settings,
        config,
        namespace,
    } = request;

    if resources.is_empty() {
        return Ok(DeploymentLayout::default());
    }

    let mut model = GraphModel::from_resources(resources)?;
    let grouped = VisibilityReducer::new(&settings).reduce(&mut model);
    let groups = GroupSynthesizer::execute(&mut model, &grouped)?;
    tracing::debug!(
        "{} nodes to place, {} groups synthesized",
        model.node_count(),
        groups.len()
    );

    match settings.layout {
        NetworkLayout::Fixed => {
            RankAssigner::new(&config).assign(&mut model)?;
            WeightCalculator::new(&config).assign(&mut model);

            let layouter = FixedLayouter::new(&config);
            let positions = layouter.execute(&model);
            apply_positions(&mut model, positions);

            if let Some(frame) = &namespace {
                add_namespace_node(&mut model, &layouter, frame);
            }
        }
        NetworkLayout::AutoArrange => {
            let positions = AutoLayouter::new(&config).execute(&model);
            apply_positions(&mut model, positions);
        }
    }

    Ok(DeploymentLayout {
        resources: emit_resources(&model),
        resource_groups: emit_groups(grouped),
    })
}

fn apply_positions(model: &mut GraphModel, positions: HashMap<NodeIndex, Vec2>) {
    for (node_idx, location) in positions {
        if let Some(node) = model.graph.node_weight_mut(node_idx) {
            node.location = location;
        }
    }
}

fn add_namespace_node(
    model: &mut GraphModel,
    layouter: &FixedLayouter<'_>,
    frame: &NamespaceFrame,
) {
    if model.index_of(&frame.uid()).is_some() {
        tracing::warn!("Skipping namespace node: uid {} is already taken", frame.uid());
        return;
    }
    if let Some(node) = layouter.namespace_node(frame, model) {
        model.insert_node(node);
    }
}

fn emit_resources(model: &GraphModel) -> Vec<ResourceUIModel> {
    model
        .graph
        .node_indices()
        .map(|idx| {
            let mut resource = ResourceUIModel::from_node(&model.graph[idx]);
            resource.ui.location.x = resource.ui.location.x.round();
            resource
        })
        .collect()
}

/// Member lists keyed by the uid of the group node that replaced them.
fn emit_groups(grouped: GroupedNodes) -> BTreeMap<String, Vec<ResourceUIModel>> {
    grouped
        .into_iter()
        .map(|(kind, members)| {
            let members = members
                .into_iter()
                .map(|member| ResourceUIModel::unplaced(member.resource))
                .collect();
            (group_uid(&kind), members)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deployview_core::{ResourceKind, ResourceVisibility};

    #[test]
    fn test_empty_snapshot_gives_empty_layout() {
        let layout = compute_layout(
            LayoutRequest::new(Vec::new()).with_namespace(NamespaceFrame::new("c", "ns")),
        )
        .unwrap();
        assert!(layout.is_empty());
        assert!(layout.resource_groups.is_empty());
    }

    #[test]
    fn test_everything_hidden_has_no_namespace_node() {
        let request = LayoutRequest::new(vec![ResourceRecord::new("s", ResourceKind::Secret)])
            .with_namespace(NamespaceFrame::new("c", "ns"));
        let layout = compute_layout(request).unwrap();
        assert!(layout.is_empty());
    }

    #[test]
    fn test_x_is_rounded() {
        // Two levels, one node each: slots are 330.00000000000006 wide.
        let request = LayoutRequest::new(vec![
            ResourceRecord::new("1", ResourceKind::Deployment),
            ResourceRecord::new("2", ResourceKind::Pod).owned_by("1", ResourceKind::Deployment),
        ])
        .with_settings(DisplaySettings::show_all());
        let layout = compute_layout(request).unwrap();

        for resource in &layout.resources {
            assert_eq!(resource.ui.location.x, 165.0);
        }
    }

    #[test]
    fn test_group_members_are_listed_under_group_uid() {
        let request = LayoutRequest::new(vec![
            ResourceRecord::new("sts", ResourceKind::StatefulSet),
            ResourceRecord::new("p0", ResourceKind::Pod).owned_by("sts", ResourceKind::StatefulSet),
            ResourceRecord::new("p1", ResourceKind::Pod).owned_by("sts", ResourceKind::StatefulSet),
        ])
        .with_settings(
            DisplaySettings::show_all()
                .with_visibility(ResourceKind::Pod, ResourceVisibility::ShowGrouped),
        );
        let layout = compute_layout(request).unwrap();

        let group = layout.find("GROUP: Pod").unwrap();
        assert!(group.is_group);
        assert_eq!(group.resource.name, "Pod x2");
        assert_eq!(group.resource.depends_on_uids, vec!["sts".to_string()]);

        let members: Vec<&str> = layout.resource_groups["GROUP: Pod"]
            .iter()
            .map(|m| m.uid())
            .collect();
        assert_eq!(members, vec!["p0", "p1"]);
        assert!(layout.find("p0").is_none());
    }

    #[test]
    fn test_cycle_fails_fixed_layout_only() {
        let resources = vec![
            ResourceRecord::new("a", ResourceKind::Pod).depends_on("b"),
            ResourceRecord::new("b", ResourceKind::Pod).depends_on("a"),
        ];

        let fixed = compute_layout(
            LayoutRequest::new(resources.clone()).with_settings(DisplaySettings::show_all()),
        );
        assert!(matches!(fixed, Err(LayoutError::RelationCycle { .. })));

        let auto = compute_layout(LayoutRequest::new(resources).with_settings(
            DisplaySettings::show_all().with_layout(NetworkLayout::AutoArrange),
        ))
        .unwrap();
        assert_eq!(auto.resources.len(), 2);
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: LayoutRequest = serde_json::from_str(
            r#"{
                "resources": [{ "uid": "p", "kind": "Pod" }],
                "namespace": { "cluster": "inClusterContext", "namespace": "mongodb" }
            }"#,
        )
        .unwrap();

        assert_eq!(request.settings, DisplaySettings::default());
        assert_eq!(request.config, LayoutConfig::default());

        let layout = compute_layout(request).unwrap();
        let frame = layout.find("ns-inClusterContext-mongodb").unwrap();
        assert_eq!(frame.resource.name, "mongodb");
        assert_eq!(layout.resources.last().map(|r| r.uid()), Some(frame.uid()));
    }
}

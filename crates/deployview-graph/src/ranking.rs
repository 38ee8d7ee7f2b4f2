use crate::graph::{GraphModel, NodeIndex};
use deployview_core::{LayoutConfig, LayoutError};

/// Assigns every node its vertical level (0 = top row).
///
/// Ownership fixes the starting point: a root sits at its kind's bias, a
/// child one level below its parent. Dependencies then pull a node (and,
/// through ownership, its whole subtree) below everything it depends on.
pub struct RankAssigner<'a> {
    config: &'a LayoutConfig,
}

impl<'a> RankAssigner<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    pub fn assign(&self, model: &mut GraphModel) -> Result<(), LayoutError> {
        let order = model.topological_order().inspect_err(|err| {
            tracing::warn!("Refusing to rank graph: {}", err);
        })?;

        self.ownership_pass(model);
        Self::dependency_pass(model, &order);
        Ok(())
    }

    fn ownership_pass(&self, model: &mut GraphModel) {
        let mut stack: Vec<NodeIndex> = model.roots();
        for &root_idx in &stack {
            let root = &mut model.graph[root_idx];
            root.level = self.config.level_bias(&root.resource.kind);
        }

        while let Some(node_idx) = stack.pop() {
            let level = model.graph[node_idx].level;
            let children = model.graph[node_idx].children.clone();
            for child_idx in children {
                model.graph[child_idx].level = level.saturating_add(1);
                stack.push(child_idx);
            }
        }
    }

    /// `order` places parents and dependency targets first, so one sweep
    /// reaches the final levels no matter how the roots were ordered.
    fn dependency_pass(model: &mut GraphModel, order: &[NodeIndex]) {
        for &node_idx in order {
            let node = &model.graph[node_idx];
            let parent_floor = node.parent.map(|p| model.graph[p].level.saturating_add(1));
            let dependency_floor = node
                .depends_on
                .iter()
                .map(|&d| model.graph[d].level.saturating_add(1))
                .max();

            let floor = parent_floor.into_iter().chain(dependency_floor).max();
            if let Some(floor) = floor {
                let node = &mut model.graph[node_idx];
                node.level = node.level.max(floor);
            }
        }
    }
}

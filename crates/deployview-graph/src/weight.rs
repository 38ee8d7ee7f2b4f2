use crate::graph::{GraphModel, NodeIndex};
use deployview_core::{LayoutConfig, is_operator_pod};
use std::collections::BTreeMap;

/// Computes the horizontal footprint of every subtree.
///
/// Children are bucketed by level: a bucket costs the sum of its members,
/// and a node costs its most expensive bucket. A deep chain therefore stays
/// one slot wide instead of accumulating width level by level.
pub struct WeightCalculator<'a> {
    config: &'a LayoutConfig,
}

impl<'a> WeightCalculator<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    pub fn assign(&self, model: &mut GraphModel) {
        for root_idx in model.roots() {
            self.assign_subtree(model, root_idx);
        }
    }

    /// Post-order walk without recursion; ownership depth is unbounded.
    fn assign_subtree(&self, model: &mut GraphModel, root_idx: NodeIndex) {
        let mut stack = vec![(root_idx, false)];
        while let Some((node_idx, children_done)) = stack.pop() {
            if !children_done {
                stack.push((node_idx, true));
                stack.extend(model.graph[node_idx].children.iter().map(|&c| (c, false)));
                continue;
            }

            let node = &model.graph[node_idx];
            let mut by_level: BTreeMap<u32, u32> = BTreeMap::new();
            for &child_idx in &node.children {
                let child = &model.graph[child_idx];
                let sum = by_level.entry(child.level).or_insert(0);
                *sum = sum.saturating_add(child.weight);
            }
            // An empty bucket list falls back to the base weight.
            let busiest = by_level.into_values().max().unwrap_or(0);
            let weight = self.base_weight(model, node_idx).max(busiest);

            model.graph[node_idx].weight = weight;
        }
    }

    fn base_weight(&self, model: &GraphModel, node_idx: NodeIndex) -> u32 {
        if is_operator_pod(&model.graph[node_idx].resource) {
            self.config.operator_sort_weight.saturating_add(1)
        } else {
            1
        }
    }

    /// Width multiplier of a weight, with the operator offset taken back out.
    pub fn slot_weight(&self, weight: u32) -> u32 {
        let offset = self.config.operator_sort_weight;
        if offset > 0 && weight >= offset {
            (weight - offset).saturating_add(1)
        } else {
            weight
        }
    }
}

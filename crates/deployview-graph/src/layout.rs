use crate::graph::{GraphModel, GraphNode, NodeFont, NodeIndex, NodeSize};
use crate::weight::WeightCalculator;
use deployview_core::{IN_CLUSTER_CONTEXT, LayoutConfig, ResourceKind, ResourceRecord, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};

pub trait Layouter {
    fn execute(&self, model: &GraphModel) -> HashMap<NodeIndex, Vec2>;
}

/// Reorder an ascending sequence so it alternates between the two ends:
/// even positions fill from the front, odd positions from the back.
///
/// `[1, 2, 3, 4, 5]` becomes `[1, 3, 5, 4, 2]`, so the largest items end up
/// in the middle and the smallest on the edges.
pub fn balance_sorted<T>(items: Vec<T>) -> Vec<T> {
    let len = items.len();
    let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(len).collect();
    for (i, item) in items.into_iter().enumerate() {
        let half = i / 2;
        let target = if i % 2 == 0 { half } else { len - 1 - half };
        slots[target] = Some(item);
    }
    slots.into_iter().flatten().collect()
}

/// Nodes per level, ascending by level, insertion order within a level.
pub fn level_nodes(model: &GraphModel) -> BTreeMap<u32, Vec<NodeIndex>> {
    let mut levels: BTreeMap<u32, Vec<NodeIndex>> = BTreeMap::new();
    for idx in model.graph.node_indices() {
        levels.entry(model.graph[idx].level).or_default().push(idx);
    }
    levels
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    pub x: f64,
    pub y: f64,
}

/// Places ranked and weighted nodes on a grid of level rows.
///
/// Every node gets a slot `slot_weight * padding.x` wide on its level and
/// sits in the middle of it. Slots are handed out left to right through a
/// per-level cursor, and a child's slot never starts left of its parent's.
pub struct FixedLayouter<'a> {
    config: &'a LayoutConfig,
}

impl<'a> FixedLayouter<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self { config }
    }

    /// Spread rows apart when there are few levels compared to the width of
    /// the busiest one, down to a minimum slot width.
    pub fn padding(&self, levels: &BTreeMap<u32, Vec<NodeIndex>>) -> Padding {
        let y = self.config.vertical_padding;
        let busiest = levels.values().map(Vec::len).max().unwrap_or(0).max(1);
        let x = (y * (levels.len() as f64 / busiest as f64) * self.config.horizontal_padding_factor)
            .max(self.config.min_horizontal_padding);
        Padding { x, y }
    }

    /// Top-level roots sorted by weight, then balanced.
    fn order_top_level(model: &GraphModel, nodes: &[NodeIndex]) -> Vec<NodeIndex> {
        let mut sorted = nodes.to_vec();
        sorted.sort_by_key(|&idx| model.graph[idx].weight);
        balance_sorted(sorted)
    }

    fn place_subtree(
        &self,
        model: &GraphModel,
        root_idx: NodeIndex,
        padding: Padding,
        cursor_by_level: &mut HashMap<u32, f64>,
        positions: &mut HashMap<NodeIndex, Vec2>,
    ) {
        let slots = WeightCalculator::new(self.config);
        let mut stack = vec![(root_idx, 0.0_f64)];

        while let Some((node_idx, parent_start)) = stack.pop() {
            let node = &model.graph[node_idx];
            let cursor = cursor_by_level.entry(node.level).or_insert(0.0);
            let x_start = (*cursor).max(parent_start);
            let x_end = x_start + f64::from(slots.slot_weight(node.weight)) * padding.x;
            *cursor = x_end;

            positions.insert(
                node_idx,
                Vec2::new(x_start + (x_end - x_start) / 2.0, f64::from(node.level) * padding.y),
            );

            // Reversed so the first child is placed first.
            stack.extend(node.children.iter().rev().map(|&c| (c, x_start)));
        }
    }

    /// Background node framing every placed node, or `None` when nothing
    /// was placed.
    pub fn namespace_node(&self, frame: &NamespaceFrame, model: &GraphModel) -> Option<GraphNode> {
        let margin = &self.config.namespace_margin;
        let (max_x, max_y) = model
            .graph
            .node_indices()
            .map(|idx| model.graph[idx].location)
            .fold(None, |acc: Option<(f64, f64)>, loc| match acc {
                None => Some((loc.x, loc.y)),
                Some((x, y)) => Some((x.max(loc.x), y.max(loc.y))),
            })?;

        let height = max_y + margin.height;
        let width = max_x + margin.width;

        let mut resource = ResourceRecord::new(frame.uid(), ResourceKind::Namespace)
            .with_name(frame.label());
        resource.namespace = Some(frame.namespace.clone());

        let mut node = GraphNode::new(resource);
        node.location = Vec2::new(width / 2.0 + margin.offset_x, height / 2.0 + margin.offset_y);
        node.size = Some(NodeSize { width, height });
        node.font = Some(NodeFont {
            size: margin.font_size,
            bold: margin.bold,
        });
        Some(node)
    }
}

impl Layouter for FixedLayouter<'_> {
    fn execute(&self, model: &GraphModel) -> HashMap<NodeIndex, Vec2> {
        let mut positions = HashMap::with_capacity(model.node_count());
        let mut levels = level_nodes(model);
        if levels.is_empty() {
            return positions;
        }

        if let Some(top) = levels.get_mut(&0) {
            *top = Self::order_top_level(model, top);
        }

        let padding = self.padding(&levels);
        tracing::debug!(
            "Fixed layout: {} nodes on {} levels, padding {:?}",
            model.node_count(),
            levels.len(),
            padding
        );

        let mut cursor_by_level = HashMap::new();
        for nodes in levels.values() {
            for &node_idx in nodes {
                if model.graph[node_idx].parent.is_none() {
                    self.place_subtree(
                        model,
                        node_idx,
                        padding,
                        &mut cursor_by_level,
                        &mut positions,
                    );
                }
            }
        }

        positions
    }
}

/// Cluster namespace drawn as a background behind the whole deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceFrame {
    pub cluster: String,
    pub namespace: String,
}

impl NamespaceFrame {
    pub fn new(cluster: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
        }
    }

    pub fn uid(&self) -> String {
        format!("ns-{}-{}", self.cluster, self.namespace)
    }

    pub fn label(&self) -> String {
        if self.cluster == IN_CLUSTER_CONTEXT {
            self.namespace.clone()
        } else {
            format!("{}: {}", self.cluster, self.namespace)
        }
    }
}

/// Generic layered arrangement used when the fixed layout is switched off.
///
/// Ownership and dependency edges are treated alike: longest-path ranks,
/// two barycenter sweeps to reduce crossings, then evenly spaced rows
/// centred on x = 0. Cycles are tolerated by breaking them while ranking.
pub struct AutoLayouter {
    pub layer_spacing: f64,
    pub node_spacing: f64,
}

#[derive(Default)]
struct Relations {
    incoming: HashMap<NodeIndex, Vec<NodeIndex>>,
    outgoing: HashMap<NodeIndex, Vec<NodeIndex>>,
}

impl AutoLayouter {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            layer_spacing: config.auto_layer_spacing,
            node_spacing: config.auto_node_spacing,
        }
    }

    fn build_relations(model: &GraphModel) -> Relations {
        let mut relations = Relations::default();
        for idx in model.graph.node_indices() {
            let node = &model.graph[idx];
            let sources = node.parent.into_iter().chain(node.depends_on.iter().copied());
            for source in sources {
                relations.incoming.entry(idx).or_default().push(source);
                relations.outgoing.entry(source).or_default().push(idx);
            }
        }
        relations
    }

    fn neighbors(map: &HashMap<NodeIndex, Vec<NodeIndex>>, idx: NodeIndex) -> &[NodeIndex] {
        map.get(&idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Longest-path ranks taken in topological order.
    ///
    /// When only nodes on a cycle are left, the earliest inserted one is
    /// ranked from the predecessors already placed, which cuts its back edges.
    fn assign_ranks(model: &GraphModel, relations: &Relations) -> HashMap<NodeIndex, i32> {
        let mut unresolved: HashMap<NodeIndex, usize> = model
            .graph
            .node_indices()
            .map(|idx| (idx, Self::neighbors(&relations.incoming, idx).len()))
            .collect();
        let mut ready: VecDeque<NodeIndex> = model
            .graph
            .node_indices()
            .filter(|idx| unresolved[idx] == 0)
            .collect();

        let mut ranks: HashMap<NodeIndex, i32> = HashMap::with_capacity(unresolved.len());
        let mut broken_cycles = 0;
        while ranks.len() < unresolved.len() {
            let node_idx = match ready.pop_front() {
                Some(idx) => idx,
                None => {
                    let Some(idx) = model.graph.node_indices().find(|i| !ranks.contains_key(i))
                    else {
                        break;
                    };
                    broken_cycles += 1;
                    idx
                }
            };
            if ranks.contains_key(&node_idx) {
                continue;
            }

            let rank = Self::neighbors(&relations.incoming, node_idx)
                .iter()
                .filter_map(|source| ranks.get(source))
                .map(|&rank| rank + 1)
                .max()
                .unwrap_or(0);
            ranks.insert(node_idx, rank);

            for &target in Self::neighbors(&relations.outgoing, node_idx) {
                if let Some(count) = unresolved.get_mut(&target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 && !ranks.contains_key(&target) {
                        ready.push_back(target);
                    }
                }
            }
        }

        if broken_cycles > 0 {
            tracing::warn!(
                "Auto layout broke {} relation cycles while ranking {} nodes",
                broken_cycles,
                ranks.len()
            );
        }

        Self::compress_ranks(&mut ranks);
        ranks
    }

    fn compress_ranks(ranks: &mut HashMap<NodeIndex, i32>) {
        let mut unique_ranks: Vec<i32> = ranks.values().copied().collect();
        unique_ranks.sort_unstable();
        unique_ranks.dedup();

        let remap: HashMap<i32, i32> = unique_ranks
            .iter()
            .enumerate()
            .map(|(i, &rank)| (rank, i as i32))
            .collect();

        for rank in ranks.values_mut() {
            if let Some(&new_rank) = remap.get(rank) {
                *rank = new_rank;
            }
        }
    }

    fn build_layers(ranks: &HashMap<NodeIndex, i32>) -> BTreeMap<i32, Vec<NodeIndex>> {
        let mut layers: BTreeMap<i32, Vec<NodeIndex>> = BTreeMap::new();
        for (&node, &rank) in ranks {
            layers.entry(rank).or_default().push(node);
        }
        for nodes in layers.values_mut() {
            nodes.sort();
        }
        layers
    }

    fn order_layer_by_barycenter(
        layer_nodes: &mut [NodeIndex],
        layer_coords: &HashMap<NodeIndex, f64>,
        neighbors: &HashMap<NodeIndex, Vec<NodeIndex>>,
    ) {
        let barycenters: HashMap<NodeIndex, f64> = layer_nodes
            .iter()
            .map(|&node_idx| {
                let coords: Vec<f64> = neighbors
                    .get(&node_idx)
                    .into_iter()
                    .flatten()
                    .filter_map(|n| layer_coords.get(n).copied())
                    .collect();
                let barycenter = if coords.is_empty() {
                    layer_coords.get(&node_idx).copied().unwrap_or(0.0)
                } else {
                    coords.iter().sum::<f64>() / coords.len() as f64
                };
                (node_idx, barycenter)
            })
            .collect();

        layer_nodes.sort_by(|a, b| barycenters[a].total_cmp(&barycenters[b]));
    }

    fn run_barycenter_passes(
        layers: &mut BTreeMap<i32, Vec<NodeIndex>>,
        relations: &Relations,
    ) {
        let mut layer_coords: HashMap<NodeIndex, f64> = HashMap::new();
        let reindex = |nodes: &[NodeIndex], coords: &mut HashMap<NodeIndex, f64>| {
            for (j, &node_idx) in nodes.iter().enumerate() {
                coords.insert(node_idx, j as f64);
            }
        };
        for nodes in layers.values() {
            reindex(nodes, &mut layer_coords);
        }

        let ranks: Vec<i32> = layers.keys().copied().collect();
        for _ in 0..2 {
            for rank in ranks.iter().skip(1) {
                if let Some(nodes) = layers.get_mut(rank) {
                    Self::order_layer_by_barycenter(nodes, &layer_coords, &relations.incoming);
                    reindex(nodes, &mut layer_coords);
                }
            }
            for rank in ranks.iter().rev().skip(1) {
                if let Some(nodes) = layers.get_mut(rank) {
                    Self::order_layer_by_barycenter(nodes, &layer_coords, &relations.outgoing);
                    reindex(nodes, &mut layer_coords);
                }
            }
        }
    }
}

impl Layouter for AutoLayouter {
    fn execute(&self, model: &GraphModel) -> HashMap<NodeIndex, Vec2> {
        let relations = Self::build_relations(model);
        let ranks = Self::assign_ranks(model, &relations);
        let mut layers = Self::build_layers(&ranks);
        Self::run_barycenter_passes(&mut layers, &relations);

        let mut positions = HashMap::with_capacity(ranks.len());
        for (&rank, nodes) in &layers {
            let extent = nodes.len().saturating_sub(1) as f64 * self.node_spacing;
            let y = f64::from(rank) * self.layer_spacing;
            for (j, &node_idx) in nodes.iter().enumerate() {
                let x = -extent / 2.0 + j as f64 * self.node_spacing;
                positions.insert(node_idx, Vec2::new(x, y));
            }
        }
        positions
    }
}

pub mod engine;
pub mod graph;
pub mod grouping;
pub mod layout;
pub mod ranking;
pub mod ui_model;
pub mod visibility;
pub mod weight;

pub use engine::{LayoutRequest, compute_layout};
pub use graph::{GraphModel, GraphNode, NodeFont, NodeIndex, NodeSize};
pub use grouping::{GROUP_UID_PREFIX, GroupSynthesizer, group_uid};
pub use layout::{AutoLayouter, FixedLayouter, Layouter, NamespaceFrame, balance_sorted};
pub use ranking::RankAssigner;
pub use ui_model::{DeploymentLayout, ResourceUIModel, UiPlacement};
pub use visibility::{GroupedMember, GroupedNodes, VisibilityReducer};
pub use weight::WeightCalculator;

#[cfg(test)]
mod testing;

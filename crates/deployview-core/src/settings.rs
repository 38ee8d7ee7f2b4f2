use crate::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResourceVisibility {
    #[default]
    Show,
    ShowGrouped,
    ShowOnlyIfReferenced,
    Hide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NetworkLayout {
    #[default]
    Fixed,
    #[serde(alias = "Auto")]
    AutoArrange,
}

/// User-facing display preferences: which kinds are drawn and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DisplaySettings {
    pub settings_version: u32,
    pub layout: NetworkLayout,
    pub resources: HashMap<ResourceKind, ResourceVisibility>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        let resources = HashMap::from([
            (ResourceKind::PersistentVolume, ResourceVisibility::Hide),
            (ResourceKind::PersistentVolumeClaim, ResourceVisibility::Hide),
            (ResourceKind::Service, ResourceVisibility::Hide),
            (ResourceKind::Secret, ResourceVisibility::Hide),
            (ResourceKind::ConfigMap, ResourceVisibility::Hide),
            (
                ResourceKind::CustomResourceDefinition,
                ResourceVisibility::ShowOnlyIfReferenced,
            ),
            (
                ResourceKind::MongoDBUser,
                ResourceVisibility::ShowOnlyIfReferenced,
            ),
        ]);

        Self {
            settings_version: DisplaySettings::VERSION,
            layout: NetworkLayout::Fixed,
            resources,
        }
    }
}

impl DisplaySettings {
    pub const VERSION: u32 = 1;

    /// Every kind shown, fixed layout.
    pub fn show_all() -> Self {
        Self {
            settings_version: Self::VERSION,
            layout: NetworkLayout::Fixed,
            resources: HashMap::new(),
        }
    }

    pub fn with_visibility(mut self, kind: ResourceKind, visibility: ResourceVisibility) -> Self {
        self.resources.insert(kind, visibility);
        self
    }

    pub fn with_layout(mut self, layout: NetworkLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Policy for `kind`; kinds without an entry are shown.
    pub fn visibility(&self, kind: &ResourceKind) -> ResourceVisibility {
        self.resources.get(kind).copied().unwrap_or_default()
    }
}

/// Extra room reserved around the namespace background node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceMargin {
    pub width: f64,
    pub height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub font_size: u32,
    pub bold: bool,
}

impl Default for NamespaceMargin {
    fn default() -> Self {
        Self {
            width: 75.0,
            height: 200.0,
            offset_x: 20.0,
            offset_y: -70.0,
            font_size: 32,
            bold: true,
        }
    }
}

/// Tunables of the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Level given to forest roots of a kind; kinds without an entry start at 0.
    pub level_bias: HashMap<ResourceKind, u32>,
    pub vertical_padding: f64,
    pub min_horizontal_padding: f64,
    pub horizontal_padding_factor: f64,
    /// Weight offset that keeps the operator pod apart from ordinary subtrees.
    pub operator_sort_weight: u32,
    pub namespace_margin: NamespaceMargin,
    pub auto_layer_spacing: f64,
    pub auto_node_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let level_bias = HashMap::from([
            (ResourceKind::Secret, 5),
            (ResourceKind::ConfigMap, 5),
            (ResourceKind::PersistentVolumeClaim, 5),
            (ResourceKind::PersistentVolume, 6),
        ]);

        Self {
            level_bias,
            vertical_padding: 150.0,
            min_horizontal_padding: 140.0,
            horizontal_padding_factor: 1.1,
            operator_sort_weight: 10_000,
            namespace_margin: NamespaceMargin::default(),
            auto_layer_spacing: 150.0,
            auto_node_spacing: 140.0,
        }
    }
}

impl LayoutConfig {
    pub fn level_bias(&self, kind: &ResourceKind) -> u32 {
        self.level_bias.get(kind).copied().unwrap_or(0)
    }

    /// Same tunables without any per-kind bias.
    pub fn unbiased() -> Self {
        Self {
            level_bias: HashMap::new(),
            ..Self::default()
        }
    }
}

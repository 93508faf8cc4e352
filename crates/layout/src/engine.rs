use crate::force::{ForceConfig, ForceLayout};
use crate::radial::{RadialConfig, RadialLayout};
use crate::style::{node_radius, style_center, style_explicit};
use crate::types::{InteractionState, LayoutBounds, LayoutPoint, LayoutResult};
use crate::visibility::node_visibility;
use persona_graph::{PersonaEdge, PersonaGraph, PersonaNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which layout engine to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// Deterministic concentric rings
    #[default]
    Radial,

    /// Physics simulation
    Force,
}

impl LayoutKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Radial => "radial",
            Self::Force => "force",
        }
    }
}

impl std::str::FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radial" | "concentric" | "polar" => Ok(Self::Radial),
            "force" | "physics" => Ok(Self::Force),
            other => Err(format!("unknown layout engine '{other}' (expected radial|force)")),
        }
    }
}

/// Shared contract of both layout engines.
///
/// Implementations are pure: the same input yields the same layout, and a
/// call never touches state outside its arguments.
pub trait LayoutEngine {
    fn kind(&self) -> LayoutKind;

    fn layout(
        &self,
        nodes: &[PersonaNode],
        edges: &[PersonaEdge],
        interaction: &InteractionState,
    ) -> LayoutResult;
}

/// Both engines, configured once and selected per call
#[derive(Debug, Clone, Default)]
pub struct LayoutEngines {
    pub radial: RadialLayout,
    pub force: ForceLayout,
}

impl LayoutEngines {
    pub fn new(radial: RadialConfig, force: ForceConfig) -> Self {
        Self {
            radial: RadialLayout::new(radial),
            force: ForceLayout::new(force),
        }
    }

    pub fn get(&self, kind: LayoutKind) -> &dyn LayoutEngine {
        match kind {
            LayoutKind::Radial => &self.radial,
            LayoutKind::Force => &self.force,
        }
    }

    pub fn layout(
        &self,
        kind: LayoutKind,
        nodes: &[PersonaNode],
        edges: &[PersonaEdge],
        interaction: &InteractionState,
    ) -> LayoutResult {
        self.get(kind).layout(nodes, edges, interaction)
    }
}

/// Assemble visibility, radii, edge styles and bounds around computed
/// positions.
pub(crate) fn finish(
    graph: &PersonaGraph<'_>,
    nodes: &[PersonaNode],
    edges: &[PersonaEdge],
    positions: BTreeMap<String, LayoutPoint>,
    node_radii: &[f64; 4],
    center_edges: &[(String, String)],
    interaction: &InteractionState,
) -> LayoutResult {
    let visibility = node_visibility(graph, interaction);
    let is_visible = |id: &str| visibility.get(id).copied().unwrap_or(false);

    let radii: BTreeMap<String, f64> = nodes
        .iter()
        .filter(|n| positions.contains_key(&n.id))
        .map(|n| (n.id.clone(), node_radius(node_radii, n)))
        .collect();

    let mut edge_styles = Vec::with_capacity(edges.len() + center_edges.len());
    for edge in edges {
        if !graph.contains(&edge.source) || !graph.contains(&edge.target) {
            continue;
        }
        let target_layer = graph.node(&edge.target).map(PersonaNode::layer);
        let visible = is_visible(&edge.source) && is_visible(&edge.target);
        edge_styles.push(style_explicit(edge, target_layer, visible));
    }
    for (source, target) in center_edges {
        let visible = is_visible(source) && is_visible(target);
        edge_styles.push(style_center(source, target, visible));
    }

    let bounds = positions.iter().fold(None, |acc: Option<LayoutBounds>, (id, p)| {
        let r = radii.get(id).copied().unwrap_or(0.0);
        let b = LayoutBounds {
            min_x: p.x - r,
            min_y: p.y - r,
            max_x: p.x + r,
            max_y: p.y + r,
        };
        Some(match acc {
            None => b,
            Some(a) => LayoutBounds {
                min_x: a.min_x.min(b.min_x),
                min_y: a.min_y.min(b.min_y),
                max_x: a.max_x.max(b.max_x),
                max_y: a.max_y.max(b.max_y),
            },
        })
    });

    LayoutResult {
        positions,
        visibility,
        radii,
        edge_styles,
        bounds,
    }
}

use crate::types::{EdgeKind, EdgeStyle};
use persona_graph::{PersonaEdge, PersonaNode};

/// Visual radius per layer (profile, angle, story, detail)
pub const DEFAULT_NODE_RADII: [f64; 4] = [32.0, 22.0, 16.0, 9.0];

pub fn node_radius(radii: &[f64; 4], node: &PersonaNode) -> f64 {
    radii[usize::from(node.layer().min(3))]
}

/// Classify an explicit edge by its target and tension flag
pub fn edge_kind(edge: &PersonaEdge, target_layer: Option<u8>) -> EdgeKind {
    if edge.tension {
        EdgeKind::Tension
    } else if target_layer == Some(3) {
        EdgeKind::Detail
    } else {
        EdgeKind::Structural
    }
}

/// Stroke width and opacity for an edge of `kind` with `strength` in [0, 1].
///
/// Detail edges are thin and faint, synthetic centre edges are fixed
/// medium, structural and tension edges scale with strength.
pub fn stroke(kind: EdgeKind, strength: f64) -> (f64, f64) {
    let s = strength.clamp(0.0, 1.0);
    match kind {
        EdgeKind::Detail => (0.75 + 0.75 * s, 0.25 + 0.25 * s),
        EdgeKind::Center => (1.25, 0.35),
        EdgeKind::Structural | EdgeKind::Tension => (1.0 + 2.0 * s, 0.45 + 0.5 * s),
    }
}

pub(crate) fn style_explicit(edge: &PersonaEdge, target_layer: Option<u8>, visible: bool) -> EdgeStyle {
    let kind = edge_kind(edge, target_layer);
    let (stroke_width, opacity) = stroke(kind, edge.strength);
    EdgeStyle {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        relation: Some(edge.relation),
        kind,
        stroke_width,
        opacity,
        dashed: kind == EdgeKind::Tension,
        visible,
    }
}

pub(crate) fn style_center(source: &str, target: &str, visible: bool) -> EdgeStyle {
    let (stroke_width, opacity) = stroke(EdgeKind::Center, 0.0);
    EdgeStyle {
        id: format!("{source}->{target}:center"),
        source: source.to_string(),
        target: target.to_string(),
        relation: None,
        kind: EdgeKind::Center,
        stroke_width,
        opacity,
        dashed: false,
        visible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_graph::Relation;

    #[test]
    fn test_detail_edges_are_thinner_than_structural() {
        let (detail_w, detail_o) = stroke(EdgeKind::Detail, 0.7);
        let (center_w, center_o) = stroke(EdgeKind::Center, 0.7);
        let (normal_w, normal_o) = stroke(EdgeKind::Structural, 0.7);
        assert!(detail_w < center_w && center_w < normal_w);
        assert!(detail_o < center_o && center_o < normal_o);
    }

    #[test]
    fn test_edge_kind() {
        let tension = PersonaEdge::new("a", "s", Relation::Contradicts, 0.5);
        assert_eq!(edge_kind(&tension, Some(2)), EdgeKind::Tension);
        assert!(style_explicit(&tension, Some(2), true).dashed);

        let enables = PersonaEdge::new("s", "d", Relation::Enables, 0.65);
        assert_eq!(edge_kind(&enables, Some(3)), EdgeKind::Detail);

        let builds = PersonaEdge::new("a", "s", Relation::BuildsOn, 0.8);
        assert_eq!(edge_kind(&builds, Some(2)), EdgeKind::Structural);
    }
}

use persona_graph::{build_edges, build_nodes, NodeType, PersonaEdge, PersonaNode, RawNode};
use persona_layout::{
    EdgeKind, InteractionState, LayoutEngines, LayoutKind, LayoutResult,
};

fn graph() -> (Vec<PersonaNode>, Vec<PersonaEdge>) {
    let nodes = build_nodes(&[
        RawNode::new(NodeType::ProfileSummary, "Quiet builder"),
        RawNode::new(NodeType::EssayAngle, "Systems thinker").with_tags(["robotics", "systems"]),
        RawNode::new(NodeType::KeyStory, "Line follower").with_tags(["robotics", "systems", "code"]),
        RawNode::new(NodeType::KeyStory, "Choir solo").with_tags(["music"]),
        RawNode::new(NodeType::Detail, "Python").with_tags(["code", "skill"]),
        RawNode::new(NodeType::Detail, "Sight reading").with_tags(["music", "skill"]),
        RawNode::new(NodeType::Detail, "Study mechatronics").with_tags(["robotics", "goal"]),
    ]);
    let edges = build_edges(&nodes);
    (nodes, edges)
}

fn both(interaction: &InteractionState) -> Vec<(LayoutKind, LayoutResult)> {
    let (nodes, edges) = graph();
    let engines = LayoutEngines::default();
    [LayoutKind::Radial, LayoutKind::Force]
        .into_iter()
        .map(|kind| (kind, engines.layout(kind, &nodes, &edges, interaction)))
        .collect()
}

#[test]
fn selected_story_reveals_only_its_details() {
    let interaction = InteractionState::selected("story-line-follower");
    for (kind, result) in both(&interaction) {
        assert!(result.is_visible("detail-python"), "{kind:?}");
        assert!(result.is_visible("detail-study-mechatronics"), "{kind:?}");
        assert!(!result.is_visible("detail-sight-reading"), "{kind:?}");
    }
}

#[test]
fn hovered_node_reveals_its_details_too() {
    let interaction = InteractionState {
        selected_id: Some("story-line-follower".to_string()),
        hovered_id: Some("story-choir-solo".to_string()),
        show_all_details: false,
    };
    for (kind, result) in both(&interaction) {
        assert!(result.is_visible("detail-sight-reading"), "{kind:?}");
    }
}

#[test]
fn show_all_details_overrides_focus() {
    for (kind, result) in both(&InteractionState::show_all()) {
        assert_eq!(result.visible_ids().len(), 7, "{kind:?}");
    }
}

#[test]
fn hidden_details_keep_positions() {
    let (nodes, edges) = graph();
    let engines = LayoutEngines::default();
    for kind in [LayoutKind::Radial, LayoutKind::Force] {
        let hidden = engines.layout(kind, &nodes, &edges, &InteractionState::default());
        let shown = engines.layout(kind, &nodes, &edges, &InteractionState::show_all());
        assert_eq!(hidden.positions, shown.positions, "{kind:?}");
        assert_eq!(hidden.positions.len(), nodes.len(), "{kind:?}");
        assert!(!hidden.is_visible("detail-python"));
    }
}

#[test]
fn edges_into_hidden_details_are_hidden() {
    for (_, result) in both(&InteractionState::default()) {
        for style in &result.edge_styles {
            if style.kind == EdgeKind::Detail {
                assert!(!style.visible);
                assert!(style.stroke_width < 2.0);
            }
        }
    }
}

#[test]
fn only_force_layout_synthesizes_center_edges() {
    let results = both(&InteractionState::default());
    let count = |r: &LayoutResult| {
        r.edge_styles
            .iter()
            .filter(|e| e.kind == EdgeKind::Center)
            .count()
    };
    assert_eq!(count(&results[0].1), 0);
    assert_eq!(count(&results[1].1), 2);
}

#[test]
fn bounds_cover_every_node() {
    for (kind, result) in both(&InteractionState::default()) {
        let bounds = result.bounds.expect("non-empty graph has bounds");
        for (id, p) in &result.positions {
            let r = result.radii[id];
            assert!(p.x - r >= bounds.min_x - 1e-9 && p.x + r <= bounds.max_x + 1e-9, "{kind:?} {id}");
            assert!(p.y - r >= bounds.min_y - 1e-9 && p.y + r <= bounds.max_y + 1e-9, "{kind:?} {id}");
        }
    }
}

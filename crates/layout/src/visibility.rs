use crate::types::InteractionState;
use persona_graph::{NodeType, PersonaGraph};
use std::collections::BTreeMap;

/// Visibility of every node.
///
/// Non-detail nodes are always visible. A detail is visible when all details
/// are shown, or when one of its parents (sources of edges targeting it) is
/// the selected or hovered node.
pub fn node_visibility(
    graph: &PersonaGraph<'_>,
    interaction: &InteractionState,
) -> BTreeMap<String, bool> {
    let mut visibility = BTreeMap::new();

    for node_type in [NodeType::ProfileSummary, NodeType::EssayAngle, NodeType::KeyStory] {
        for node in graph.nodes_of_type(node_type) {
            visibility.insert(node.id.clone(), true);
        }
    }

    for detail in graph.nodes_of_type(NodeType::Detail) {
        let visible = interaction.show_all_details
            || graph
                .parents_of(&detail.id)
                .unwrap_or_default()
                .iter()
                .any(|parent| interaction.focuses(&parent.id));
        visibility.insert(detail.id.clone(), visible);
    }

    visibility
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_graph::{build_edges, build_nodes, RawNode};

    #[test]
    fn test_detail_follows_selection_and_hover() {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::KeyStory, "A").with_tags(["x"]),
            RawNode::new(NodeType::KeyStory, "B").with_tags(["y"]),
            RawNode::new(NodeType::Detail, "Dx").with_tags(["x"]),
            RawNode::new(NodeType::Detail, "Dy").with_tags(["y"]),
            RawNode::new(NodeType::Detail, "Orphan"),
        ]);
        let edges = build_edges(&nodes);
        let graph = PersonaGraph::new(&nodes, &edges);

        let none = node_visibility(&graph, &InteractionState::default());
        assert_eq!(none["story-a"], true);
        assert_eq!(none["detail-dx"], false);

        let selected = node_visibility(&graph, &InteractionState::selected("story-a"));
        assert_eq!(selected["detail-dx"], true);
        assert_eq!(selected["detail-dy"], false);

        let both = node_visibility(
            &graph,
            &InteractionState {
                selected_id: Some("story-a".to_string()),
                hovered_id: Some("story-b".to_string()),
                show_all_details: false,
            },
        );
        assert_eq!(both["detail-dy"], true);
        assert_eq!(both["detail-orphan"], false);

        let all = node_visibility(&graph, &InteractionState::show_all());
        assert!(all.values().all(|v| *v));
    }
}

use crate::error::{GraphError, Result};
use crate::types::{NodeType, PersonaEdge, PersonaNode, Relation};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Read-only petgraph view over a (nodes, edges) snapshot.
///
/// Built on demand from derived data; never mutated after construction.
pub struct PersonaGraph<'a> {
    graph: DiGraph<&'a PersonaNode, &'a PersonaEdge>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> PersonaGraph<'a> {
    /// Edges whose endpoints are unknown are skipped
    pub fn new(nodes: &'a [PersonaNode], edges: &'a [PersonaEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if index.contains_key(node.id.as_str()) {
                continue;
            }
            let idx = graph.add_node(node);
            index.insert(node.id.as_str(), idx);
        }

        for edge in edges {
            match (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, edge);
                }
                _ => log::debug!("Skipping dangling edge {}", edge.id),
            }
        }

        Self { graph, index }
    }

    fn index_of(&self, id: &str) -> Result<NodeIndex> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn node(&self, id: &str) -> Option<&'a PersonaNode> {
        self.index.get(id).map(|&idx| self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Sources of incoming edges, in edge insertion order. Tension edges are
    /// not structural and are excluded.
    pub fn parents_of(&self, id: &str) -> Result<Vec<&'a PersonaNode>> {
        let idx = self.index_of(id)?;
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .filter(|e| e.weight().relation != Relation::Contradicts)
            .collect();
        edges.sort_by_key(|e| e.id());
        Ok(edges.into_iter().map(|e| self.graph[e.source()]).collect())
    }

    /// Nodes of one type, in input order
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<&'a PersonaNode> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx])
            .filter(|n| n.node_type() == node_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_edges, build_nodes, RawNode};

    fn fixture() -> (Vec<PersonaNode>, Vec<PersonaEdge>) {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::ProfileSummary, "Me"),
            RawNode::new(NodeType::EssayAngle, "Tinkerer").with_tags(["robotics", "build"]),
            RawNode::new(NodeType::KeyStory, "Bot").with_tags(["robotics", "build", "team"]),
            RawNode::new(NodeType::KeyStory, "Band").with_tags(["music", "team"]),
            RawNode::new(NodeType::Detail, "Soldering").with_tags(["robotics", "skill"]),
            RawNode::new(NodeType::Detail, "Teamwork").with_tags(["team", "value"]),
        ]);
        let edges = build_edges(&nodes);
        (nodes, edges)
    }

    #[test]
    fn test_parents_skip_tension_edges() {
        let (nodes, edges) = fixture();
        let graph = PersonaGraph::new(&nodes, &edges);

        let parents: Vec<&str> = graph
            .parents_of("detail-teamwork")
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(parents, vec!["story-bot", "story-band"]);

        let story_parents: Vec<&str> = graph
            .parents_of("story-bot")
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(story_parents, vec!["angle-tinkerer"]);

        assert!(matches!(
            graph.parents_of("missing"),
            Err(GraphError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_nodes_of_type() {
        let (nodes, edges) = fixture();
        let graph = PersonaGraph::new(&nodes, &edges);
        assert_eq!(graph.nodes_of_type(NodeType::KeyStory).len(), 2);
        assert_eq!(graph.nodes_of_type(NodeType::ProfileSummary)[0].id, "profile-me");
        assert!(graph.node("detail-soldering").is_some());
        assert!(!graph.contains("missing"));
    }

    #[test]
    fn test_dangling_edges_are_skipped() {
        let (nodes, mut edges) = fixture();
        edges.push(PersonaEdge::new("ghost", "story-bot", Relation::Supports, 0.9));
        let graph = PersonaGraph::new(&nodes, &edges);
        assert!(!graph.contains("ghost"));
        assert_eq!(graph.parents_of("story-bot").unwrap().len(), 1);
    }
}

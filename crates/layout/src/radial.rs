//! Deterministic concentric layout.
//!
//! The profile sits at the canvas centre, angles and stories on two rings,
//! and each story's details fan out in a short arc pointing away from the
//! centre so they stay next to their parent however many stories exist.

use crate::engine::{finish, LayoutEngine, LayoutKind};
use crate::error::{LayoutError, Result};
use crate::style::DEFAULT_NODE_RADII;
use crate::types::{InteractionState, LayoutPoint, LayoutResult};
use persona_graph::{NodeType, PersonaEdge, PersonaGraph, PersonaNode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Ring geometry of the concentric layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialConfig {
    pub width: f64,
    pub height: f64,

    /// Ring radius for essay angles (layer 1)
    pub angle_ring_radius: f64,

    /// Ring radius for key stories (layer 2)
    pub story_ring_radius: f64,

    /// Starting angle of the first ring, radians (default: straight up)
    pub start_angle: f64,

    /// Extra starting-angle offset per ring, radians
    pub ring_angle_offset: f64,

    /// Distance of a detail from its parent story
    pub detail_radius: f64,

    /// Total arc covered by one story's details, radians
    pub detail_spread: f64,

    /// Visual node radius per layer
    pub node_radii: [f64; 4],
}

impl Default for RadialConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            angle_ring_radius: 130.0,
            story_ring_radius: 230.0,
            start_angle: -FRAC_PI_2,
            ring_angle_offset: 0.3,
            detail_radius: 55.0,
            detail_spread: PI / 3.0,
            node_radii: DEFAULT_NODE_RADII,
        }
    }
}

impl RadialConfig {
    pub fn center(&self) -> LayoutPoint {
        LayoutPoint::new(self.width / 2.0, self.height / 2.0)
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(format!(
                "canvas must be positive, got {}x{}",
                self.width, self.height
            ));
        }

        if self.angle_ring_radius <= 0.0 || self.story_ring_radius <= self.angle_ring_radius {
            return Err(format!(
                "ring radii must increase with layer: angle_ring_radius ({}) < story_ring_radius ({})",
                self.angle_ring_radius, self.story_ring_radius
            ));
        }

        if self.detail_radius <= 0.0 {
            return Err("detail_radius must be > 0".to_string());
        }

        if !(0.0..TAU).contains(&self.detail_spread) {
            return Err(format!(
                "detail_spread must be within [0, 2π), got {}",
                self.detail_spread
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RadialLayout {
    config: RadialConfig,
}

impl RadialLayout {
    pub fn new(config: RadialConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: RadialConfig) -> Result<Self> {
        config.validate().map_err(LayoutError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RadialConfig {
        &self.config
    }

    fn ring_start(&self, ring: usize) -> f64 {
        self.config.start_angle + self.config.ring_angle_offset * ring as f64
    }

    fn place_ring(
        &self,
        positions: &mut BTreeMap<String, LayoutPoint>,
        members: &[&PersonaNode],
        radius: f64,
        ring: usize,
    ) {
        let center = self.config.center();
        let start = self.ring_start(ring);
        let step = TAU / members.len().max(1) as f64;
        for (i, node) in members.iter().enumerate() {
            positions.insert(node.id.clone(), center.offset(radius, start + step * i as f64));
        }
    }

    /// Angles of `count` details centred on `direction`
    fn fan_angles(&self, direction: f64, count: usize) -> Vec<f64> {
        if count <= 1 {
            return vec![direction];
        }
        let spread = self.config.detail_spread;
        let step = spread / (count - 1) as f64;
        (0..count)
            .map(|i| direction - spread / 2.0 + step * i as f64)
            .collect()
    }
}

impl LayoutEngine for RadialLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Radial
    }

    fn layout(
        &self,
        nodes: &[PersonaNode],
        edges: &[PersonaEdge],
        interaction: &InteractionState,
    ) -> LayoutResult {
        let graph = PersonaGraph::new(nodes, edges);
        let center = self.config.center();
        let mut positions = BTreeMap::new();

        for profile in graph.nodes_of_type(NodeType::ProfileSummary) {
            positions.insert(profile.id.clone(), center);
        }

        let angles = graph.nodes_of_type(NodeType::EssayAngle);
        self.place_ring(&mut positions, &angles, self.config.angle_ring_radius, 0);

        let stories = graph.nodes_of_type(NodeType::KeyStory);
        self.place_ring(&mut positions, &stories, self.config.story_ring_radius, 1);

        // Group details under their first placed parent, keeping input order
        let mut fans: Vec<(String, Vec<&PersonaNode>)> = Vec::new();
        let mut orphans: Vec<&PersonaNode> = Vec::new();
        for detail in graph.nodes_of_type(NodeType::Detail) {
            let parent = graph
                .parents_of(&detail.id)
                .unwrap_or_default()
                .into_iter()
                .find(|p| p.node_type() != NodeType::Detail && positions.contains_key(&p.id));
            match parent {
                Some(parent) => match fans.iter_mut().find(|(id, _)| *id == parent.id) {
                    Some((_, members)) => members.push(detail),
                    None => fans.push((parent.id.clone(), vec![detail])),
                },
                None => orphans.push(detail),
            }
        }

        for (parent_id, members) in &fans {
            let Some(anchor) = positions.get(parent_id).copied() else {
                continue;
            };
            let direction = center.angle_to(&anchor).unwrap_or(self.config.start_angle);
            for (detail, angle) in members.iter().zip(self.fan_angles(direction, members.len())) {
                positions.insert(detail.id.clone(), anchor.offset(self.config.detail_radius, angle));
            }
        }

        // Details with no parent fall back to an outer ring
        if !orphans.is_empty() {
            log::debug!("Placing {} unattached details on the outer ring", orphans.len());
            let radius = self.config.story_ring_radius + self.config.detail_radius;
            self.place_ring(&mut positions, &orphans, radius, 2);
        }

        finish(
            &graph,
            nodes,
            edges,
            positions,
            &self.config.node_radii,
            &[],
            interaction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_graph::{build_edges, build_nodes, RawNode};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_default_config_valid() {
        assert!(RadialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_shrinking_rings() {
        let config = RadialConfig {
            story_ring_radius: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            RadialLayout::try_new(config),
            Err(LayoutError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rings_and_offsets() {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::ProfileSummary, "P"),
            RawNode::new(NodeType::EssayAngle, "A1"),
            RawNode::new(NodeType::EssayAngle, "A2"),
            RawNode::new(NodeType::KeyStory, "S1"),
        ]);
        let edges = build_edges(&nodes);
        let layout = RadialLayout::default();
        let result = layout.layout(&nodes, &edges, &InteractionState::default());
        let center = layout.config().center();

        assert_eq!(result.position("profile-p"), Some(center));

        let a1 = result.position("angle-a1").unwrap();
        let a2 = result.position("angle-a2").unwrap();
        assert!(approx(a1.distance(&center), 130.0));
        assert!(approx(a1.x, center.x) && approx(a1.y, center.y - 130.0));
        // Two angles sit opposite each other
        assert!(approx(a2.y, center.y + 130.0));

        let s1 = result.position("story-s1").unwrap();
        assert!(approx(s1.distance(&center), 230.0));
        let s1_angle = center.angle_to(&s1).unwrap();
        assert!(approx(s1_angle, -FRAC_PI_2 + 0.3));
    }

    #[test]
    fn test_details_fan_around_parent_direction() {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::KeyStory, "Story").with_tags(["t"]),
            RawNode::new(NodeType::Detail, "D1").with_tags(["t"]),
            RawNode::new(NodeType::Detail, "D2").with_tags(["t"]),
            RawNode::new(NodeType::Detail, "D3").with_tags(["t"]),
        ]);
        let edges = build_edges(&nodes);
        let layout = RadialLayout::default();
        let result = layout.layout(&nodes, &edges, &InteractionState::default());
        let center = layout.config().center();
        let story = result.position("story-story").unwrap();
        let direction = center.angle_to(&story).unwrap();

        let d2 = result.position("detail-d2").unwrap();
        assert!(approx(d2.distance(&story), 55.0));
        assert!(approx(story.angle_to(&d2).unwrap(), direction));

        let d1 = result.position("detail-d1").unwrap();
        let d3 = result.position("detail-d3").unwrap();
        assert!(approx(story.angle_to(&d1).unwrap(), direction - PI / 6.0));
        assert!(approx(story.angle_to(&d3).unwrap(), direction + PI / 6.0));

        // Details are hidden but still positioned
        assert!(!result.is_visible("detail-d1"));
    }

    #[test]
    fn test_orphan_details_get_outer_ring() {
        let nodes = build_nodes(&[RawNode::new(NodeType::Detail, "Loose")]);
        let layout = RadialLayout::default();
        let result = layout.layout(&nodes, &[], &InteractionState::show_all());
        let p = result.position("detail-loose").unwrap();
        assert!(approx(p.distance(&layout.config().center()), 285.0));
        assert!(result.is_visible("detail-loose"));
    }

    #[test]
    fn test_radial_layout_is_deterministic() {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::ProfileSummary, "P"),
            RawNode::new(NodeType::KeyStory, "S").with_tags(["a"]),
            RawNode::new(NodeType::Detail, "D").with_tags(["a"]),
        ]);
        let edges = build_edges(&nodes);
        let layout = RadialLayout::default();
        let interaction = InteractionState::selected("story-s");
        assert_eq!(
            layout.layout(&nodes, &edges, &interaction),
            layout.layout(&nodes, &edges, &interaction)
        );
    }
}

//! Force-directed layout.
//!
//! Every node is a particle; the profile is pinned at the canvas centre. Each
//! tick applies link attraction, layer-weighted many-body repulsion, a weak
//! pull toward the centre and collision avoidance, then integrates velocities
//! with decay. The simulation runs a fixed number of ticks synchronously and
//! finishes with positional overlap resolution, so the output never has two
//! node discs overlapping.
//!
//! Initial positions come from a seeded RNG, so the same input and seed
//! always produce the same layout.

use crate::engine::{finish, LayoutEngine, LayoutKind};
use crate::error::{LayoutError, Result};
use crate::style::DEFAULT_NODE_RADII;
use crate::types::{InteractionState, LayoutPoint, LayoutResult};
use persona_graph::{NodeType, PersonaEdge, PersonaGraph, PersonaNode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::TAU;

/// Maximum positional passes used to clear remaining overlaps
const MAX_RESOLVE_PASSES: usize = 500;

/// Physics parameters of the force layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub width: f64,
    pub height: f64,

    /// Number of integration steps
    pub iterations: usize,

    /// Seed of the initial placement
    pub seed: u64,

    /// Initial ring radius per layer step
    pub initial_ring_spacing: f64,

    /// Rest length of links between layers 1-2 (and tension links)
    pub link_distance: f64,

    /// Rest length of links touching the profile
    pub profile_link_distance: f64,

    /// Rest length of story <-> detail links
    pub detail_link_distance: f64,

    /// Global link strength
    pub link_strength: f64,

    /// Many-body strength per layer (negative repels)
    pub charge: [f64; 4],

    /// Minimum distance used in the many-body term
    pub charge_distance_min: f64,

    /// Strength of the pull toward the canvas centre
    pub center_strength: f64,

    /// Extra gap kept between colliding nodes during the simulation
    pub collision_padding: f64,

    pub collision_strength: f64,

    /// Fraction of velocity lost per tick
    pub velocity_decay: f64,

    /// Cooling floor; the cooling rate is derived from it and `iterations`
    pub alpha_min: f64,

    /// Visual node radius per layer
    pub node_radii: [f64; 4],
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            iterations: 300,
            seed: 0x5eed,
            initial_ring_spacing: 90.0,
            link_distance: 110.0,
            profile_link_distance: 80.0,
            detail_link_distance: 45.0,
            link_strength: 0.7,
            charge: [-600.0, -300.0, -200.0, -60.0],
            charge_distance_min: 1.0,
            center_strength: 0.03,
            collision_padding: 4.0,
            collision_strength: 0.8,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            node_radii: DEFAULT_NODE_RADII,
        }
    }
}

impl ForceConfig {
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

        if self.detail_link_distance > self.profile_link_distance
            || self.profile_link_distance > self.link_distance
        {
            return Err(format!(
                "link distances must satisfy detail ({}) <= profile ({}) <= default ({})",
                self.detail_link_distance, self.profile_link_distance, self.link_distance
            ));
        }

        if !(0.0..=1.0).contains(&self.link_strength) {
            return Err(format!("link_strength must be within [0, 1], got {}", self.link_strength));
        }

        if !(0.0..1.0).contains(&self.velocity_decay) {
            return Err(format!(
                "velocity_decay must be within [0, 1), got {}",
                self.velocity_decay
            ));
        }

        if !(self.alpha_min > 0.0 && self.alpha_min < 1.0) {
            return Err(format!("alpha_min must be within (0, 1), got {}", self.alpha_min));
        }

        if self.charge.iter().any(|c| *c > 0.0) {
            return Err("charge must be <= 0 for every layer".to_string());
        }

        if self.node_radii.iter().any(|r| *r <= 0.0) {
            return Err("node_radii must be > 0".to_string());
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Particle {
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    layer: usize,
    radius: f64,
    pinned: bool,
}

#[derive(Debug, Clone)]
struct Link {
    source: usize,
    target: usize,
    distance: f64,
    /// Share of the correction applied to the target
    bias: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    config: ForceConfig,
}

impl ForceLayout {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: ForceConfig) -> Result<Self> {
        config.validate().map_err(LayoutError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    fn link_distance(&self, a: usize, b: usize) -> f64 {
        if a == 0 || b == 0 {
            self.config.profile_link_distance
        } else if (a.min(b), a.max(b)) == (2, 3) {
            self.config.detail_link_distance
        } else {
            self.config.link_distance
        }
    }

    fn seed_particles(&self, nodes: &[&PersonaNode], rng: &mut StdRng) -> Vec<Particle> {
        let center = self.config.center();
        nodes
            .iter()
            .map(|node| {
                let layer = usize::from(node.layer().min(3));
                let radius = self.config.node_radii[layer];
                if layer == 0 {
                    return Particle {
                        x: center.x,
                        y: center.y,
                        vx: 0.0,
                        vy: 0.0,
                        layer,
                        radius,
                        pinned: true,
                    };
                }
                let angle = rng.gen_range(0.0..TAU);
                let ring = self.config.initial_ring_spacing
                    * layer as f64
                    * (0.85 + 0.3 * rng.gen::<f64>());
                let p = center.offset(ring, angle);
                Particle {
                    x: p.x,
                    y: p.y,
                    vx: 0.0,
                    vy: 0.0,
                    layer,
                    radius,
                    pinned: false,
                }
            })
            .collect()
    }

    fn build_links(
        &self,
        particles: &[Particle],
        pairs: &[(usize, usize)],
    ) -> Vec<Link> {
        let mut degree = vec![0usize; particles.len()];
        for &(s, t) in pairs {
            degree[s] += 1;
            degree[t] += 1;
        }

        pairs
            .iter()
            .map(|&(s, t)| {
                let bias = if particles[s].pinned {
                    1.0
                } else if particles[t].pinned {
                    0.0
                } else {
                    degree[s] as f64 / (degree[s] + degree[t]) as f64
                };
                Link {
                    source: s,
                    target: t,
                    distance: self.link_distance(particles[s].layer, particles[t].layer),
                    bias,
                }
            })
            .collect()
    }

    fn simulate(&self, particles: &mut [Particle], links: &[Link], rng: &mut StdRng) {
        let iterations = self.config.iterations;
        if iterations == 0 || particles.is_empty() {
            return;
        }

        let center = self.config.center();
        let alpha_decay = 1.0 - self.config.alpha_min.powf(1.0 / iterations as f64);
        let mut alpha = 1.0;

        for _ in 0..iterations {
            alpha -= alpha * alpha_decay;

            self.apply_links(particles, links, alpha, rng);
            self.apply_charge(particles, alpha, rng);
            self.apply_centering(particles, alpha, center);
            self.apply_collision(particles, rng);

            let keep = 1.0 - self.config.velocity_decay;
            for p in particles.iter_mut() {
                if p.pinned {
                    p.x = center.x;
                    p.y = center.y;
                    p.vx = 0.0;
                    p.vy = 0.0;
                    continue;
                }
                p.vx *= keep;
                p.vy *= keep;
                p.x += p.vx;
                p.y += p.vy;
            }
        }
    }

    fn apply_links(&self, particles: &mut [Particle], links: &[Link], alpha: f64, rng: &mut StdRng) {
        for link in links {
            let (s, t) = (&particles[link.source], &particles[link.target]);
            let mut dx = t.x + t.vx - s.x - s.vx;
            let mut dy = t.y + t.vy - s.y - s.vy;
            if dx == 0.0 {
                dx = jiggle(rng);
            }
            if dy == 0.0 {
                dy = jiggle(rng);
            }
            let l = dx.hypot(dy);
            let k = (l - link.distance) / l * alpha * self.config.link_strength;
            dx *= k;
            dy *= k;

            let t = &mut particles[link.target];
            t.vx -= dx * link.bias;
            t.vy -= dy * link.bias;
            let s = &mut particles[link.source];
            s.vx += dx * (1.0 - link.bias);
            s.vy += dy * (1.0 - link.bias);
        }
    }

    fn apply_charge(&self, particles: &mut [Particle], alpha: f64, rng: &mut StdRng) {
        let min2 = self.config.charge_distance_min.powi(2);
        for i in 0..particles.len() {
            if particles[i].pinned {
                continue;
            }
            let (mut fx, mut fy) = (0.0, 0.0);
            for j in 0..particles.len() {
                if i == j {
                    continue;
                }
                let mut dx = particles[j].x - particles[i].x;
                let mut dy = particles[j].y - particles[i].y;
                if dx == 0.0 {
                    dx = jiggle(rng);
                }
                if dy == 0.0 {
                    dy = jiggle(rng);
                }
                let mut l2 = dx * dx + dy * dy;
                if l2 < min2 {
                    l2 = (min2 * l2).sqrt();
                }
                let w = self.config.charge[particles[j].layer] * alpha / l2;
                fx += dx * w;
                fy += dy * w;
            }
            particles[i].vx += fx;
            particles[i].vy += fy;
        }
    }

    fn apply_centering(&self, particles: &mut [Particle], alpha: f64, center: LayoutPoint) {
        let k = self.config.center_strength * alpha;
        for p in particles.iter_mut().filter(|p| !p.pinned) {
            p.vx += (center.x - p.x) * k;
            p.vy += (center.y - p.y) * k;
        }
    }

    fn apply_collision(&self, particles: &mut [Particle], rng: &mut StdRng) {
        let n = particles.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&particles[i], &particles[j]);
                let r = a.radius + b.radius + self.config.collision_padding;
                let mut dx = (a.x + a.vx) - (b.x + b.vx);
                let mut dy = (a.y + a.vy) - (b.y + b.vy);
                let l2 = dx * dx + dy * dy;
                if l2 >= r * r {
                    continue;
                }
                if dx == 0.0 {
                    dx = jiggle(rng);
                }
                if dy == 0.0 {
                    dy = jiggle(rng);
                }
                let l = dx.hypot(dy);
                let k = (r - l) / l * self.config.collision_strength;
                let (share_a, share_b) = shares(a, b);
                dx *= k;
                dy *= k;

                particles[i].vx += dx * share_a;
                particles[i].vy += dy * share_a;
                particles[j].vx -= dx * share_b;
                particles[j].vy -= dy * share_b;
            }
        }
    }

    /// Push overlapping discs apart until none overlap (or passes run out)
    fn resolve_overlaps(&self, particles: &mut [Particle]) {
        let n = particles.len();
        for pass in 0..MAX_RESOLVE_PASSES {
            let mut moved = false;
            for i in 0..n {
                for j in (i + 1)..n {
                    let (a, b) = (&particles[i], &particles[j]);
                    if a.pinned && b.pinned {
                        continue;
                    }
                    let min = a.radius + b.radius;
                    let dx = a.x - b.x;
                    let dy = a.y - b.y;
                    let l = dx.hypot(dy);
                    if l >= min {
                        continue;
                    }
                    let (share_a, share_b) = shares(a, b);
                    let (ux, uy, push) = if l < f64::EPSILON {
                        // Coincident: separate along a fixed per-pair direction
                        let angle = (i * 7 + j * 13) as f64;
                        (angle.cos(), angle.sin(), min + 1e-6)
                    } else {
                        (dx / l, dy / l, min - l + 1e-6)
                    };
                    particles[i].x += ux * push * share_a;
                    particles[i].y += uy * push * share_a;
                    particles[j].x -= ux * push * share_b;
                    particles[j].y -= uy * push * share_b;
                    moved = true;
                }
            }
            if !moved {
                log::debug!("Force layout overlaps cleared after {} passes", pass);
                return;
            }
        }
        log::warn!(
            "Force layout still has overlaps after {} passes",
            MAX_RESOLVE_PASSES
        );
    }
}

/// How a correction between two particles is split: by squared radius, and
/// entirely onto the free particle when the other is pinned.
fn shares(a: &Particle, b: &Particle) -> (f64, f64) {
    match (a.pinned, b.pinned) {
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        _ => {
            let (ra, rb) = (a.radius * a.radius, b.radius * b.radius);
            let share_a = rb / (ra + rb);
            (share_a, 1.0 - share_a)
        }
    }
}

fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.gen::<f64>() - 0.5) * 1e-6
}

impl LayoutEngine for ForceLayout {
    fn kind(&self) -> LayoutKind {
        LayoutKind::Force
    }

    fn layout(
        &self,
        nodes: &[PersonaNode],
        edges: &[PersonaEdge],
        interaction: &InteractionState,
    ) -> LayoutResult {
        let graph = PersonaGraph::new(nodes, edges);

        let mut seen = HashSet::new();
        let order: Vec<&PersonaNode> = nodes.iter().filter(|n| seen.insert(n.id.as_str())).collect();
        let index: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut particles = self.seed_particles(&order, &mut rng);

        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(edges.len());
        let mut joined: HashSet<(usize, usize)> = HashSet::new();
        for edge in edges {
            if let (Some(&s), Some(&t)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                if s != t {
                    pairs.push((s, t));
                    joined.insert((s.min(t), s.max(t)));
                }
            }
        }

        // Anchor every story to the profile even without an explicit edge
        let mut center_edges: Vec<(String, String)> = Vec::new();
        if let Some(profile) = order.iter().find(|n| n.node_type() == NodeType::ProfileSummary) {
            let p = index[profile.id.as_str()];
            for story in order.iter().filter(|n| n.node_type() == NodeType::KeyStory) {
                let s = index[story.id.as_str()];
                if joined.insert((p.min(s), p.max(s))) {
                    pairs.push((p, s));
                    center_edges.push((profile.id.clone(), story.id.clone()));
                }
            }
        }

        let links = self.build_links(&particles, &pairs);
        self.simulate(&mut particles, &links, &mut rng);
        self.resolve_overlaps(&mut particles);

        log::debug!(
            "Force layout: {} particles, {} links ({} synthetic), {} ticks",
            particles.len(),
            links.len(),
            center_edges.len(),
            self.config.iterations
        );

        let positions: BTreeMap<String, LayoutPoint> = order
            .iter()
            .zip(&particles)
            .map(|(node, p)| (node.id.clone(), LayoutPoint::new(p.x, p.y)))
            .collect();

        finish(
            &graph,
            nodes,
            edges,
            positions,
            &self.config.node_radii,
            &center_edges,
            interaction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EdgeKind;
    use persona_graph::{build_edges, build_nodes, RawNode};

    fn sample() -> Vec<PersonaNode> {
        build_nodes(&[
            RawNode::new(NodeType::ProfileSummary, "P"),
            RawNode::new(NodeType::EssayAngle, "A").with_tags(["x", "y"]),
            RawNode::new(NodeType::KeyStory, "S1").with_tags(["x", "y", "z"]),
            RawNode::new(NodeType::KeyStory, "S2").with_tags(["w"]),
            RawNode::new(NodeType::Detail, "D1").with_tags(["z"]),
            RawNode::new(NodeType::Detail, "D2").with_tags(["w"]),
        ])
    }

    #[test]
    fn test_default_config_valid() {
        assert!(ForceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_positive_charge() {
        let config = ForceConfig {
            charge: [-600.0, 10.0, -200.0, -60.0],
            ..Default::default()
        };
        assert!(ForceLayout::try_new(config).is_err());
    }

    #[test]
    fn test_profile_is_pinned_at_center() {
        let nodes = sample();
        let edges = build_edges(&nodes);
        let layout = ForceLayout::default();
        let result = layout.layout(&nodes, &edges, &InteractionState::default());
        assert_eq!(result.position("profile-p"), Some(layout.config().center()));
    }

    #[test]
    fn test_seeded_layout_is_deterministic() {
        let nodes = sample();
        let edges = build_edges(&nodes);
        let layout = ForceLayout::default();
        let a = layout.layout(&nodes, &edges, &InteractionState::default());
        let b = layout.layout(&nodes, &edges, &InteractionState::default());
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn test_zero_iterations_keeps_initial_rings() {
        let nodes = sample();
        let layout = ForceLayout::new(ForceConfig {
            iterations: 0,
            node_radii: [0.1; 4],
            ..Default::default()
        });
        let result = layout.layout(&nodes, &[], &InteractionState::default());
        let center = layout.config().center();
        for node in &nodes {
            let d = result.position(&node.id).unwrap().distance(&center);
            let ring = 90.0 * f64::from(node.layer());
            assert!(d >= ring * 0.85 - 1e-6 && d <= ring * 1.15 + 1e-6, "{} at {d}", node.id);
        }
    }

    #[test]
    fn test_synthetic_center_edges_for_unlinked_stories() {
        let nodes = sample();
        let edges = build_edges(&nodes);
        let result = ForceLayout::default().layout(&nodes, &edges, &InteractionState::default());

        let center: Vec<(&str, &str)> = result
            .edge_styles
            .iter()
            .filter(|e| e.kind == EdgeKind::Center)
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(center, vec![("profile-p", "story-s1"), ("profile-p", "story-s2")]);
        assert!(result.edge_styles.iter().all(|e| e.kind != EdgeKind::Center || e.relation.is_none()));
    }

    #[test]
    fn test_no_overlap_after_resolution() {
        let nodes = sample();
        let edges = build_edges(&nodes);
        let layout = ForceLayout::default();
        let result = layout.layout(&nodes, &edges, &InteractionState::show_all());
        let ids: Vec<&String> = result.positions.keys().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                let d = result.positions[*a].distance(&result.positions[*b]);
                let min = result.radii[*a] + result.radii[*b];
                assert!(d >= min - 1e-6, "{a} and {b} overlap: {d} < {min}");
            }
        }
    }
}

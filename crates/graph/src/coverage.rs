use crate::types::{NodeType, PersonaEdge, PersonaNode};
use serde::{Deserialize, Serialize};

/// Coverage category, in the fixed order used for tie-breaking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageCategory {
    Goals,
    Evidence,
    Skills,
    Values,
    Tensions,
}

impl CoverageCategory {
    pub const ALL: [Self; 5] = [
        Self::Goals,
        Self::Evidence,
        Self::Skills,
        Self::Values,
        Self::Tensions,
    ];

    /// Count that saturates the category at 100%
    pub fn target(self) -> usize {
        match self {
            Self::Goals => 5,
            Self::Evidence => 12,
            Self::Skills => 8,
            Self::Values => 6,
            Self::Tensions => 3,
        }
    }

    /// Weight in the overall blend
    pub fn weight(self) -> f64 {
        match self {
            Self::Goals => 0.20,
            Self::Evidence => 0.30,
            Self::Skills => 0.20,
            Self::Values => 0.15,
            Self::Tensions => 0.15,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goals => "goals",
            Self::Evidence => "evidence",
            Self::Skills => "skills",
            Self::Values => "values",
            Self::Tensions => "tensions",
        }
    }
}

/// Five-category completeness summary of the persona graph (percentages)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    pub goals: f64,
    pub evidence: f64,
    pub skills: f64,
    pub values: f64,
    pub tensions: f64,
    pub lowest: CoverageCategory,
    pub overall: f64,
}

impl CoverageMetrics {
    pub fn get(&self, category: CoverageCategory) -> f64 {
        match category {
            CoverageCategory::Goals => self.goals,
            CoverageCategory::Evidence => self.evidence,
            CoverageCategory::Skills => self.skills,
            CoverageCategory::Values => self.values,
            CoverageCategory::Tensions => self.tensions,
        }
    }
}

/// Raw per-category counts feeding the percentages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCounts {
    pub goals: usize,
    pub evidence: usize,
    pub skills: usize,
    pub values: usize,
    pub tensions: usize,
}

impl CoverageCounts {
    pub fn collect(nodes: &[PersonaNode], edges: &[PersonaEdge]) -> Self {
        let details = || nodes.iter().filter(|n| n.node_type() == NodeType::Detail);

        Self {
            goals: details().filter(|n| n.has_tag("goal")).count(),
            evidence: nodes
                .iter()
                .filter(|n| n.node_type() == NodeType::KeyStory)
                .count(),
            skills: details().filter(|n| n.has_tag("skill")).count(),
            values: details().filter(|n| n.has_tag("value")).count(),
            tensions: edges.iter().filter(|e| e.tension).count(),
        }
    }

    pub fn get(&self, category: CoverageCategory) -> usize {
        match category {
            CoverageCategory::Goals => self.goals,
            CoverageCategory::Evidence => self.evidence,
            CoverageCategory::Skills => self.skills,
            CoverageCategory::Values => self.values,
            CoverageCategory::Tensions => self.tensions,
        }
    }
}

fn percent(count: usize, target: usize) -> f64 {
    (count as f64 / target as f64 * 100.0).min(100.0)
}

/// Score the graph's coverage. Pure; safe to call on every render.
pub fn score_coverage(nodes: &[PersonaNode], edges: &[PersonaEdge]) -> CoverageMetrics {
    let counts = CoverageCounts::collect(nodes, edges);
    let pct = |c: CoverageCategory| percent(counts.get(c), c.target());

    // Strict `<` keeps the first category on ties
    let mut lowest = CoverageCategory::Goals;
    for category in CoverageCategory::ALL {
        if pct(category) < pct(lowest) {
            lowest = category;
        }
    }

    let overall = CoverageCategory::ALL
        .iter()
        .map(|c| c.weight() * pct(*c))
        .sum();

    CoverageMetrics {
        goals: pct(CoverageCategory::Goals),
        evidence: pct(CoverageCategory::Evidence),
        skills: pct(CoverageCategory::Skills),
        values: pct(CoverageCategory::Values),
        tensions: pct(CoverageCategory::Tensions),
        lowest,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_edges, build_nodes, RawNode};
    use crate::types::Archetype;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_graph_scores_zero() {
        let m = score_coverage(&[], &[]);
        for c in CoverageCategory::ALL {
            assert_eq!(m.get(c), 0.0);
        }
        assert_eq!(m.overall, 0.0);
        assert_eq!(m.lowest, CoverageCategory::Goals);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = CoverageCategory::ALL.iter().map(|c| c.weight()).sum();
        assert!(approx(total, 1.0));
    }

    #[test]
    fn test_counts_are_capped_and_blended() {
        let mut raw: Vec<RawNode> = (0..7)
            .map(|i| RawNode::new(NodeType::Detail, format!("goal {i}")).with_tags(["goal"]))
            .collect();
        raw.push(RawNode::new(NodeType::Detail, "skill").with_tags(["skill", "value"]));
        raw.extend((0..3).map(|i| RawNode::new(NodeType::KeyStory, format!("story {i}"))));

        let nodes = build_nodes(&raw);
        let m = score_coverage(&nodes, &[]);

        assert_eq!(m.goals, 100.0);
        assert!(approx(m.evidence, 25.0));
        assert!(approx(m.skills, 12.5));
        assert!(approx(m.values, 100.0 / 6.0));
        assert_eq!(m.tensions, 0.0);
        assert_eq!(m.lowest, CoverageCategory::Tensions);
        let expected = 0.2 * 100.0 + 0.3 * 25.0 + 0.2 * 12.5 + 0.15 * (100.0 / 6.0);
        assert!(approx(m.overall, expected));
    }

    #[test]
    fn test_tension_edges_count() {
        let nodes = build_nodes(&[
            RawNode::new(NodeType::EssayAngle, "Winner").with_archetype(Archetype::Achiever),
            RawNode::new(NodeType::KeyStory, "Flop").with_tags(["failure"]),
        ]);
        let edges = build_edges(&nodes);
        let m = score_coverage(&nodes, &edges);
        assert!(approx(m.tensions, 100.0 / 3.0));
        assert!(approx(m.evidence, 100.0 / 12.0));
        assert_eq!(m.lowest, CoverageCategory::Goals);
    }

    #[test]
    fn test_ties_resolve_in_category_order() {
        let nodes = build_nodes(&[RawNode::new(NodeType::Detail, "g").with_tags(["goal"])]);
        let m = score_coverage(&nodes, &[]);
        assert_eq!(m.lowest, CoverageCategory::Evidence);
    }
}

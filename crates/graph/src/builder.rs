use crate::error::{GraphError, Result};
use crate::rules::{EdgeRules, TensionPairing, TensionRule};
use crate::types::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"));

/// Raw node as produced by a fixture or an answer extraction.
///
/// Everything except the type is optional or defaulted; the builder fills in
/// a deterministic id, normalizes tags and clamps confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star: Option<StarRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<Archetype>,
}

impl RawNode {
    pub fn new(node_type: NodeType, title: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_archetype(mut self, archetype: Archetype) -> Self {
        self.archetype = Some(archetype);
        self
    }

    pub fn with_star(mut self, star: StarRecord) -> Self {
        self.star = Some(star);
        self
    }

    fn explicit_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Id this raw node resolves to, before collision handling
    pub fn resolved_id(&self) -> Option<String> {
        if let Some(id) = self.explicit_id() {
            return Some(id.to_string());
        }
        let node_type = self.node_type?;
        if self.title.trim().is_empty() {
            return None;
        }
        Some(format!("{}-{}", node_type.id_prefix(), slugify(&self.title)))
    }

    fn into_node(self, id: String) -> Option<PersonaNode> {
        let node_type = self.node_type?;
        let kind = match node_type {
            NodeType::ProfileSummary => NodeKind::ProfileSummary,
            NodeType::EssayAngle => NodeKind::EssayAngle {
                archetype: self.archetype,
            },
            NodeType::KeyStory => NodeKind::KeyStory {
                star: self.star.unwrap_or_default(),
            },
            NodeType::Detail => NodeKind::Detail,
        };

        let title = match self.title.trim() {
            "" => id.clone(),
            t => t.to_string(),
        };

        Some(PersonaNode {
            id,
            kind,
            title,
            content: self.content,
            tags: normalize_tags(&self.tags),
            confidence: normalize_confidence(self.confidence),
        })
    }
}

/// Lower-case, dash-separated slug; never empty
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let slug = NON_SLUG.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Trimmed, lower-cased, non-empty tags
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_confidence(confidence: Option<f64>) -> f64 {
    match confidence {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => default_confidence(),
    }
}

/// Build typed nodes from raw fixtures or extraction results.
///
/// Malformed entries (no type, or neither id nor title) are skipped. Only the
/// first profile summary is kept. Slug collisions inside the batch get `-2`,
/// `-3`, ... suffixes in input order, so rebuilding the same input yields the
/// same ids.
pub fn build_nodes(raw: &[RawNode]) -> Vec<PersonaNode> {
    let mut nodes: Vec<PersonaNode> = Vec::with_capacity(raw.len());
    let mut used: HashSet<String> = HashSet::new();
    let mut has_profile = false;

    for entry in raw {
        let Some(base_id) = entry.resolved_id() else {
            log::debug!("Skipping raw node without type or title: {:?}", entry.title);
            continue;
        };

        if entry.node_type == Some(NodeType::ProfileSummary) {
            if has_profile {
                log::warn!("Dropping extra profile summary '{}'", base_id);
                continue;
            }
            has_profile = true;
        }

        let id = if entry.explicit_id().is_some() {
            if used.contains(&base_id) {
                log::warn!("Dropping raw node with duplicate id '{}'", base_id);
                continue;
            }
            base_id
        } else {
            unique_id(&base_id, &used)
        };

        if let Some(node) = entry.clone().into_node(id) {
            used.insert(node.id.clone());
            nodes.push(node);
        }
    }

    nodes
}

fn unique_id(base: &str, used: &HashSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Result of folding one raw node into an existing node list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// New node appended
    Inserted(String),

    /// Node with the same id replaced in place
    Replaced(String),

    /// Profile summary with a different id replaced the existing profile
    ReplacedProfile { previous: String, current: String },
}

impl MergeOutcome {
    pub fn node_id(&self) -> &str {
        match self {
            Self::Inserted(id) | Self::Replaced(id) => id,
            Self::ReplacedProfile { current, .. } => current,
        }
    }
}

/// Fold a single raw node into `nodes`.
///
/// An existing node with the same resolved id is replaced in place; a second
/// profile summary replaces the first. Returns `None` for malformed input.
pub fn merge_node(nodes: &mut Vec<PersonaNode>, raw: RawNode) -> Option<MergeOutcome> {
    let id = raw.resolved_id()?;
    let node = raw.into_node(id.clone())?;

    if let Some(slot) = nodes.iter_mut().find(|n| n.id == id) {
        *slot = node;
        return Some(MergeOutcome::Replaced(id));
    }

    if node.node_type() == NodeType::ProfileSummary {
        if let Some(slot) = nodes
            .iter_mut()
            .find(|n| n.node_type() == NodeType::ProfileSummary)
        {
            let previous = std::mem::replace(slot, node).id;
            return Some(MergeOutcome::ReplacedProfile {
                previous,
                current: id,
            });
        }
    }

    nodes.push(node);
    Some(MergeOutcome::Inserted(id))
}

/// Build edges connecting nodes via tag overlap and archetype heuristics
pub struct EdgeBuilder {
    rules: EdgeRules,
}

impl EdgeBuilder {
    pub fn new(rules: EdgeRules) -> Self {
        Self { rules }
    }

    /// Validate the rules before building
    pub fn try_new(rules: EdgeRules) -> Result<Self> {
        rules.validate().map_err(GraphError::InvalidRules)?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &EdgeRules {
        &self.rules
    }

    /// Derive every edge from scratch. Rules are additive and applied in
    /// order: profile -> angle, angle -> story, story -> detail, tensions.
    pub fn build(&self, nodes: &[PersonaNode]) -> Vec<PersonaEdge> {
        let mut edges = EdgeSet::default();

        let profile = nodes
            .iter()
            .find(|n| n.node_type() == NodeType::ProfileSummary);
        let angles: Vec<&PersonaNode> = of_type(nodes, NodeType::EssayAngle);
        let stories: Vec<&PersonaNode> = of_type(nodes, NodeType::KeyStory);
        let details: Vec<&PersonaNode> = of_type(nodes, NodeType::Detail);

        // Phase 1: every angle traces back to the profile
        if let Some(profile) = profile {
            for angle in &angles {
                edges.push(PersonaEdge::new(
                    &profile.id,
                    &angle.id,
                    Relation::Supports,
                    self.rules.profile_strength,
                ));
            }
        }

        // Phase 2: angles built on stories sharing enough tags
        for angle in &angles {
            for story in &stories {
                let shared = angle.shared_tags(story);
                if shared >= self.rules.angle_story_min_shared {
                    edges.push(PersonaEdge::new(
                        &angle.id,
                        &story.id,
                        Relation::BuildsOn,
                        self.rules.angle_story_base + self.rules.per_shared_tag * shared as f64,
                    ));
                }
            }
        }

        // Phase 3: stories enabling details
        for story in &stories {
            for detail in &details {
                let shared = story.shared_tags(detail);
                if shared >= self.rules.story_detail_min_shared {
                    edges.push(PersonaEdge::new(
                        &story.id,
                        &detail.id,
                        Relation::Enables,
                        self.rules.story_detail_base + self.rules.per_shared_tag * shared as f64,
                    ));
                }
            }
        }

        // Phase 4: productive contradictions
        for rule in &self.rules.tensions {
            for (angle, story) in tension_pairs(rule, &angles, &stories) {
                edges.push(PersonaEdge::new(
                    &angle.id,
                    &story.id,
                    Relation::Contradicts,
                    self.rules.tension_strength,
                ));
            }
        }

        log::debug!(
            "Built persona edges: {} nodes, {} edges",
            nodes.len(),
            edges.items.len()
        );

        edges.items
    }
}

impl Default for EdgeBuilder {
    fn default() -> Self {
        Self::new(EdgeRules::default())
    }
}

/// Build edges with the default rules
pub fn build_edges(nodes: &[PersonaNode]) -> Vec<PersonaEdge> {
    EdgeBuilder::default().build(nodes)
}

fn of_type(nodes: &[PersonaNode], node_type: NodeType) -> Vec<&PersonaNode> {
    nodes.iter().filter(|n| n.node_type() == node_type).collect()
}

fn tension_pairs<'a>(
    rule: &TensionRule,
    angles: &[&'a PersonaNode],
    stories: &[&'a PersonaNode],
) -> Vec<(&'a PersonaNode, &'a PersonaNode)> {
    let matching_angles: Vec<&PersonaNode> = angles
        .iter()
        .copied()
        .filter(|a| {
            a.archetype()
                .is_some_and(|arch| rule.angle_archetypes.contains(&arch))
                || rule.angle_tags.iter().any(|t| a.has_tag(t))
        })
        .collect();
    let matching_stories: Vec<&PersonaNode> = stories
        .iter()
        .copied()
        .filter(|s| rule.story_tags.iter().any(|t| s.has_tag(t)))
        .collect();

    match rule.pairing {
        TensionPairing::FirstOnly => match (matching_angles.first(), matching_stories.first()) {
            (Some(a), Some(s)) => vec![(*a, *s)],
            _ => Vec::new(),
        },
        TensionPairing::AllPairs { max } => matching_angles
            .iter()
            .flat_map(|a| matching_stories.iter().map(move |s| (*a, *s)))
            .take(max)
            .collect(),
    }
}

/// Insertion-ordered edge list that ignores duplicates and self-loops
#[derive(Default)]
struct EdgeSet {
    items: Vec<PersonaEdge>,
    seen: HashSet<String>,
}

impl EdgeSet {
    fn push(&mut self, edge: PersonaEdge) {
        if edge.source == edge.target {
            return;
        }
        if self.seen.insert(edge.id.clone()) {
            self.items.push(edge);
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of persona node; fixes the node's layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Layer 0, the single profile summary at the centre
    ProfileSummary,

    /// Layer 1, a candidate essay framing
    EssayAngle,

    /// Layer 2, a concrete narrative extracted from an answer
    KeyStory,

    /// Layer 3, a supporting fact (goal, skill, value, ...)
    Detail,
}

impl NodeType {
    pub const ALL: [Self; 4] = [
        Self::ProfileSummary,
        Self::EssayAngle,
        Self::KeyStory,
        Self::Detail,
    ];

    pub fn layer(self) -> u8 {
        match self {
            Self::ProfileSummary => 0,
            Self::EssayAngle => 1,
            Self::KeyStory => 2,
            Self::Detail => 3,
        }
    }

    /// Prefix used when deriving slug ids
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::ProfileSummary => "profile",
            Self::EssayAngle => "angle",
            Self::KeyStory => "story",
            Self::Detail => "detail",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfileSummary => "profile_summary",
            Self::EssayAngle => "essay_angle",
            Self::KeyStory => "key_story",
            Self::Detail => "detail",
        }
    }
}

/// Persona archetype, attached to essay angles and revealed once at the end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Achiever,
    Builder,
    Leader,
    Explorer,
    Scholar,
    Advocate,
    Creator,
    Connector,
}

impl Archetype {
    /// Archetypes whose narrative is framed around winning and results
    pub fn is_achievement_oriented(self) -> bool {
        matches!(self, Self::Achiever | Self::Builder)
    }

    pub fn is_leadership(self) -> bool {
        matches!(self, Self::Leader | Self::Advocate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Achiever => "achiever",
            Self::Builder => "builder",
            Self::Leader => "leader",
            Self::Explorer => "explorer",
            Self::Scholar => "scholar",
            Self::Advocate => "advocate",
            Self::Creator => "creator",
            Self::Connector => "connector",
        }
    }
}

/// One field of a STAR record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StarField {
    Situation,
    Task,
    Action,
    Result,
    Emotion,
    Insight,
}

impl StarField {
    pub const ALL: [Self; 6] = [
        Self::Situation,
        Self::Task,
        Self::Action,
        Self::Result,
        Self::Emotion,
        Self::Insight,
    ];
}

/// Partial situation/task/action/result record for a key story.
///
/// Missing (or blank) fields are the story's gaps: the follow-up questions
/// still worth asking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<String>,
}

impl StarRecord {
    pub fn field(&self, field: StarField) -> Option<&str> {
        let value = match field {
            StarField::Situation => &self.situation,
            StarField::Task => &self.task,
            StarField::Action => &self.action,
            StarField::Result => &self.result,
            StarField::Emotion => &self.emotion,
            StarField::Insight => &self.insight,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn gaps(&self) -> Vec<StarField> {
        StarField::ALL
            .into_iter()
            .filter(|f| self.field(*f).is_none())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.gaps().is_empty()
    }
}

/// Type-specific payload of a node, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    ProfileSummary,
    EssayAngle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        archetype: Option<Archetype>,
    },
    KeyStory {
        #[serde(default)]
        star: StarRecord,
    },
    Detail,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::ProfileSummary => NodeType::ProfileSummary,
            Self::EssayAngle { .. } => NodeType::EssayAngle,
            Self::KeyStory { .. } => NodeType::KeyStory,
            Self::Detail => NodeType::Detail,
        }
    }
}

/// Vertex of the persona knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaNode {
    pub id: String,

    #[serde(flatten)]
    pub kind: NodeKind,

    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Lower-cased tags; overlap between tag sets drives edge construction
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Extraction confidence in [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

pub(crate) fn default_confidence() -> f64 {
    0.5
}

impl PersonaNode {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Distance class from the centre; always derived from the type
    pub fn layer(&self) -> u8 {
        self.node_type().layer()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn archetype(&self) -> Option<Archetype> {
        match &self.kind {
            NodeKind::EssayAngle { archetype } => *archetype,
            _ => None,
        }
    }

    pub fn star(&self) -> Option<&StarRecord> {
        match &self.kind {
            NodeKind::KeyStory { star } => Some(star),
            _ => None,
        }
    }

    /// Missing STAR fields; empty for anything but key stories
    pub fn gaps(&self) -> Vec<StarField> {
        self.star().map(StarRecord::gaps).unwrap_or_default()
    }

    pub fn shared_tags(&self, other: &PersonaNode) -> usize {
        self.tags.intersection(&other.tags).count()
    }
}

/// Relation carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Profile -> angle
    Supports,

    /// Angle -> story
    BuildsOn,

    /// Story -> detail
    Enables,

    /// Tension between two narratives
    Contradicts,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supports => "supports",
            Self::BuildsOn => "builds_on",
            Self::Enables => "enables",
            Self::Contradicts => "contradicts",
        }
    }
}

/// Directed, weighted edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relation: Relation,
    pub strength: f64,
    pub tension: bool,
}

impl PersonaEdge {
    /// Build an edge; `tension` follows the relation and the id is derived
    /// from the endpoints so rebuilds are stable.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: Relation,
        strength: f64,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}->{}:{}", source, target, relation.as_str()),
            source,
            target,
            relation,
            strength: strength.clamp(0.0, 1.0),
            tension: relation == Relation::Contradicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layers_are_distinct_and_ordered() {
        let layers: Vec<u8> = NodeType::ALL.iter().map(|t| t.layer()).collect();
        assert_eq!(layers, vec![0, 1, 2, 3]);
    }

    #[test]
    fn star_gaps_treat_blank_as_missing() {
        let star = StarRecord {
            situation: Some("Robotics regional final".to_string()),
            action: Some("   ".to_string()),
            result: Some("Placed second".to_string()),
            ..Default::default()
        };
        assert_eq!(
            star.gaps(),
            vec![
                StarField::Task,
                StarField::Action,
                StarField::Emotion,
                StarField::Insight
            ]
        );
    }

    #[test]
    fn node_deserializes_with_type_tag() {
        let node: PersonaNode = serde_json::from_value(serde_json::json!({
            "id": "angle-builder",
            "type": "essay_angle",
            "archetype": "builder",
            "title": "The builder",
            "tags": ["robotics", "engineering"],
        }))
        .unwrap();

        assert_eq!(node.layer(), 1);
        assert_eq!(node.archetype(), Some(Archetype::Builder));
        assert_eq!(node.confidence, 0.5);
        assert!(node.gaps().is_empty());
    }

    #[test]
    fn contradicts_edges_are_tension_edges() {
        let edge = PersonaEdge::new("a", "b", Relation::Contradicts, 0.5);
        assert!(edge.tension);
        assert_eq!(edge.id, "a->b:contradicts");

        let edge = PersonaEdge::new("a", "b", Relation::Supports, 1.7);
        assert!(!edge.tension);
        assert_eq!(edge.strength, 1.0);
    }
}

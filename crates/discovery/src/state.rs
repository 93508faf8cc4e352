use crate::tracks::{complete_tracks, default_tracks};
use persona_graph::{normalize_tags, NodeType, PersonaNode};
use persona_protocol::{
    ArchetypeReveal, ConversationMessage, PersonaStateSnapshot, TrackId, TrackMap, TrackStatus,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Completed tracks out of all tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackProgress {
    pub completed: usize,
    pub total: usize,
}

impl TrackProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Aggregate discovery state.
///
/// `is_loading`, `is_sending` and `error` are transient: they are reported
/// to the rendering layer but never part of a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEngineState {
    pub tracks: TrackMap,
    pub nodes: Vec<PersonaNode>,
    pub archetype: Option<ArchetypeReveal>,
    pub conversation_history: Vec<ConversationMessage>,
    pub current_track_id: Option<TrackId>,

    /// Node ids derived while each track was active
    pub track_nodes: BTreeMap<TrackId, Vec<String>>,

    pub is_loading: bool,
    pub is_sending: bool,
    pub error: Option<String>,
}

impl Default for DiscoveryEngineState {
    fn default() -> Self {
        Self {
            tracks: default_tracks(),
            nodes: Vec::new(),
            archetype: None,
            conversation_history: Vec::new(),
            current_track_id: None,
            track_nodes: BTreeMap::new(),
            is_loading: false,
            is_sending: false,
            error: None,
        }
    }
}

impl DiscoveryEngineState {
    /// Adopt a persisted snapshot, repairing what the engine relies on:
    /// every track present, unique node ids with normalised tags, a single
    /// profile summary and an archetype only when every track is completed.
    pub fn from_snapshot(snapshot: PersonaStateSnapshot) -> Self {
        let mut state = Self {
            tracks: complete_tracks(snapshot.tracks),
            nodes: dedupe_nodes(snapshot.nodes),
            archetype: snapshot.archetype,
            conversation_history: snapshot.conversation_history,
            current_track_id: snapshot.current_track_id,
            track_nodes: snapshot.track_nodes,
            ..Self::default()
        };

        let known: HashSet<&str> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        for ids in state.track_nodes.values_mut() {
            ids.retain(|id| known.contains(id.as_str()));
        }

        if state.archetype.is_some() && !state.all_tracks_completed() {
            log::warn!("Dropping archetype from snapshot: not every track is completed");
            state.archetype = None;
        }
        state
    }

    pub fn snapshot(&self) -> PersonaStateSnapshot {
        PersonaStateSnapshot {
            tracks: self.tracks.clone(),
            nodes: self.nodes.clone(),
            archetype: self.archetype.clone(),
            conversation_history: self.conversation_history.clone(),
            current_track_id: self.current_track_id,
            track_nodes: self.track_nodes.clone(),
        }
    }

    pub fn track_status(&self, track: TrackId) -> Option<TrackStatus> {
        self.tracks.get(&track).map(|t| t.status)
    }

    pub fn all_tracks_completed(&self) -> bool {
        !self.tracks.is_empty() && self.tracks.values().all(|t| t.is_completed())
    }

    pub fn progress(&self) -> TrackProgress {
        TrackProgress {
            completed: self.tracks.values().filter(|t| t.is_completed()).count(),
            total: self.tracks.len(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&PersonaNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Record `id` as derived while `track` was active
    pub(crate) fn claim_node(&mut self, track: TrackId, id: &str) {
        let owned = self.track_nodes.entry(track).or_default();
        if !owned.iter().any(|o| o == id) {
            owned.push(id.to_string());
        }
    }

    pub(crate) fn release_node(&mut self, id: &str) {
        for owned in self.track_nodes.values_mut() {
            owned.retain(|o| o != id);
        }
    }

    /// Remove nodes by id, returning how many were present
    pub(crate) fn remove_nodes(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| !ids.contains(&n.id));
        for owned in self.track_nodes.values_mut() {
            owned.retain(|id| !ids.contains(id));
        }
        before - self.nodes.len()
    }
}

fn dedupe_nodes(nodes: Vec<PersonaNode>) -> Vec<PersonaNode> {
    let mut seen = HashSet::new();
    let mut has_profile = false;
    let mut kept = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        if !seen.insert(node.id.clone()) {
            log::warn!("Dropping duplicate node id {}", node.id);
            continue;
        }
        if node.node_type() == NodeType::ProfileSummary {
            if has_profile {
                log::warn!("Dropping extra profile summary {}", node.id);
                continue;
            }
            has_profile = true;
        }
        node.tags = normalize_tags(&node.tags);
        kept.push(node);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use persona_graph::{build_nodes, RawNode};

    #[test]
    fn test_default_state_is_fresh() {
        let state = DiscoveryEngineState::default();
        assert_eq!(state.progress(), TrackProgress { completed: 0, total: 4 });
        assert!(!state.all_tracks_completed());
        assert!(state.nodes.is_empty());
        assert!(state.current_track_id.is_none());
    }

    #[test]
    fn test_snapshot_repairs_invariants() {
        let mut nodes = build_nodes(&[
            RawNode::new(NodeType::ProfileSummary, "First"),
            RawNode::new(NodeType::KeyStory, "Story"),
        ]);
        nodes.extend(build_nodes(&[RawNode::new(NodeType::ProfileSummary, "Second")]));
        nodes.push(nodes[1].clone());

        let mut track_nodes = BTreeMap::new();
        track_nodes.insert(
            TrackId::Academic,
            vec!["story-story".to_string(), "story-gone".to_string()],
        );

        let snapshot = PersonaStateSnapshot {
            nodes,
            track_nodes,
            archetype: Some(ArchetypeReveal {
                archetype: persona_graph::Archetype::Builder,
                summary: "early".to_string(),
                revealed_at: Utc::now(),
            }),
            ..Default::default()
        };

        let state = DiscoveryEngineState::from_snapshot(snapshot);
        let ids: Vec<_> = state.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["profile-first", "story-story"]);
        assert_eq!(state.track_nodes[&TrackId::Academic], vec!["story-story"]);
        assert_eq!(state.tracks.len(), 4);
        assert!(state.archetype.is_none());
    }

    #[test]
    fn test_snapshot_tags_are_normalised() {
        let mut nodes = build_nodes(&[RawNode::new(NodeType::Detail, "Med school")]);
        nodes[0].tags = ["  Goal ", "Medicine", ""]
            .into_iter()
            .map(String::from)
            .collect();

        let state = DiscoveryEngineState::from_snapshot(PersonaStateSnapshot {
            nodes,
            ..Default::default()
        });
        let tags: Vec<_> = state.nodes[0].tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["goal", "medicine"]);
        assert!(state.nodes[0].has_tag("goal"));
    }
}

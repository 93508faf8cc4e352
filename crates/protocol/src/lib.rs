//! Wire types shared between the discovery engine and its conversational
//! backend. Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use persona_graph::{Archetype, RawNode};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub mod responses;

pub use responses::{
    GoBackResponse, PersonaStateSnapshot, RedoTrackResponse, SelectTrackResponse,
    SendMessageResponse,
};

/// Id namespace of provisional (optimistic) messages. Server ids never use it.
pub const TEMP_ID_PREFIX: &str = "temp-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackId {
    Academic,
    Activities,
    Values,
    Future,
}

impl TrackId {
    pub const ALL: [Self; 4] = [Self::Academic, Self::Activities, Self::Values, Self::Future];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Activities => "activities",
            Self::Values => "values",
            Self::Future => "future",
        }
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("unknown track '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// One thematic line of questioning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,

    #[serde(default)]
    pub questions: Vec<String>,

    #[serde(default)]
    pub status: TrackStatus,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Track {
    pub fn new(id: TrackId, questions: Vec<String>) -> Self {
        Self {
            id,
            questions,
            status: TrackStatus::NotStarted,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TrackStatus::Completed
    }

    /// Move to `status`, stamping or clearing the completion time
    pub fn set_status(&mut self, status: TrackStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TrackStatus::Completed, TrackStatus::Completed) => {}
            (_, TrackStatus::Completed) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Question,
    Completion,
}

/// Archetype classification as sent by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypePayload {
    #[serde(rename = "type")]
    pub archetype: Archetype,

    pub summary: String,
}

/// Graph mutation instruction embedded in an assistant message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CanvasAction {
    Add {
        node: RawNode,
    },
    Remove {
        #[serde(rename = "nodeId")]
        node_id: String,
    },
    RevealArchetype {
        archetype: ArchetypePayload,
    },
}

/// One turn in the chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    pub id: String,

    pub role: MessageRole,

    #[serde(rename = "type", default)]
    pub kind: MessageKind,

    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub canvas_actions: Vec<CanvasAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,

    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(id: impl Into<String>, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            kind: MessageKind::Text,
            content: content.into(),
            canvas_actions: Vec::new(),
            track_id: None,
            timestamp,
        }
    }

    pub fn assistant(
        id: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            kind,
            content: content.into(),
            canvas_actions: Vec::new(),
            track_id: None,
            timestamp,
        }
    }

    pub fn with_actions(mut self, actions: Vec<CanvasAction>) -> Self {
        self.canvas_actions = actions;
        self
    }

    pub fn with_track(mut self, track: TrackId) -> Self {
        self.track_id = Some(track);
        self
    }

    /// Optimistic entry not yet confirmed by the backend
    pub fn is_provisional(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }
}

/// Terminal archetype artifact, created once every track is completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeReveal {
    #[serde(rename = "type")]
    pub archetype: Archetype,

    pub summary: String,

    pub revealed_at: DateTime<Utc>,
}

impl ArchetypeReveal {
    pub fn from_payload(payload: ArchetypePayload, revealed_at: DateTime<Utc>) -> Self {
        Self {
            archetype: payload.archetype,
            summary: payload.summary,
            revealed_at,
        }
    }
}

/// Track map keyed by id, in enumeration order
pub type TrackMap = BTreeMap<TrackId, Track>;

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

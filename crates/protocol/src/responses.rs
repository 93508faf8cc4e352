//! Payloads returned by the conversational backend, one per operation.

use crate::{double_option, ArchetypeReveal, ConversationMessage, TrackId, TrackMap, TrackStatus};
use persona_graph::PersonaNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted discovery state, fetched once at session start
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaStateSnapshot {
    #[serde(default)]
    pub tracks: TrackMap,

    #[serde(default)]
    pub nodes: Vec<PersonaNode>,

    #[serde(default)]
    pub archetype: Option<ArchetypeReveal>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,

    #[serde(default)]
    pub current_track_id: Option<TrackId>,

    /// Node ids derived while each track was active
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub track_nodes: BTreeMap<TrackId, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTrackResponse {
    pub message: ConversationMessage,

    pub current_track_id: Option<TrackId>,

    pub track_status: TrackStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Assistant reply, possibly carrying canvas actions
    pub message: ConversationMessage,

    /// Authoritative copy of the user message just sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<ConversationMessage>,

    /// Absent: pointer unchanged. `null`: the track's conversation ended.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_track_id: Option<Option<TrackId>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_status: Option<TrackStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_tracks_complete: Option<bool>,
}

impl SendMessageResponse {
    pub fn reply(message: ConversationMessage) -> Self {
        Self {
            message,
            user_message: None,
            current_track_id: None,
            track_status: None,
            all_tracks_complete: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoBackResponse {
    pub message: ConversationMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedoTrackResponse {
    pub message: ConversationMessage,

    pub current_track_id: Option<TrackId>,

    pub track_status: TrackStatus,

    #[serde(default)]
    pub removed_node_ids: Vec<String>,
}

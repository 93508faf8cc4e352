use crate::backend::DiscoveryBackend;
use crate::error::{DiscoveryError, InvalidOperation, Result};
use crate::state::{DiscoveryEngineState, TrackProgress};
use crate::transcript;
use chrono::Utc;
use persona_graph::{
    merge_node, score_coverage, CoverageMetrics, EdgeBuilder, MergeOutcome, PersonaEdge,
};
use persona_layout::{InteractionState, LayoutEngines, LayoutKind, LayoutResult};
use persona_protocol::{
    ArchetypePayload, ArchetypeReveal, CanvasAction, SendMessageResponse, TrackId, TrackStatus,
};
use std::collections::HashSet;

/// Discovery state machine over a conversational backend.
///
/// Mutating operations take `&mut self`, so a caller can never overlap two
/// of them. Every failing operation returns the error and also records its
/// message in [`DiscoveryEngineState::error`] for the rendering layer.
pub struct DiscoveryEngine<B> {
    backend: B,
    state: DiscoveryEngineState,
    edges: EdgeBuilder,
    layouts: LayoutEngines,
}

impl<B: DiscoveryBackend> DiscoveryEngine<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: DiscoveryEngineState::default(),
            edges: EdgeBuilder::default(),
            layouts: LayoutEngines::default(),
        }
    }

    pub fn with_edge_builder(mut self, edges: EdgeBuilder) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_layouts(mut self, layouts: LayoutEngines) -> Self {
        self.layouts = layouts;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &DiscoveryEngineState {
        &self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state.is_sending
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    /// Load the persisted state at session start
    pub async fn initialize(&mut self) -> Result<()> {
        self.state.is_loading = true;
        let result = self.backend.fetch_persona_state().await;
        self.state.is_loading = false;

        match result {
            Ok(snapshot) => {
                self.state = DiscoveryEngineState::from_snapshot(snapshot);
                log::info!(
                    "Loaded persona state: {} nodes, {} messages, {}/{} tracks completed",
                    self.state.nodes.len(),
                    self.state.conversation_history.len(),
                    self.progress().completed,
                    self.progress().total,
                );
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    pub async fn select_track(&mut self, track: TrackId) -> Result<()> {
        self.recover_abandoned_send();
        if !self.state.tracks.contains_key(&track) {
            return Err(self.fail(InvalidOperation::UnknownTrack(track).into()));
        }

        let response = match self.backend.select_track(track).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        if response.current_track_id != Some(track) {
            log::debug!(
                "Backend reported current track {:?} after selecting {track}",
                response.current_track_id
            );
        }

        let now = Utc::now();
        if let Some(entry) = self.state.tracks.get_mut(&track) {
            // Only redo may reopen a completed track
            if entry.is_completed() {
                log::debug!("Re-selected completed track {track}; status kept");
            } else {
                entry.set_status(response.track_status, now);
            }
        }

        transcript::append(&mut self.state.conversation_history, response.message);
        self.state.current_track_id = Some(track);
        self.succeed();
        log::info!("Selected track {track}");
        Ok(())
    }

    /// Send a user answer for the active track.
    ///
    /// The user message shows up in the transcript immediately under a
    /// provisional id; it is replaced on success and removed on failure.
    pub async fn send_message(&mut self, content: &str) -> Result<()> {
        self.recover_abandoned_send();

        let content = content.trim();
        if content.is_empty() {
            return Err(self.fail(InvalidOperation::EmptyMessage.into()));
        }
        let Some(track) = self.state.current_track_id else {
            return Err(self.fail(InvalidOperation::NoActiveTrack.into()));
        };

        transcript::push_provisional(
            &mut self.state.conversation_history,
            content,
            Some(track),
            Utc::now(),
        );
        self.state.is_sending = true;

        let result = self.backend.send_message(content).await;
        self.state.is_sending = false;

        match result {
            Ok(response) => {
                self.apply_send_response(track, response);
                self.succeed();
                Ok(())
            }
            Err(e) => {
                transcript::rollback_provisional(&mut self.state.conversation_history);
                Err(self.fail(e.into()))
            }
        }
    }

    pub async fn go_back_to_track_selection(&mut self) -> Result<()> {
        self.recover_abandoned_send();

        let response = match self.backend.go_back_to_track_selection().await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        transcript::append(&mut self.state.conversation_history, response.message);
        self.state.current_track_id = None;
        self.succeed();
        Ok(())
    }

    /// Reopen a completed track, purging the nodes derived from it
    pub async fn redo_track(&mut self, track: TrackId) -> Result<()> {
        self.recover_abandoned_send();

        let status = match self.state.track_status(track) {
            Some(status) => status,
            None => return Err(self.fail(InvalidOperation::UnknownTrack(track).into())),
        };
        if status != TrackStatus::Completed {
            return Err(self.fail(InvalidOperation::RedoNotCompleted { track, status }.into()));
        }

        let response = match self.backend.redo_track(track).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail(e.into())),
        };

        let mut purge: HashSet<String> = self
            .state
            .track_nodes
            .remove(&track)
            .unwrap_or_default()
            .into_iter()
            .collect();
        purge.extend(response.removed_node_ids);
        let removed = self.state.remove_nodes(&purge);

        if response.track_status != TrackStatus::InProgress {
            log::debug!(
                "Backend reported {:?} after redo of {track}; reopening as in_progress",
                response.track_status
            );
        }
        if let Some(entry) = self.state.tracks.get_mut(&track) {
            entry.set_status(TrackStatus::InProgress, Utc::now());
        }

        if self.state.archetype.take().is_some() {
            log::info!("Archetype cleared by redo of {track}");
        }

        transcript::append(&mut self.state.conversation_history, response.message);
        self.state.current_track_id = response.current_track_id;
        self.succeed();
        log::info!("Redo of track {track} removed {removed} nodes");
        Ok(())
    }

    /// Back to a fresh session: every track `not_started`, no nodes,
    /// transcript or archetype. Track questions are kept.
    pub fn reset(&mut self) {
        let mut fresh = DiscoveryEngineState::default();
        for (id, track) in &self.state.tracks {
            if let Some(entry) = fresh.tracks.get_mut(id) {
                entry.questions = track.questions.clone();
            }
        }
        self.state = fresh;
        log::info!("Discovery state reset");
    }

    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }

    /// Edges derived from the current nodes
    pub fn edges(&self) -> Vec<PersonaEdge> {
        self.edges.build(&self.state.nodes)
    }

    pub fn coverage(&self) -> CoverageMetrics {
        score_coverage(&self.state.nodes, &self.edges())
    }

    pub fn layout(&self, kind: LayoutKind, interaction: &InteractionState) -> LayoutResult {
        self.layouts
            .layout(kind, &self.state.nodes, &self.edges(), interaction)
    }

    pub fn progress(&self) -> TrackProgress {
        self.state.progress()
    }

    pub fn all_tracks_completed(&self) -> bool {
        self.state.all_tracks_completed()
    }

    fn apply_send_response(&mut self, track: TrackId, response: SendMessageResponse) {
        let SendMessageResponse {
            message,
            user_message,
            current_track_id,
            track_status,
            all_tracks_complete,
        } = response;

        let actions = message.canvas_actions.clone();
        transcript::reconcile(&mut self.state.conversation_history, user_message, message);

        let reveal = self.apply_canvas_actions(track, actions);

        let now = Utc::now();
        if let Some(status) = track_status {
            if let Some(entry) = self.state.tracks.get_mut(&track) {
                // Only redo may reopen a completed track
                if !entry.is_completed() {
                    entry.set_status(status, now);
                } else if status != TrackStatus::Completed {
                    log::debug!(
                        "Backend reported {status:?} for completed track {track}; status kept"
                    );
                }
            }
        }
        if let Some(next) = current_track_id {
            self.state.current_track_id = next;
        }

        let all_completed = self.state.all_tracks_completed();
        if let Some(hint) = all_tracks_complete {
            if hint != all_completed {
                log::warn!(
                    "Backend reported allTracksComplete={hint} but local tracks say {all_completed}"
                );
            }
        }

        if !all_completed {
            if self.state.archetype.take().is_some() {
                log::info!("Archetype cleared: track {track} is no longer completed");
            }
            if reveal.is_some() {
                log::warn!("Ignoring archetype reveal: not every track is completed");
            }
            return;
        }

        let Some(payload) = reveal else {
            return;
        };
        if self.state.archetype.is_some() {
            log::debug!("Archetype already revealed; ignoring repeat");
            return;
        }
        log::info!("Archetype revealed: {}", payload.archetype.as_str());
        self.state.archetype = Some(ArchetypeReveal::from_payload(payload, now));
    }

    /// Fold canvas actions into the node list one by one. A malformed
    /// action is skipped without aborting the rest. Returns the last
    /// archetype reveal seen.
    fn apply_canvas_actions(
        &mut self,
        track: TrackId,
        actions: Vec<CanvasAction>,
    ) -> Option<ArchetypePayload> {
        let mut reveal = None;
        for action in actions {
            match action {
                CanvasAction::Add { node } => {
                    let title = node.title.clone();
                    match merge_node(&mut self.state.nodes, node) {
                        Some(MergeOutcome::ReplacedProfile { previous, current }) => {
                            log::debug!("Profile {previous} replaced by {current}");
                            self.state.release_node(&previous);
                            self.state.claim_node(track, &current);
                        }
                        Some(outcome) => self.state.claim_node(track, outcome.node_id()),
                        None => log::warn!("Ignoring malformed add action (title {title:?})"),
                    }
                }
                CanvasAction::Remove { node_id } => {
                    if self.state.node(&node_id).is_none() {
                        log::warn!("Ignoring removal of unknown node {node_id}");
                        continue;
                    }
                    self.state.remove_nodes(&HashSet::from([node_id]));
                }
                CanvasAction::RevealArchetype { archetype } => reveal = Some(archetype),
            }
        }
        reveal
    }

    /// A send whose future was dropped leaves `is_sending` set and its
    /// provisional message behind; undo both.
    fn recover_abandoned_send(&mut self) {
        if !self.state.is_sending {
            return;
        }
        let dropped = transcript::rollback_provisional(&mut self.state.conversation_history);
        log::warn!("Recovered abandoned send ({dropped} provisional messages rolled back)");
        self.state.is_sending = false;
    }

    fn succeed(&mut self) {
        self.state.error = None;
    }

    fn fail(&mut self, error: DiscoveryError) -> DiscoveryError {
        log::warn!("Discovery operation failed: {error}");
        self.state.error = Some(error.to_string());
        error
    }
}

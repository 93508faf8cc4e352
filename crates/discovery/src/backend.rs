//! Conversational collaborator consumed by the discovery engine.

use crate::error::BackendError;
use async_trait::async_trait;
use persona_protocol::{
    GoBackResponse, PersonaStateSnapshot, RedoTrackResponse, SelectTrackResponse,
    SendMessageResponse, TrackId,
};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Service that owns persistence and produces assistant turns.
///
/// Implementations may talk to a remote API or replay canned responses;
/// the engine never assumes more than the contract below.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Persisted state, fetched once at session start
    async fn fetch_persona_state(&self) -> BackendResult<PersonaStateSnapshot>;

    async fn select_track(&self, track: TrackId) -> BackendResult<SelectTrackResponse>;

    /// Submit a user answer for the active track
    async fn send_message(&self, content: &str) -> BackendResult<SendMessageResponse>;

    async fn go_back_to_track_selection(&self) -> BackendResult<GoBackResponse>;

    async fn redo_track(&self, track: TrackId) -> BackendResult<RedoTrackResponse>;
}

#[async_trait]
impl<T: DiscoveryBackend + ?Sized> DiscoveryBackend for std::sync::Arc<T> {
    async fn fetch_persona_state(&self) -> BackendResult<PersonaStateSnapshot> {
        (**self).fetch_persona_state().await
    }

    async fn select_track(&self, track: TrackId) -> BackendResult<SelectTrackResponse> {
        (**self).select_track(track).await
    }

    async fn send_message(&self, content: &str) -> BackendResult<SendMessageResponse> {
        (**self).send_message(content).await
    }

    async fn go_back_to_track_selection(&self) -> BackendResult<GoBackResponse> {
        (**self).go_back_to_track_selection().await
    }

    async fn redo_track(&self, track: TrackId) -> BackendResult<RedoTrackResponse> {
        (**self).redo_track(track).await
    }
}

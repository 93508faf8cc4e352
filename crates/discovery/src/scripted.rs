//! Backend that answers from queues of canned responses.
//!
//! Used by the engine tests and by `persona replay` to drive a session
//! without a live service.

use crate::backend::{BackendResult, DiscoveryBackend};
use crate::error::BackendError;
use async_trait::async_trait;
use persona_protocol::{
    GoBackResponse, PersonaStateSnapshot, RedoTrackResponse, SelectTrackResponse,
    SendMessageResponse, TrackId,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One backend invocation, recorded in call order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BackendCall {
    FetchPersonaState,
    SelectTrack { track: TrackId },
    SendMessage { content: String },
    GoBack,
    RedoTrack { track: TrackId },
}

#[derive(Default)]
struct Queues {
    snapshot: Option<BackendResult<PersonaStateSnapshot>>,
    select: VecDeque<BackendResult<SelectTrackResponse>>,
    send: VecDeque<BackendResult<SendMessageResponse>>,
    go_back: VecDeque<BackendResult<GoBackResponse>>,
    redo: VecDeque<BackendResult<RedoTrackResponse>>,
    calls: Vec<BackendCall>,
}

#[derive(Default)]
pub struct ScriptedBackend {
    queues: Mutex<Queues>,
    send_delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot returned by every `fetch_persona_state`
    pub fn with_snapshot(self, snapshot: PersonaStateSnapshot) -> Self {
        self.lock().snapshot = Some(Ok(snapshot));
        self
    }

    /// Delay every `send_message` answer, to exercise in-flight behaviour
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn fail_fetch(&self, error: BackendError) {
        self.lock().snapshot = Some(Err(error));
    }

    pub fn push_select(&self, response: BackendResult<SelectTrackResponse>) {
        self.lock().select.push_back(response);
    }

    pub fn push_send(&self, response: BackendResult<SendMessageResponse>) {
        self.lock().send.push_back(response);
    }

    pub fn push_go_back(&self, response: BackendResult<GoBackResponse>) {
        self.lock().go_back.push_back(response);
    }

    pub fn push_redo(&self, response: BackendResult<RedoTrackResponse>) {
        self.lock().redo.push_back(response);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Responses queued but not yet consumed
    pub fn pending(&self) -> usize {
        let q = self.lock();
        q.select.len() + q.send.len() + q.go_back.len() + q.redo.len()
    }

    fn lock(&self) -> MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn next<T>(queue: &mut VecDeque<BackendResult<T>>, op: &'static str) -> BackendResult<T> {
    queue.pop_front().unwrap_or(Err(BackendError::Exhausted(op)))
}

#[async_trait]
impl DiscoveryBackend for ScriptedBackend {
    async fn fetch_persona_state(&self) -> BackendResult<PersonaStateSnapshot> {
        let mut q = self.lock();
        q.calls.push(BackendCall::FetchPersonaState);
        q.snapshot
            .clone()
            .unwrap_or_else(|| Ok(PersonaStateSnapshot::default()))
    }

    async fn select_track(&self, track: TrackId) -> BackendResult<SelectTrackResponse> {
        let mut q = self.lock();
        q.calls.push(BackendCall::SelectTrack { track });
        next(&mut q.select, "select_track")
    }

    async fn send_message(&self, content: &str) -> BackendResult<SendMessageResponse> {
        self.lock().calls.push(BackendCall::SendMessage {
            content: content.to_string(),
        });
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        next(&mut self.lock().send, "send_message")
    }

    async fn go_back_to_track_selection(&self) -> BackendResult<GoBackResponse> {
        let mut q = self.lock();
        q.calls.push(BackendCall::GoBack);
        next(&mut q.go_back, "go_back_to_track_selection")
    }

    async fn redo_track(&self, track: TrackId) -> BackendResult<RedoTrackResponse> {
        let mut q = self.lock();
        q.calls.push(BackendCall::RedoTrack { track });
        next(&mut q.redo, "redo_track")
    }
}

/// A recorded session: the starting snapshot and each operation with the
/// backend's answer to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub snapshot: PersonaStateSnapshot,

    #[serde(default)]
    pub steps: Vec<ReplayStep>,
}

/// One operation in a replay. A step with `error` set makes the backend
/// fail that call with a network error instead of answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReplayStep {
    SelectTrack {
        track: TrackId,
        #[serde(default)]
        response: Option<SelectTrackResponse>,
        #[serde(default)]
        error: Option<String>,
    },
    SendMessage {
        content: String,
        #[serde(default)]
        response: Option<SendMessageResponse>,
        #[serde(default)]
        error: Option<String>,
    },
    GoBack {
        #[serde(default)]
        response: Option<GoBackResponse>,
        #[serde(default)]
        error: Option<String>,
    },
    RedoTrack {
        track: TrackId,
        #[serde(default)]
        response: Option<RedoTrackResponse>,
        #[serde(default)]
        error: Option<String>,
    },
    Reset,
    DismissError,
}

impl ReplayStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectTrack { .. } => "select_track",
            Self::SendMessage { .. } => "send_message",
            Self::GoBack { .. } => "go_back",
            Self::RedoTrack { .. } => "redo_track",
            Self::Reset => "reset",
            Self::DismissError => "dismiss_error",
        }
    }
}

fn scripted<T>(response: Option<T>, error: Option<String>) -> Option<BackendResult<T>> {
    match (error, response) {
        (Some(error), _) => Some(Err(BackendError::Network(error))),
        (None, Some(response)) => Some(Ok(response)),
        (None, None) => None,
    }
}

impl ScriptedBackend {
    /// Queue the backend side of `step`. Steps without a response or error
    /// leave the queue alone, so the call fails as exhausted.
    pub fn queue_step(&self, step: &ReplayStep) {
        match step.clone() {
            ReplayStep::SelectTrack {
                response, error, ..
            } => {
                if let Some(r) = scripted(response, error) {
                    self.push_select(r);
                }
            }
            ReplayStep::SendMessage {
                response, error, ..
            } => {
                if let Some(r) = scripted(response, error) {
                    self.push_send(r);
                }
            }
            ReplayStep::GoBack { response, error } => {
                if let Some(r) = scripted(response, error) {
                    self.push_go_back(r);
                }
            }
            ReplayStep::RedoTrack {
                response, error, ..
            } => {
                if let Some(r) = scripted(response, error) {
                    self.push_redo(r);
                }
            }
            ReplayStep::Reset | ReplayStep::DismissError => {}
        }
    }
}

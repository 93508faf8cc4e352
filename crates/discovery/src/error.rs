use persona_protocol::{TrackId, TrackStatus};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Failure reported by the conversational backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("No scripted response left for {0}")]
    Exhausted(&'static str),
}

/// Operation refused before anything was sent or mutated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidOperation {
    #[error("No active track; select a track before sending a message")]
    NoActiveTrack,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    #[error("Track {track} is {status:?}; only completed tracks can be redone")]
    RedoNotCompleted { track: TrackId, status: TrackStatus },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("{0}")]
    InvalidOperation(#[from] InvalidOperation),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

//! # Persona Discovery
//!
//! The discovery state machine: tracks of questions, the chat transcript and
//! the persona graph they grow, driven through a conversational backend.
//!
//! ```text
//! not_started ──select──> in_progress ──(backend)──> completed
//!                              ^                         │
//!                              └────────── redo ─────────┘
//! ```
//!
//! Edges, coverage and layouts are derived on demand from the current nodes
//! and are never stored.

mod backend;
mod engine;
mod error;
mod replay;
pub mod scripted;
mod state;
mod tracks;
pub mod transcript;

pub use backend::{BackendResult, DiscoveryBackend};
pub use engine::DiscoveryEngine;
pub use error::{BackendError, DiscoveryError, InvalidOperation, Result};
pub use replay::StepOutcome;
pub use scripted::{BackendCall, ReplayScript, ReplayStep, ScriptedBackend};
pub use state::{DiscoveryEngineState, TrackProgress};
pub use tracks::{default_questions, default_tracks};

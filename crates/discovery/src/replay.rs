use crate::engine::DiscoveryEngine;
use crate::scripted::{ReplayScript, ReplayStep, ScriptedBackend};
use serde::Serialize;

/// Result of one replayed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DiscoveryEngine<ScriptedBackend> {
    /// Build an engine over the script's snapshot and initialize it
    pub async fn from_script(script: &ReplayScript) -> crate::Result<Self> {
        let backend = ScriptedBackend::new().with_snapshot(script.snapshot.clone());
        let mut engine = Self::new(backend);
        engine.initialize().await?;
        Ok(engine)
    }

    /// Run each step against the engine. Failures are recorded per step
    /// and do not stop the replay.
    pub async fn replay(&mut self, steps: &[ReplayStep]) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for (index, step) in steps.iter().enumerate() {
            self.backend().queue_step(step);
            let result = match step {
                ReplayStep::SelectTrack { track, .. } => self.select_track(*track).await,
                ReplayStep::SendMessage { content, .. } => self.send_message(content).await,
                ReplayStep::GoBack { .. } => self.go_back_to_track_selection().await,
                ReplayStep::RedoTrack { track, .. } => self.redo_track(*track).await,
                ReplayStep::Reset => {
                    self.reset();
                    Ok(())
                }
                ReplayStep::DismissError => {
                    self.dismiss_error();
                    Ok(())
                }
            };
            log::debug!("Replay step {index} ({}) -> {:?}", step.name(), result);
            outcomes.push(StepOutcome {
                index,
                op: step.name(),
                error: result.err().map(|e| e.to_string()),
            });
        }
        outcomes
    }
}

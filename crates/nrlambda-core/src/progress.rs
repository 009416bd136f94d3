//! Progress events emitted while a workflow runs
//!
//! Workflows never print. They emit [`WorkflowEvent`]s through an optional
//! callback so the CLI can render progress lines while tests and other
//! consumers can ignore them.

use crate::report::{Step, StepOutcome};

/// Progress events emitted during a workflow
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// A preparatory phase that is not a recorded step (validation, lookups)
    Phase { message: String },
    /// A recorded step is about to run
    StepStarted { step: Step },
    /// A recorded step finished (or was skipped)
    StepFinished { step: Step, outcome: StepOutcome },
    /// Informational message worth surfacing to the user
    Notice { message: String },
}

/// Callback type for progress updates
///
/// CLI uses this to print progress lines. Tests typically pass `None`.
pub type ProgressCallback = Box<dyn Fn(WorkflowEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: WorkflowEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}

pub(crate) fn phase(callback: &Option<ProgressCallback>, message: impl Into<String>) {
    emit(
        callback,
        WorkflowEvent::Phase {
            message: message.into(),
        },
    );
}

pub(crate) fn notice(callback: &Option<ProgressCallback>, message: impl Into<String>) {
    emit(
        callback,
        WorkflowEvent::Notice {
            message: message.into(),
        },
    );
}

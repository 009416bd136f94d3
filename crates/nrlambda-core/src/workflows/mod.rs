//! Integration lifecycle workflows
//!
//! [`install`], [`update`] and [`uninstall`] compose the resource operations
//! ([`CloudResources`](crate::resources::CloudResources)) and the New Relic
//! operations ([`PlatformApi`](crate::platform::PlatformApi)) into ordered,
//! best-effort sequences. Every remote call is awaited before the next one
//! starts. A step that reports failure is recorded and the remaining
//! independent steps still run; only errors (`Err`) stop a workflow early.
//!
//! # Example
//!
//! ```rust,ignore
//! use nrlambda_core::workflows::{InstallConfig, install};
//!
//! let config = InstallConfig::new(1234567).with_enable_logs(true);
//! let report = install(&resources, &nerdgraph, &config, None).await?;
//! if !report.success() {
//!     eprintln!("{}", report.summary());
//! }
//! ```

mod install;
mod params;
mod uninstall;
mod update;

pub use install::{default_linked_account_name, install};
pub use params::{
    DEFAULT_MEMORY_SIZE, DEFAULT_TIMEOUT, InstallConfig, UninstallConfig, UpdateConfig,
};
pub use uninstall::{LOG_INGESTION_PROMPT, ROLE_PROMPT, SECRET_PROMPT, uninstall};
pub use update::update;

use crate::progress::{ProgressCallback, WorkflowEvent, emit};
use crate::report::{Step, StepOutcome, WorkflowReport};

fn start(progress: &Option<ProgressCallback>, step: Step) {
    emit(progress, WorkflowEvent::StepStarted { step });
}

fn finish(
    report: &mut WorkflowReport,
    progress: &Option<ProgressCallback>,
    step: Step,
    outcome: StepOutcome,
) {
    emit(
        progress,
        WorkflowEvent::StepFinished {
            step,
            outcome: outcome.clone(),
        },
    );
    report.record(step, outcome);
}

fn skip(
    report: &mut WorkflowReport,
    progress: &Option<ProgressCallback>,
    step: Step,
    reason: &str,
) {
    finish(report, progress, step, StepOutcome::Skipped(reason.to_string()));
}

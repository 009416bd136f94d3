//! Per-step results folded into a workflow outcome
//!
//! Each workflow appends one [`StepRecord`] per step it reaches, in order.
//! Overall success is the conjunction of the steps that were attempted;
//! steps skipped by configuration never count against it.

use serde::Serialize;
use std::fmt;

/// Which lifecycle workflow produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowKind {
    Install,
    Update,
    Uninstall,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Install => write!(f, "Install"),
            WorkflowKind::Update => write!(f, "Update"),
            WorkflowKind::Uninstall => write!(f, "Uninstall"),
        }
    }
}

/// Individual workflow steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    CreateRole,
    InstallLicenseKeySecret,
    LinkAccount,
    EnableLambdaIntegration,
    InstallLogIngestion,
    UpdateLogIngestion,
    RemoveRole,
    RemoveLogIngestion,
    RemoveLicenseKeySecret,
}

impl Step {
    /// Human-readable description used for progress lines
    pub fn description(&self) -> &'static str {
        match self {
            Step::CreateRole => "Creating the AWS role for the New Relic AWS Lambda Integration",
            Step::InstallLicenseKeySecret => {
                "Creating the managed secret for the New Relic License Key"
            }
            Step::LinkAccount => "Linking New Relic account to AWS account",
            Step::EnableLambdaIntegration => {
                "Enabling Lambda integration on the link between New Relic and AWS"
            }
            Step::InstallLogIngestion => {
                "Creating newrelic-log-ingestion Lambda function in AWS account"
            }
            Step::UpdateLogIngestion => {
                "Updating newrelic-log-ingestion Lambda function in AWS account"
            }
            Step::RemoveRole => "Removing the New Relic AWS Lambda integration role",
            Step::RemoveLogIngestion => "Removing the newrelic-log-ingestion Lambda function",
            Step::RemoveLicenseKeySecret => {
                "Removing the New Relic License Key managed secret and IAM policy"
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::CreateRole => "create-role",
            Step::InstallLicenseKeySecret => "install-license-key-secret",
            Step::LinkAccount => "link-account",
            Step::EnableLambdaIntegration => "enable-lambda-integration",
            Step::InstallLogIngestion => "install-log-ingestion",
            Step::UpdateLogIngestion => "update-log-ingestion",
            Step::RemoveRole => "remove-role",
            Step::RemoveLogIngestion => "remove-log-ingestion",
            Step::RemoveLicenseKeySecret => "remove-license-key-secret",
        };
        write!(f, "{}", name)
    }
}

/// What happened to a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum StepOutcome {
    /// The remote call reported success
    Succeeded,
    /// The remote call reported failure
    Failed(String),
    /// Not attempted; never counts against overall success
    Skipped(String),
}

impl StepOutcome {
    /// Map a boolean remote result onto an outcome
    pub fn from_success(ok: bool) -> Self {
        if ok {
            StepOutcome::Succeeded
        } else {
            StepOutcome::Failed("remote operation reported failure".to_string())
        }
    }

    pub fn is_attempted(&self) -> bool {
        !matches!(self, StepOutcome::Skipped(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

/// A step paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: Step,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Result of one workflow run
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub workflow: WorkflowKind,
    pub steps: Vec<StepRecord>,
    /// Prompt the user declined, if the workflow was aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
    /// Follow-up command suggested after a complete install
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
}

impl WorkflowReport {
    pub fn new(workflow: WorkflowKind) -> Self {
        Self {
            workflow,
            steps: Vec::new(),
            aborted: None,
            next_steps: None,
        }
    }

    /// Append a step outcome
    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    /// Mark the workflow as aborted by a declined confirmation
    pub fn abort(&mut self, prompt: impl Into<String>) {
        self.aborted = Some(prompt.into());
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// True iff not aborted and every attempted step succeeded
    pub fn success(&self) -> bool {
        !self.is_aborted()
            && self
                .steps
                .iter()
                .filter(|r| r.outcome.is_attempted())
                .all(|r| r.outcome.is_success())
    }

    /// Outcome recorded for `step`, if the workflow reached it
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| r.step == step)
            .map(|r| &r.outcome)
    }

    /// Steps that were attempted and failed
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Failed(_)))
    }

    /// One-line summary, e.g. "Install Complete"
    pub fn summary(&self) -> String {
        if self.is_aborted() {
            format!("{} Aborted", self.workflow)
        } else if self.success() {
            format!("{} Complete", self.workflow)
        } else {
            format!(
                "{} Incomplete. See messages above for details.",
                self.workflow
            )
        }
    }
}

//! Error types for nrlambda
//!
//! Defines structured error types using thiserror for better error handling and user experience.

use colored::Colorize;
use nrlambda_core::CoreError;
use nrlambda_core::config::ConfigError;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Missing AWS permissions: iam:CreateRole
///   1 action(s) denied
///
///   tip: Run with an AWS profile allowed to perform the listed actions
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the nrlambda application
#[derive(Error, Debug)]
pub enum NrLambdaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No New Relic account id given")]
    MissingAccountId,

    #[error("No New Relic API key given")]
    MissingApiKey,

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Missing AWS permissions: {}", missing.join(", "))]
    PermissionDenied { missing: Vec<String> },

    #[error("{0}")]
    LinkedAccountMismatch(String),

    #[error("AWS error: {message}")]
    AwsError { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Workflow ran to the end but at least one step failed or a prompt was declined
    #[error("{summary}")]
    WorkflowIncomplete { summary: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for nrlambda operations
pub type Result<T> = std::result::Result<T, NrLambdaError>;

impl NrLambdaError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            NrLambdaError::ProfileNotFound { name } => vec![
                "List available profiles: nrlambda profile list".to_string(),
                format!(
                    "Create profile '{}': nrlambda profile set {} --nr-account-id <id>",
                    name, name
                ),
            ],
            NrLambdaError::MissingAccountId => vec![
                "Pass --nr-account-id or set NEW_RELIC_ACCOUNT_ID".to_string(),
                "Store it in a profile: nrlambda profile set <name> --nr-account-id <id>"
                    .to_string(),
            ],
            NrLambdaError::MissingApiKey => vec![
                "Pass --nr-api-key or set NEW_RELIC_API_KEY".to_string(),
                "Store it in a profile: nrlambda profile set <name> --nr-account-id <id> --nr-api-key <key>".to_string(),
            ],
            NrLambdaError::AuthenticationFailed { .. } => vec![
                "Check the New Relic user API key: nrlambda profile show <profile>".to_string(),
                "Check --nr-region matches the account's data center (us, eu)".to_string(),
            ],
            NrLambdaError::PermissionDenied { .. } => vec![
                "Run with an AWS profile allowed to perform the listed actions".to_string(),
                "Select one with --aws-profile or AWS_PROFILE".to_string(),
            ],
            NrLambdaError::LinkedAccountMismatch(_) => vec![
                "Pick another name with --linked-account-name".to_string(),
                "Or run with the AWS credentials of the account already linked".to_string(),
            ],
            NrLambdaError::AwsError { message } if message.contains("No such file") => vec![
                "Install the AWS CLI and make sure `aws` is on PATH".to_string(),
            ],
            NrLambdaError::AwsError { .. } => vec![
                "Verify AWS credentials: aws sts get-caller-identity".to_string(),
                "Select a profile with --aws-profile and a region with --aws-region".to_string(),
            ],
            NrLambdaError::ConnectionError { .. } => vec![
                "Check network connectivity to api.newrelic.com".to_string(),
            ],
            NrLambdaError::InvalidInput { .. } => vec![
                "Check the command syntax: nrlambda <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let NrLambdaError::PermissionDenied { missing } = self {
            diag = diag.detail(&format!("{} action(s) denied", missing.len()));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for NrLambdaError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthenticationFailed { message } => {
                NrLambdaError::AuthenticationFailed { message }
            }
            CoreError::PermissionDenied { missing } => NrLambdaError::PermissionDenied { missing },
            err @ CoreError::LinkedAccountMismatch { .. } => {
                NrLambdaError::LinkedAccountMismatch(err.to_string())
            }
            CoreError::GraphQl(message) => NrLambdaError::ApiError { message },
            CoreError::Http(err) => NrLambdaError::ConnectionError {
                message: err.to_string(),
            },
            err @ (CoreError::AwsCli { .. } | CoreError::Io(_)) => NrLambdaError::AwsError {
                message: err.to_string(),
            },
            CoreError::Json(err) => NrLambdaError::ApiError {
                message: format!("Unexpected response: {}", err),
            },
            CoreError::Validation(message) => NrLambdaError::InvalidInput { message },
            CoreError::Config(message) => NrLambdaError::Configuration(message),
        }
    }
}

impl From<ConfigError> for NrLambdaError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => NrLambdaError::ProfileNotFound { name },
            other => NrLambdaError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for NrLambdaError {
    fn from(err: serde_json::Error) -> Self {
        NrLambdaError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for NrLambdaError {
    fn from(err: std::io::Error) -> Self {
        NrLambdaError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for NrLambdaError {
    fn from(err: anyhow::Error) -> Self {
        NrLambdaError::Configuration(err.to_string())
    }
}

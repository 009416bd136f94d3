//! `aws` command line adapter

use super::{AwsApi, CloudSession, is_not_found};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, trace};

/// Executable name, overridable for tests and unusual installs
const AWS_BIN_ENV: &str = "NRLAMBDA_AWS_BIN";

/// [`AwsApi`] implementation backed by the `aws` executable
#[derive(Debug, Clone)]
pub struct AwsCli {
    session: CloudSession,
    binary: String,
}

impl AwsCli {
    pub fn new(session: CloudSession) -> Self {
        let binary = std::env::var(AWS_BIN_ENV).unwrap_or_else(|_| "aws".to_string());
        Self { session, binary }
    }

    /// Create the adapter and prove the session can authenticate.
    ///
    /// Returns the caller identity (`Account`, `Arn`, `UserId`).
    pub async fn connect(session: CloudSession) -> Result<(Self, Value)> {
        let cli = Self::new(session);
        let identity = cli.call("sts", "get-caller-identity", &[]).await?;
        debug!(
            "AWS session established for account {}",
            identity["Account"].as_str().unwrap_or("<unknown>")
        );
        Ok((cli, identity))
    }

    pub fn session(&self) -> &CloudSession {
        &self.session
    }

    fn command_args(&self, service: &str, operation: &str, args: &[String]) -> Vec<String> {
        let mut full = vec![service.to_string(), operation.to_string()];
        full.extend(args.iter().cloned());
        full.push("--output".to_string());
        full.push("json".to_string());
        if let Some(profile) = &self.session.profile {
            full.push("--profile".to_string());
            full.push(profile.clone());
        }
        if let Some(region) = &self.session.region {
            full.push("--region".to_string());
            full.push(region.clone());
        }
        full
    }

    async fn run(&self, service: &str, operation: &str, args: &[String]) -> Result<RunOutput> {
        let full = self.command_args(service, operation, args);
        trace!("aws {} {}", service, operation);

        let output = Command::new(&self.binary)
            .args(&full)
            .stdin(std::process::Stdio::null())
            .output()
            .await?;

        Ok(RunOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

struct RunOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

fn parse_stdout(stdout: &str) -> Result<Value> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(trimmed)?)
    }
}

#[async_trait]
impl AwsApi for AwsCli {
    async fn call(&self, service: &str, operation: &str, args: &[String]) -> Result<Value> {
        let out = self.run(service, operation, args).await?;
        if !out.success {
            return Err(CoreError::AwsCli {
                command: format!("{} {}", service, operation),
                message: out.stderr,
            });
        }
        parse_stdout(&out.stdout)
    }

    async fn try_call(
        &self,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<Option<Value>> {
        let out = self.run(service, operation, args).await?;
        if out.success {
            return parse_stdout(&out.stdout).map(Some);
        }
        if is_not_found(&out.stderr) {
            debug!("aws {} {}: target does not exist", service, operation);
            return Ok(None);
        }
        Err(CoreError::AwsCli {
            command: format!("{} {}", service, operation),
            message: out.stderr,
        })
    }
}

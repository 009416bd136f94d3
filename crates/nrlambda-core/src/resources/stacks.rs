//! CloudFormation-backed implementation of [`CloudResources`]
//!
//! Every AWS resource the integration owns lives in its own stack, so
//! creation is "create stack and wait" and removal is "delete stack and wait".
//! The log ingestion function is deployed from the Serverless Application
//! Repository through a change set.

use super::templates::{
    INTEGRATION_ROLE_TEMPLATE, LICENSE_KEY_SECRET_TEMPLATE, LOG_INGESTION_APPLICATION_ID,
};
use super::{CloudResources, LogIngestionParams, LogIngestionUpdate, RoleRef, RoleRequest, Tag};
use crate::aws::{AwsApi, is_transport_failure};
use crate::error::{CoreError, Result};
use crate::permissions::policy_source_arn;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Stack holding the log ingestion function
pub const LOG_INGESTION_STACK: &str = "NewRelicLogIngestion";

/// Function name the ingestion application deploys
pub const LOG_INGESTION_FUNCTION: &str = "newrelic-log-ingestion";

/// Stack holding the license key secret and its access policy
pub const LICENSE_KEY_SECRET_STACK: &str = "NewRelicLicenseKeySecret";

/// Stack holding the integration role for a New Relic account
pub fn role_stack_name(nr_account_id: u64) -> String {
    format!("NewRelicLambdaIntegrationRole-{}", nr_account_id)
}

fn role_name(nr_account_id: u64) -> String {
    format!("NewRelicLambdaIntegrationRole_{}", nr_account_id)
}

fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn cfn_parameter(key: &str, value: impl Into<String>) -> Value {
    json!({ "ParameterKey": key, "ParameterValue": value.into() })
}

fn cfn_previous(key: &str) -> Value {
    json!({ "ParameterKey": key, "UsePreviousValue": true })
}

fn sar_parameter(name: &str, value: impl Into<String>) -> Value {
    json!({ "Name": name, "Value": value.into() })
}

fn tags_json(tags: &[Tag]) -> String {
    let list: Vec<Value> = tags
        .iter()
        .map(|t| json!({ "Key": t.key, "Value": t.value }))
        .collect();
    Value::Array(list).to_string()
}

fn logging_flag(enabled: bool) -> &'static str {
    if enabled { "True" } else { "False" }
}

/// A call AWS answered: either the response or the refusal message
type Attempt = std::result::Result<Value, String>;

/// [`CloudResources`] over CloudFormation stacks
pub struct StackResources<A: AwsApi> {
    aws: A,
}

impl<A: AwsApi> StackResources<A> {
    pub fn new(aws: A) -> Self {
        Self { aws }
    }

    pub fn aws(&self) -> &A {
        &self.aws
    }

    /// Run a mutating call; refusals become `Ok(Err(message))`
    async fn attempt(&self, service: &str, operation: &str, args: &[String]) -> Result<Attempt> {
        match self.aws.call(service, operation, args).await {
            Ok(value) => Ok(Ok(value)),
            Err(CoreError::AwsCli { command, message }) if !is_transport_failure(&message) => {
                warn!("aws {} was refused: {}", command, message);
                Ok(Err(message))
            }
            Err(e) => Err(e),
        }
    }

    async fn wait(&self, waiter: &str, flag: &str, target: &str) -> Result<bool> {
        let outcome = self
            .attempt("cloudformation", "wait", &args([waiter, flag, target]))
            .await?;
        Ok(outcome.is_ok())
    }

    async fn describe_stack(&self, stack: &str) -> Result<Option<Value>> {
        let resp = self
            .aws
            .try_call(
                "cloudformation",
                "describe-stacks",
                &args(["--stack-name", stack]),
            )
            .await?;
        Ok(resp.and_then(|v| v["Stacks"].get(0).cloned()))
    }

    async fn stack_status(&self, stack: &str) -> Result<Option<String>> {
        Ok(self
            .describe_stack(stack)
            .await?
            .and_then(|s| s["StackStatus"].as_str().map(String::from)))
    }

    async fn stack_output(&self, stack: &str, key: &str) -> Result<Option<String>> {
        let Some(description) = self.describe_stack(stack).await? else {
            return Ok(None);
        };
        Ok(description["Outputs"].as_array().and_then(|outputs| {
            outputs
                .iter()
                .find(|o| o["OutputKey"] == key)
                .and_then(|o| o["OutputValue"].as_str().map(String::from))
        }))
    }

    async fn role_arn(&self, name: &str) -> Result<Option<String>> {
        let resp = self
            .aws
            .try_call("iam", "get-role", &args(["--role-name", name]))
            .await?;
        Ok(resp.and_then(|v| v["Role"]["Arn"].as_str().map(String::from)))
    }

    async fn create_stack(
        &self,
        stack: &str,
        template: &str,
        parameters: Value,
        capabilities: &[&str],
        tags: &[Tag],
    ) -> Result<bool> {
        let mut call_args = args([
            "--stack-name",
            stack,
            "--template-body",
            template,
            "--parameters",
            &parameters.to_string(),
        ]);
        if !capabilities.is_empty() {
            call_args.push("--capabilities".to_string());
            call_args.extend(capabilities.iter().map(|c| c.to_string()));
        }
        if !tags.is_empty() {
            call_args.push("--tags".to_string());
            call_args.push(tags_json(tags));
        }

        if self
            .attempt("cloudformation", "create-stack", &call_args)
            .await?
            .is_err()
        {
            return Ok(false);
        }
        if !self.wait("stack-create-complete", "--stack-name", stack).await? {
            warn!("Stack {} did not reach CREATE_COMPLETE", stack);
            return Ok(false);
        }
        Ok(true)
    }

    async fn delete_stack(&self, stack: &str) -> Result<bool> {
        if self.stack_status(stack).await?.is_none() {
            info!("Stack {} not found, nothing to remove", stack);
            return Ok(true);
        }

        debug!("Deleting stack {}", stack);
        if self
            .attempt(
                "cloudformation",
                "delete-stack",
                &args(["--stack-name", stack]),
            )
            .await?
            .is_err()
        {
            return Ok(false);
        }
        let deleted = self.wait("stack-delete-complete", "--stack-name", stack).await?;
        if !deleted {
            warn!("Stack {} did not reach DELETE_COMPLETE", stack);
        }
        Ok(deleted)
    }

    /// Create a change set, wait for it, execute it and wait for the stack.
    ///
    /// A change set with nothing to change counts as success.
    async fn run_change_set(&self, change_set_id: &str, stack_waiter: &str) -> Result<bool> {
        if !self
            .wait("change-set-create-complete", "--change-set-name", change_set_id)
            .await?
        {
            let described = self
                .aws
                .try_call(
                    "cloudformation",
                    "describe-change-set",
                    &args(["--change-set-name", change_set_id]),
                )
                .await?;
            let reason = described
                .as_ref()
                .and_then(|d| d["StatusReason"].as_str())
                .unwrap_or_default();
            if reason.contains("didn't contain changes") || reason.contains("No updates") {
                info!("{} is already up to date", LOG_INGESTION_STACK);
                return Ok(true);
            }
            warn!("Change set {} failed: {}", change_set_id, reason);
            return Ok(false);
        }

        if self
            .attempt(
                "cloudformation",
                "execute-change-set",
                &args(["--change-set-name", change_set_id]),
            )
            .await?
            .is_err()
        {
            return Ok(false);
        }
        self.wait(stack_waiter, "--stack-name", LOG_INGESTION_STACK).await
    }
}

#[async_trait]
impl<A: AwsApi> CloudResources for StackResources<A> {
    async fn account_id(&self) -> Result<String> {
        let identity = self.aws.call("sts", "get-caller-identity", &[]).await?;
        identity["Account"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| CoreError::Validation("caller identity has no Account".to_string()))
    }

    async fn create_role(&self, request: &RoleRequest) -> Result<Option<RoleRef>> {
        if let Some(arn) = &request.existing_arn {
            info!("Using pre-existing integration role {}", arn);
            return Ok(Some(RoleRef { arn: arn.clone() }));
        }

        let name = role_name(request.nr_account_id);
        if let Some(arn) = self.role_arn(&name).await? {
            info!("Integration role {} already exists", name);
            return Ok(Some(RoleRef { arn }));
        }

        let stack = role_stack_name(request.nr_account_id);
        let parameters = json!([
            cfn_parameter("NewRelicAccountNumber", request.nr_account_id.to_string()),
            cfn_parameter(
                "PolicyName",
                request.policy_override.clone().unwrap_or_default()
            ),
        ]);
        if !self
            .create_stack(
                &stack,
                INTEGRATION_ROLE_TEMPLATE,
                parameters,
                &["CAPABILITY_NAMED_IAM"],
                &request.tags,
            )
            .await?
        {
            return Ok(None);
        }

        let arn = self.stack_output(&stack, "IntegrationRoleArn").await?;
        if arn.is_none() {
            warn!("Stack {} has no IntegrationRoleArn output", stack);
        }
        Ok(arn.map(|arn| RoleRef { arn }))
    }

    async fn remove_role(&self, nr_account_id: u64) -> Result<bool> {
        self.delete_stack(&role_stack_name(nr_account_id)).await
    }

    async fn install_license_key_secret(&self, license_key: &str, tags: &[Tag]) -> Result<bool> {
        let parameters = json!([cfn_parameter("LicenseKey", license_key)]);

        match self.stack_status(LICENSE_KEY_SECRET_STACK).await? {
            None => {
                self.create_stack(
                    LICENSE_KEY_SECRET_STACK,
                    LICENSE_KEY_SECRET_TEMPLATE,
                    parameters,
                    &["CAPABILITY_NAMED_IAM"],
                    tags,
                )
                .await
            }
            Some(status) if status.ends_with("_IN_PROGRESS") => {
                warn!(
                    "Stack {} is busy ({}), try again later",
                    LICENSE_KEY_SECRET_STACK, status
                );
                Ok(false)
            }
            Some(_) => {
                let mut call_args = args([
                    "--stack-name",
                    LICENSE_KEY_SECRET_STACK,
                    "--template-body",
                    LICENSE_KEY_SECRET_TEMPLATE,
                    "--parameters",
                    &parameters.to_string(),
                    "--capabilities",
                    "CAPABILITY_NAMED_IAM",
                ]);
                if !tags.is_empty() {
                    call_args.push("--tags".to_string());
                    call_args.push(tags_json(tags));
                }
                match self
                    .attempt("cloudformation", "update-stack", &call_args)
                    .await?
                {
                    Ok(_) => {
                        self.wait("stack-update-complete", "--stack-name", LICENSE_KEY_SECRET_STACK)
                            .await
                    }
                    Err(message) if message.contains("No updates are to be performed") => {
                        info!("License key secret is already up to date");
                        Ok(true)
                    }
                    Err(_) => Ok(false),
                }
            }
        }
    }

    async fn auto_install_license_key_secret(&self, tags: &[Tag]) -> Result<bool> {
        if self.stack_status(LICENSE_KEY_SECRET_STACK).await?.is_some() {
            info!("License key secret already installed");
            return Ok(true);
        }

        let config = self
            .aws
            .try_call(
                "lambda",
                "get-function-configuration",
                &args(["--function-name", LOG_INGESTION_FUNCTION]),
            )
            .await?;
        let license_key = config.and_then(|c| {
            c["Environment"]["Variables"]["LICENSE_KEY"]
                .as_str()
                .map(String::from)
        });

        match license_key {
            Some(key) => self.install_license_key_secret(&key, tags).await,
            None => {
                warn!(
                    "Could not read the license key from {}; install the secret with \
                     'nrlambda integrations install'",
                    LOG_INGESTION_FUNCTION
                );
                Ok(false)
            }
        }
    }

    async fn remove_license_key_secret(&self) -> Result<bool> {
        self.delete_stack(LICENSE_KEY_SECRET_STACK).await
    }

    async fn install_log_ingestion(&self, params: &LogIngestionParams) -> Result<bool> {
        match self.stack_status(LOG_INGESTION_STACK).await? {
            None => {}
            Some(status) if status == "DELETE_COMPLETE" => {}
            Some(status) if status.ends_with("_COMPLETE") && status != "ROLLBACK_COMPLETE" => {
                info!(
                    "{} stack already exists ({}), skipping creation",
                    LOG_INGESTION_STACK, status
                );
                return Ok(true);
            }
            Some(status) => {
                warn!(
                    "Stack {} is in state {}; wait for it to settle or delete it, then retry",
                    LOG_INGESTION_STACK, status
                );
                return Ok(false);
            }
        }

        let mut overrides = vec![
            sar_parameter("NRLicenseKey", params.license_key.as_str()),
            sar_parameter("NRLoggingEnabled", logging_flag(params.enable_logs)),
            sar_parameter("MemorySize", params.memory_size.to_string()),
            sar_parameter("Timeout", params.timeout.to_string()),
        ];
        if let Some(role) = &params.role_name {
            overrides.push(sar_parameter("FunctionRole", role.as_str()));
        }

        let mut call_args = args([
            "--application-id",
            LOG_INGESTION_APPLICATION_ID,
            "--stack-name",
            LOG_INGESTION_STACK,
            "--capabilities",
            "CAPABILITY_IAM",
            "CAPABILITY_RESOURCE_POLICY",
            "--parameter-overrides",
            &Value::Array(overrides).to_string(),
        ]);
        if !params.tags.is_empty() {
            call_args.push("--tags".to_string());
            call_args.push(tags_json(&params.tags));
        }

        let response = match self
            .attempt(
                "serverlessrepo",
                "create-cloud-formation-change-set",
                &call_args,
            )
            .await?
        {
            Ok(v) => v,
            Err(_) => return Ok(false),
        };
        let Some(change_set_id) = response["ChangeSetId"].as_str() else {
            warn!("Serverless Application Repository returned no change set id");
            return Ok(false);
        };

        self.run_change_set(change_set_id, "stack-create-complete")
            .await
    }

    async fn update_log_ingestion(&self, update: &LogIngestionUpdate) -> Result<bool> {
        match self.stack_status(LOG_INGESTION_STACK).await? {
            None => {
                warn!(
                    "{} stack not found; run 'nrlambda integrations install' first",
                    LOG_INGESTION_STACK
                );
                return Ok(false);
            }
            Some(status) if status.ends_with("_IN_PROGRESS") => {
                warn!("Stack {} is busy ({})", LOG_INGESTION_STACK, status);
                return Ok(false);
            }
            Some(_) => {}
        }

        let parameters = vec![
            cfn_previous("NRLicenseKey"),
            match update.enable_logs {
                Some(enabled) => cfn_parameter("NRLoggingEnabled", logging_flag(enabled)),
                None => cfn_previous("NRLoggingEnabled"),
            },
            match update.memory_size {
                Some(size) => cfn_parameter("MemorySize", size.to_string()),
                None => cfn_previous("MemorySize"),
            },
            match update.timeout {
                Some(secs) => cfn_parameter("Timeout", secs.to_string()),
                None => cfn_previous("Timeout"),
            },
            match &update.role_name {
                Some(role) => cfn_parameter("FunctionRole", role.as_str()),
                None => cfn_previous("FunctionRole"),
            },
        ];

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let change_set_name = format!("{}-update-{}", LOG_INGESTION_STACK, stamp);

        let mut call_args = args([
            "--stack-name",
            LOG_INGESTION_STACK,
            "--change-set-name",
            &change_set_name,
            "--change-set-type",
            "UPDATE",
            "--use-previous-template",
            "--capabilities",
            "CAPABILITY_IAM",
            "CAPABILITY_AUTO_EXPAND",
            "--parameters",
            &Value::Array(parameters).to_string(),
        ]);
        if !update.tags.is_empty() {
            call_args.push("--tags".to_string());
            call_args.push(tags_json(&update.tags));
        }

        let response = match self
            .attempt("cloudformation", "create-change-set", &call_args)
            .await?
        {
            Ok(v) => v,
            Err(_) => return Ok(false),
        };
        let change_set_id = response["Id"]
            .as_str()
            .map(String::from)
            .unwrap_or(change_set_name);

        self.run_change_set(&change_set_id, "stack-update-complete")
            .await
    }

    async fn remove_log_ingestion(&self) -> Result<bool> {
        self.delete_stack(LOG_INGESTION_STACK).await
    }

    async fn missing_permissions(&self, actions: &[&str]) -> Result<Vec<String>> {
        let identity = self.aws.call("sts", "get-caller-identity", &[]).await?;
        let caller = identity["Arn"]
            .as_str()
            .ok_or_else(|| CoreError::Validation("caller identity has no Arn".to_string()))?;

        let mut call_args = args([
            "--policy-source-arn",
            &policy_source_arn(caller),
            "--action-names",
        ]);
        call_args.extend(actions.iter().map(|a| a.to_string()));

        let resp = self
            .aws
            .call("iam", "simulate-principal-policy", &call_args)
            .await?;
        let missing = resp["EvaluationResults"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .filter(|r| r["EvalDecision"] != "allowed")
                    .filter_map(|r| r["EvalActionName"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    enum Scripted {
        Ok(Value),
        Missing,
        Refused(&'static str),
        Transport,
    }

    /// Scripted AWS double; unscripted calls answer `null`
    #[derive(Default)]
    struct FakeAws {
        script: Mutex<HashMap<String, VecDeque<Scripted>>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeAws {
        fn on(self, key: &str, response: Scripted) -> Self {
            self.script
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_default()
                .push_back(response);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(k, _)| k.clone())
                .collect()
        }

        fn args_of(&self, key: &str) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, a)| a.clone())
                .unwrap_or_default()
        }

        fn next(&self, service: &str, operation: &str, args: &[String]) -> Scripted {
            let key = if operation == "wait" {
                format!("{} wait {}", service, args.first().cloned().unwrap_or_default())
            } else {
                format!("{} {}", service, operation)
            };
            self.calls.lock().unwrap().push((key.clone(), args.to_vec()));
            self.script
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(|q| q.pop_front())
                .unwrap_or(Scripted::Ok(Value::Null))
        }
    }

    #[async_trait]
    impl AwsApi for FakeAws {
        async fn call(&self, service: &str, operation: &str, args: &[String]) -> Result<Value> {
            let command = format!("{} {}", service, operation);
            match self.next(service, operation, args) {
                Scripted::Ok(v) => Ok(v),
                Scripted::Missing => Err(CoreError::AwsCli {
                    command,
                    message: "Stack does not exist".to_string(),
                }),
                Scripted::Refused(message) => Err(CoreError::AwsCli {
                    command,
                    message: message.to_string(),
                }),
                Scripted::Transport => Err(CoreError::AwsCli {
                    command,
                    message: "Unable to locate credentials".to_string(),
                }),
            }
        }

        async fn try_call(
            &self,
            service: &str,
            operation: &str,
            args: &[String],
        ) -> Result<Option<Value>> {
            let command = format!("{} {}", service, operation);
            match self.next(service, operation, args) {
                Scripted::Ok(v) => Ok(Some(v)),
                Scripted::Missing => Ok(None),
                Scripted::Refused(message) => Err(CoreError::AwsCli {
                    command,
                    message: message.to_string(),
                }),
                Scripted::Transport => Err(CoreError::AwsCli {
                    command,
                    message: "Unable to locate credentials".to_string(),
                }),
            }
        }
    }

    fn stack(status: &str) -> Scripted {
        Scripted::Ok(json!({ "Stacks": [{ "StackStatus": status }] }))
    }

    #[tokio::test]
    async fn test_existing_arn_short_circuits() {
        let resources = StackResources::new(FakeAws::default());
        let role = resources
            .create_role(&RoleRequest {
                nr_account_id: 42,
                existing_arn: Some("arn:aws:iam::1:role/existing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(role.unwrap().arn, "arn:aws:iam::1:role/existing");
        assert!(resources.aws().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_role_deploys_stack() {
        let aws = FakeAws::default()
            .on("iam get-role", Scripted::Missing)
            .on(
                "cloudformation describe-stacks",
                Scripted::Ok(json!({
                    "Stacks": [{
                        "StackStatus": "CREATE_COMPLETE",
                        "Outputs": [{
                            "OutputKey": "IntegrationRoleArn",
                            "OutputValue": "arn:aws:iam::1:role/NewRelicLambdaIntegrationRole_42"
                        }]
                    }]
                })),
            );
        let resources = StackResources::new(aws);

        let role = resources
            .create_role(&RoleRequest {
                nr_account_id: 42,
                tags: vec![Tag::new("team", "platform")],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(
            role.unwrap().arn,
            "arn:aws:iam::1:role/NewRelicLambdaIntegrationRole_42"
        );
        assert_eq!(
            resources.aws().calls(),
            vec![
                "iam get-role",
                "cloudformation create-stack",
                "cloudformation wait stack-create-complete",
                "cloudformation describe-stacks",
            ]
        );
        let create_args = resources.aws().args_of("cloudformation create-stack");
        assert!(create_args.contains(&"NewRelicLambdaIntegrationRole-42".to_string()));
        assert!(create_args.iter().any(|a| a.contains("\"ParameterValue\":\"42\"")));
        assert!(create_args.iter().any(|a| a.contains("\"Key\":\"team\"")));
    }

    #[tokio::test]
    async fn test_refused_role_creation_is_none() {
        let aws = FakeAws::default()
            .on("iam get-role", Scripted::Missing)
            .on(
                "cloudformation create-stack",
                Scripted::Refused("An error occurred (AccessDenied) when calling the CreateStack operation"),
            );
        let resources = StackResources::new(aws);

        let role = resources
            .create_role(&RoleRequest {
                nr_account_id: 42,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(role.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let aws = FakeAws::default()
            .on("iam get-role", Scripted::Missing)
            .on("cloudformation create-stack", Scripted::Transport);
        let resources = StackResources::new(aws);

        let err = resources
            .create_role(&RoleRequest {
                nr_account_id: 42,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_install_log_ingestion_skips_existing_stack() {
        let aws = FakeAws::default().on(
            "cloudformation describe-stacks",
            stack("CREATE_COMPLETE"),
        );
        let resources = StackResources::new(aws);

        let ok = resources
            .install_log_ingestion(&LogIngestionParams {
                license_key: "key".to_string(),
                enable_logs: false,
                memory_size: 128,
                timeout: 30,
                role_name: None,
                tags: vec![],
            })
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(resources.aws().calls(), vec!["cloudformation describe-stacks"]);
    }

    fn ingestion_params() -> LogIngestionParams {
        LogIngestionParams {
            license_key: "key".to_string(),
            enable_logs: false,
            memory_size: 128,
            timeout: 30,
            role_name: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_install_log_ingestion_fails_on_unusable_stack() {
        for status in ["ROLLBACK_COMPLETE", "DELETE_FAILED", "CREATE_IN_PROGRESS"] {
            let aws = FakeAws::default().on("cloudformation describe-stacks", stack(status));
            let resources = StackResources::new(aws);

            let ok = resources
                .install_log_ingestion(&ingestion_params())
                .await
                .unwrap();

            assert!(!ok, "{} should not count as installed", status);
            assert_eq!(resources.aws().calls(), vec!["cloudformation describe-stacks"]);
        }
    }

    #[tokio::test]
    async fn test_install_log_ingestion_accepts_rolled_back_update() {
        let aws = FakeAws::default().on(
            "cloudformation describe-stacks",
            stack("UPDATE_ROLLBACK_COMPLETE"),
        );
        let resources = StackResources::new(aws);

        assert!(
            resources
                .install_log_ingestion(&ingestion_params())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_install_log_ingestion_runs_change_set() {
        let aws = FakeAws::default()
            .on("cloudformation describe-stacks", Scripted::Missing)
            .on(
                "serverlessrepo create-cloud-formation-change-set",
                Scripted::Ok(json!({ "ChangeSetId": "arn:cs/1" })),
            );
        let resources = StackResources::new(aws);

        let ok = resources
            .install_log_ingestion(&LogIngestionParams {
                license_key: "key".to_string(),
                enable_logs: true,
                memory_size: 256,
                timeout: 60,
                role_name: Some("my-exec-role".to_string()),
                tags: vec![],
            })
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(
            resources.aws().calls(),
            vec![
                "cloudformation describe-stacks",
                "serverlessrepo create-cloud-formation-change-set",
                "cloudformation wait change-set-create-complete",
                "cloudformation execute-change-set",
                "cloudformation wait stack-create-complete",
            ]
        );
        let overrides = resources
            .aws()
            .args_of("serverlessrepo create-cloud-formation-change-set");
        let joined = overrides.join(" ");
        assert!(joined.contains(r#"{"Name":"NRLoggingEnabled","Value":"True"}"#));
        assert!(joined.contains(r#"{"Name":"MemorySize","Value":"256"}"#));
        assert!(joined.contains(r#"{"Name":"FunctionRole","Value":"my-exec-role"}"#));
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_parameters() {
        let aws = FakeAws::default()
            .on("cloudformation describe-stacks", stack("UPDATE_COMPLETE"))
            .on(
                "cloudformation create-change-set",
                Scripted::Ok(json!({ "Id": "arn:cs/2" })),
            );
        let resources = StackResources::new(aws);

        let ok = resources
            .update_log_ingestion(&LogIngestionUpdate {
                memory_size: Some(512),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(ok);
        let joined = resources
            .aws()
            .args_of("cloudformation create-change-set")
            .join(" ");
        assert!(joined.contains(r#"{"ParameterKey":"NRLicenseKey","UsePreviousValue":true}"#));
        assert!(
            joined.contains(r#"{"ParameterKey":"NRLoggingEnabled","UsePreviousValue":true}"#)
        );
        assert!(joined.contains(r#"{"ParameterKey":"MemorySize","ParameterValue":"512"}"#));
        assert!(joined.contains(r#"{"ParameterKey":"FunctionRole","UsePreviousValue":true}"#));
    }

    #[tokio::test]
    async fn test_update_without_stack_fails() {
        let aws = FakeAws::default().on("cloudformation describe-stacks", Scripted::Missing);
        let resources = StackResources::new(aws);

        let ok = resources
            .update_log_ingestion(&LogIngestionUpdate::default())
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_update_with_no_changes_succeeds() {
        let aws = FakeAws::default()
            .on("cloudformation describe-stacks", stack("UPDATE_COMPLETE"))
            .on(
                "cloudformation create-change-set",
                Scripted::Ok(json!({ "Id": "arn:cs/3" })),
            )
            .on(
                "cloudformation wait change-set-create-complete",
                Scripted::Refused("Waiter ChangeSetCreateComplete failed"),
            )
            .on(
                "cloudformation describe-change-set",
                Scripted::Ok(json!({
                    "StatusReason": "The submitted information didn't contain changes."
                })),
            );
        let resources = StackResources::new(aws);

        let ok = resources
            .update_log_ingestion(&LogIngestionUpdate {
                enable_logs: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(ok);
        assert!(
            !resources
                .aws()
                .calls()
                .contains(&"cloudformation execute-change-set".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_missing_stack_is_success() {
        let aws = FakeAws::default().on("cloudformation describe-stacks", Scripted::Missing);
        let resources = StackResources::new(aws);

        assert!(resources.remove_log_ingestion().await.unwrap());
        assert_eq!(resources.aws().calls(), vec!["cloudformation describe-stacks"]);
    }

    #[tokio::test]
    async fn test_remove_role_deletes_account_stack() {
        let aws = FakeAws::default().on("cloudformation describe-stacks", stack("CREATE_COMPLETE"));
        let resources = StackResources::new(aws);

        assert!(resources.remove_role(7).await.unwrap());
        assert_eq!(
            resources.aws().args_of("cloudformation delete-stack"),
            vec!["--stack-name", "NewRelicLambdaIntegrationRole-7"]
        );
    }

    #[tokio::test]
    async fn test_auto_install_reads_key_from_function() {
        let aws = FakeAws::default()
            .on("cloudformation describe-stacks", Scripted::Missing)
            .on(
                "lambda get-function-configuration",
                Scripted::Ok(json!({
                    "Environment": { "Variables": { "LICENSE_KEY": "abc123" } }
                })),
            )
            .on("cloudformation describe-stacks", Scripted::Missing);
        let resources = StackResources::new(aws);

        assert!(resources.auto_install_license_key_secret(&[]).await.unwrap());
        let joined = resources
            .aws()
            .args_of("cloudformation create-stack")
            .join(" ");
        assert!(joined.contains(LICENSE_KEY_SECRET_STACK));
        assert!(joined.contains("abc123"));
    }

    #[tokio::test]
    async fn test_auto_install_noop_when_secret_exists() {
        let aws = FakeAws::default().on("cloudformation describe-stacks", stack("CREATE_COMPLETE"));
        let resources = StackResources::new(aws);

        assert!(resources.auto_install_license_key_secret(&[]).await.unwrap());
        assert_eq!(resources.aws().calls(), vec!["cloudformation describe-stacks"]);
    }

    #[tokio::test]
    async fn test_secret_update_without_changes_is_success() {
        let aws = FakeAws::default()
            .on("cloudformation describe-stacks", stack("CREATE_COMPLETE"))
            .on(
                "cloudformation update-stack",
                Scripted::Refused("An error occurred (ValidationError): No updates are to be performed."),
            );
        let resources = StackResources::new(aws);

        assert!(
            resources
                .install_license_key_secret("key", &[])
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_permissions_filters_denied() {
        let aws = FakeAws::default()
            .on(
                "sts get-caller-identity",
                Scripted::Ok(json!({
                    "Account": "123456789012",
                    "Arn": "arn:aws:sts::123456789012:assumed-role/Admin/session"
                })),
            )
            .on(
                "iam simulate-principal-policy",
                Scripted::Ok(json!({
                    "EvaluationResults": [
                        { "EvalActionName": "iam:CreateRole", "EvalDecision": "allowed" },
                        { "EvalActionName": "lambda:CreateFunction", "EvalDecision": "implicitDeny" }
                    ]
                })),
            );
        let resources = StackResources::new(aws);

        let missing = resources
            .missing_permissions(&["iam:CreateRole", "lambda:CreateFunction"])
            .await
            .unwrap();
        assert_eq!(missing, vec!["lambda:CreateFunction"]);
        let sim_args = resources.aws().args_of("iam simulate-principal-policy");
        assert_eq!(sim_args[1], "arn:aws:iam::123456789012:role/Admin");
    }
}

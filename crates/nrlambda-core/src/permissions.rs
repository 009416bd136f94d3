//! Permission pre-check
//!
//! An advisory pass run before a workflow when requested: the session
//! principal's policy is simulated against every action the workflow may
//! need, and any denied action aborts the workflow before it mutates anything.

use crate::error::{CoreError, Result};
use crate::resources::CloudResources;
use tracing::{debug, info};

/// Actions needed by install and update
pub const INSTALL_ACTIONS: &[&str] = &[
    "cloudformation:CreateChangeSet",
    "cloudformation:CreateStack",
    "cloudformation:DescribeStacks",
    "cloudformation:DescribeChangeSet",
    "cloudformation:ExecuteChangeSet",
    "cloudformation:UpdateStack",
    "iam:AttachRolePolicy",
    "iam:CreateRole",
    "iam:GetRole",
    "iam:PassRole",
    "iam:PutRolePolicy",
    "iam:CreatePolicy",
    "lambda:AddPermission",
    "lambda:CreateFunction",
    "lambda:GetFunction",
    "lambda:GetFunctionConfiguration",
    "lambda:UpdateFunctionConfiguration",
    "logs:DeleteSubscriptionFilter",
    "logs:DescribeSubscriptionFilters",
    "logs:PutSubscriptionFilter",
    "s3:GetObject",
    "secretsmanager:CreateSecret",
    "secretsmanager:TagResource",
    "serverlessrepo:CreateCloudFormationChangeSet",
];

/// Actions needed by uninstall
pub const UNINSTALL_ACTIONS: &[&str] = &[
    "cloudformation:DeleteStack",
    "cloudformation:DescribeStacks",
    "iam:DeleteRole",
    "iam:DeleteRolePolicy",
    "iam:DetachRolePolicy",
    "iam:DeletePolicy",
    "lambda:DeleteFunction",
    "lambda:RemovePermission",
    "secretsmanager:DeleteSecret",
];

/// Policy source for a caller ARN.
///
/// Assumed-role sessions (`arn:aws:sts::<acct>:assumed-role/<role>/<session>`)
/// cannot be simulated directly; the underlying role is used instead.
pub fn policy_source_arn(caller_arn: &str) -> String {
    let Some(rest) = caller_arn.strip_prefix("arn:aws:sts::") else {
        return caller_arn.to_string();
    };
    let mut parts = rest.splitn(2, ':');
    let (Some(account), Some(resource)) = (parts.next(), parts.next()) else {
        return caller_arn.to_string();
    };
    match resource.strip_prefix("assumed-role/") {
        Some(role_and_session) => {
            let role = role_and_session.split('/').next().unwrap_or(role_and_session);
            format!("arn:aws:iam::{}:role/{}", account, role)
        }
        None => caller_arn.to_string(),
    }
}

async fn ensure(cloud: &dyn CloudResources, actions: &[&str]) -> Result<()> {
    debug!("Simulating {} actions for the session principal", actions.len());
    let missing = cloud.missing_permissions(actions).await?;
    if missing.is_empty() {
        info!("AWS permission check passed");
        Ok(())
    } else {
        Err(CoreError::PermissionDenied { missing })
    }
}

/// Fail with [`CoreError::PermissionDenied`] unless install is permitted
pub async fn ensure_install_permissions(cloud: &dyn CloudResources) -> Result<()> {
    ensure(cloud, INSTALL_ACTIONS).await
}

/// Fail with [`CoreError::PermissionDenied`] unless uninstall is permitted
pub async fn ensure_uninstall_permissions(cloud: &dyn CloudResources) -> Result<()> {
    ensure(cloud, UNINSTALL_ACTIONS).await
}

use super::params::InstallConfig;
use super::{finish, skip, start};
use crate::error::{CoreError, Result};
use crate::permissions;
use crate::platform::PlatformApi;
use crate::progress::{ProgressCallback, notice, phase};
use crate::report::{Step, StepOutcome, WorkflowKind, WorkflowReport};
use crate::resources::{CloudResources, LogIngestionParams, RoleRequest};
use tracing::{debug, info};

/// Linked account label used when none is given.
///
/// Derived from the AWS account so repeated installs target the same link.
pub fn default_linked_account_name(aws_account_id: &str) -> String {
    format!("New Relic Lambda Integration - {}", aws_account_id)
}

/// Install the integration
///
/// Order:
/// 1. optional permission check
/// 2. credential validation and license key retrieval
/// 3. linked account lookup (reused when present, mismatch is fatal)
/// 4. integration role
/// 5. license key secret, when enabled
/// 6. account link and Lambda integration, when a role is available
/// 7. log ingestion function
///
/// Steps 1 to 3 fail the whole call before anything is created. From step 4
/// on every outcome is recorded and the next step runs regardless.
pub async fn install(
    cloud: &dyn CloudResources,
    platform: &dyn PlatformApi,
    config: &InstallConfig,
    progress: Option<ProgressCallback>,
) -> Result<WorkflowReport> {
    let mut report = WorkflowReport::new(WorkflowKind::Install);

    if config.permissions_check {
        phase(&progress, "Checking AWS permissions");
        permissions::ensure_install_permissions(cloud).await?;
    }

    phase(&progress, "Validating New Relic credentials");
    platform.validate_credentials().await?;

    phase(&progress, "Retrieving integration license key");
    let license_key = platform.license_key().await?;

    let aws_account_id = cloud.account_id().await?;
    let name = config
        .linked_account_name
        .clone()
        .unwrap_or_else(|| default_linked_account_name(&aws_account_id));
    debug!("Using linked account name '{}'", name);

    phase(
        &progress,
        "Checking for a pre-existing link between New Relic and AWS",
    );
    let existing = platform.find_linked_account(&name).await?;
    if let Some(linked) = &existing {
        if linked.external_id != aws_account_id {
            return Err(CoreError::LinkedAccountMismatch {
                name,
                linked_aws_account: linked.external_id.clone(),
                session_aws_account: aws_account_id,
            });
        }
        notice(
            &progress,
            format!("Linked account '{}' already exists, reusing it", name),
        );
    }

    start(&progress, Step::CreateRole);
    let role = cloud
        .create_role(&RoleRequest {
            nr_account_id: config.nr_account_id,
            policy_override: config.aws_role_policy.clone(),
            existing_arn: config.integration_arn.clone(),
            tags: config.tags.clone(),
        })
        .await?;
    let role_outcome = match &role {
        Some(_) => StepOutcome::Succeeded,
        None => StepOutcome::Failed("integration role could not be created".to_string()),
    };
    finish(&mut report, &progress, Step::CreateRole, role_outcome);

    if config.enable_license_key_secret {
        start(&progress, Step::InstallLicenseKeySecret);
        let ok = cloud
            .install_license_key_secret(&license_key, &config.tags)
            .await?;
        finish(
            &mut report,
            &progress,
            Step::InstallLicenseKeySecret,
            StepOutcome::from_success(ok),
        );
    } else {
        skip(
            &mut report,
            &progress,
            Step::InstallLicenseKeySecret,
            "license key secret disabled",
        );
    }

    match &role {
        Some(role) => {
            if existing.is_some() {
                skip(
                    &mut report,
                    &progress,
                    Step::LinkAccount,
                    "linked account already exists",
                );
            } else {
                start(&progress, Step::LinkAccount);
                let ok = platform.link_account(&role.arn, &name).await?;
                finish(
                    &mut report,
                    &progress,
                    Step::LinkAccount,
                    StepOutcome::from_success(ok),
                );
            }

            start(&progress, Step::EnableLambdaIntegration);
            let ok = platform.enable_lambda_integration(&name).await?;
            finish(
                &mut report,
                &progress,
                Step::EnableLambdaIntegration,
                StepOutcome::from_success(ok),
            );
        }
        None => {
            skip(&mut report, &progress, Step::LinkAccount, "no integration role");
            skip(
                &mut report,
                &progress,
                Step::EnableLambdaIntegration,
                "no integration role",
            );
        }
    }

    start(&progress, Step::InstallLogIngestion);
    let ok = cloud
        .install_log_ingestion(&LogIngestionParams {
            license_key,
            enable_logs: config.enable_logs,
            memory_size: config.memory_size,
            timeout: config.timeout,
            role_name: config.role_name.clone(),
            tags: config.tags.clone(),
        })
        .await?;
    finish(
        &mut report,
        &progress,
        Step::InstallLogIngestion,
        StepOutcome::from_success(ok),
    );

    if report.success() && config.verbose {
        report.next_steps = Some(next_steps(config));
    }

    info!("{}", report.summary());
    Ok(report)
}

fn next_steps(config: &InstallConfig) -> String {
    let mut command = format!(
        "$ newrelic-lambda layers install --function all --nr-account-id {}",
        config.nr_account_id
    );
    if let Some(profile) = &config.session.profile {
        command.push_str(&format!(" --aws-profile {}", profile));
    }
    if let Some(region) = &config.session.region {
        command.push_str(&format!(" --aws-region {}", region));
    }
    format!(
        "Next steps: Add the New Relic layers to your Lambda functions with the below command.\n\n{}",
        command
    )
}

use super::params::UninstallConfig;
use super::{finish, skip, start};
use crate::confirm::Confirm;
use crate::error::Result;
use crate::permissions;
use crate::progress::{ProgressCallback, notice, phase};
use crate::report::{Step, StepOutcome, WorkflowKind, WorkflowReport};
use crate::resources::CloudResources;
use tracing::info;

/// Asked before removing the integration role; declining skips only that step
pub const ROLE_PROMPT: &str =
    "This will uninstall the New Relic AWS Lambda integration role. Are you sure you want to proceed?";

/// Asked before removing the log ingestion function; declining aborts
pub const LOG_INGESTION_PROMPT: &str = "This will uninstall the New Relic AWS Lambda log ingestion function and role. Are you sure you want to proceed?";

/// Asked before removing the license key secret; declining aborts
pub const SECRET_PROMPT: &str = "This will uninstall the New Relic License Key managed secret, and IAM Policy. Are you sure you want to proceed?";

/// Remove the integration, newest dependency first
///
/// Without `force` each destructive tier is confirmed through `confirm`.
/// Declining the role prompt skips the role; declining either later prompt
/// aborts the workflow and nothing further is removed. With `force` no
/// prompt is shown and every removal is attempted.
pub async fn uninstall(
    cloud: &dyn CloudResources,
    config: &UninstallConfig,
    confirm: &dyn Confirm,
    progress: Option<ProgressCallback>,
) -> Result<WorkflowReport> {
    let mut report = WorkflowReport::new(WorkflowKind::Uninstall);

    if config.permissions_check {
        phase(&progress, "Checking AWS permissions");
        permissions::ensure_uninstall_permissions(cloud).await?;
    }

    match config.nr_account_id {
        Some(nr_account_id) => {
            if config.force || confirm.confirm(ROLE_PROMPT)? {
                start(&progress, Step::RemoveRole);
                let ok = cloud.remove_role(nr_account_id).await?;
                finish(
                    &mut report,
                    &progress,
                    Step::RemoveRole,
                    StepOutcome::from_success(ok),
                );
            } else {
                skip(&mut report, &progress, Step::RemoveRole, "declined");
            }
        }
        None => skip(
            &mut report,
            &progress,
            Step::RemoveRole,
            "no New Relic account id given",
        ),
    }

    if !config.force && !confirm.confirm(LOG_INGESTION_PROMPT)? {
        report.abort(LOG_INGESTION_PROMPT);
        notice(&progress, "Aborted");
        return Ok(report);
    }
    start(&progress, Step::RemoveLogIngestion);
    let ok = cloud.remove_log_ingestion().await?;
    finish(
        &mut report,
        &progress,
        Step::RemoveLogIngestion,
        StepOutcome::from_success(ok),
    );

    if !config.force && !confirm.confirm(SECRET_PROMPT)? {
        report.abort(SECRET_PROMPT);
        notice(&progress, "Aborted");
        return Ok(report);
    }
    start(&progress, Step::RemoveLicenseKeySecret);
    let ok = cloud.remove_license_key_secret().await?;
    finish(
        &mut report,
        &progress,
        Step::RemoveLicenseKeySecret,
        StepOutcome::from_success(ok),
    );

    info!("{}", report.summary());
    Ok(report)
}

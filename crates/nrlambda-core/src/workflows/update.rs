use super::params::UpdateConfig;
use super::{finish, start};
use crate::error::Result;
use crate::permissions;
use crate::progress::{ProgressCallback, phase};
use crate::report::{Step, StepOutcome, WorkflowKind, WorkflowReport};
use crate::resources::{CloudResources, LogIngestionUpdate};
use tracing::info;

/// Reconfigure an installed integration in place
///
/// Only the log ingestion function and the license key secret are touched;
/// the integration role and the account link are never created here.
pub async fn update(
    cloud: &dyn CloudResources,
    config: &UpdateConfig,
    progress: Option<ProgressCallback>,
) -> Result<WorkflowReport> {
    let mut report = WorkflowReport::new(WorkflowKind::Update);

    if config.permissions_check {
        phase(&progress, "Checking AWS permissions");
        permissions::ensure_install_permissions(cloud).await?;
    }

    start(&progress, Step::UpdateLogIngestion);
    let ok = cloud
        .update_log_ingestion(&LogIngestionUpdate {
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
        Step::UpdateLogIngestion,
        StepOutcome::from_success(ok),
    );

    let secret_step = if config.enable_license_key_secret {
        Step::InstallLicenseKeySecret
    } else {
        Step::RemoveLicenseKeySecret
    };
    start(&progress, secret_step);
    let ok = if config.enable_license_key_secret {
        cloud.auto_install_license_key_secret(&config.tags).await?
    } else {
        cloud.remove_license_key_secret().await?
    };
    finish(
        &mut report,
        &progress,
        secret_step,
        StepOutcome::from_success(ok),
    );

    info!("{}", report.summary());
    Ok(report)
}

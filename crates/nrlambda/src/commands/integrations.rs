//! Integration lifecycle command implementations
//!
//! Each handler resolves credentials, builds the AWS and New Relic clients,
//! runs one workflow and renders its report. A workflow that ends incomplete
//! or aborted becomes [`NrLambdaError::WorkflowIncomplete`] after the report
//! has been shown, so the process exits non-zero.

use crate::cli::{InstallArgs, IntegrationsCommands, OutputFormat, UninstallArgs, UpdateArgs};
use crate::commands::structured_format;
use crate::connection::ConnectionManager;
use crate::error::NrLambdaError;
use crate::output;
use colored::Colorize;
use nrlambda_core::report::{StepOutcome, WorkflowReport};
use nrlambda_core::workflows::{self, InstallConfig, UninstallConfig, UpdateConfig};
use nrlambda_core::{Confirm, CoreError, ProgressCallback, WorkflowEvent};
use tracing::{debug, info};

/// Handle integration lifecycle commands
pub async fn handle_integrations_command(
    cmd: &IntegrationsCommands,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    verbose: bool,
) -> Result<(), NrLambdaError> {
    match cmd {
        IntegrationsCommands::Install(args) => {
            handle_install(args, conn_mgr, profile_name, output_format, verbose).await
        }
        IntegrationsCommands::Uninstall(args) => {
            handle_uninstall(args, conn_mgr, profile_name, output_format).await
        }
        IntegrationsCommands::Update(args) => {
            handle_update(args, conn_mgr, profile_name, output_format).await
        }
    }
}

async fn handle_install(
    args: &InstallArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
    verbose: bool,
) -> Result<(), NrLambdaError> {
    let profile = conn_mgr.profile(profile_name)?;
    let account = conn_mgr.newrelic_account(profile, &args.newrelic)?;
    let session = conn_mgr.cloud_session(profile, &args.aws);

    let mut config = InstallConfig::new(account.account_id)
        .with_enable_logs(args.enable_logs)
        .with_memory_size(args.memory_size)
        .with_timeout(args.timeout)
        .with_license_key_secret(args.secret.enabled())
        .with_tags(args.tags.to_tags())
        .with_permissions_check(args.aws.aws_permissions_check)
        .with_verbose(verbose)
        .with_session(session.clone());
    if let Some(name) = &args.linked_account_name {
        config = config.with_linked_account_name(name);
    }
    if let Some(policy) = &args.aws_role_policy {
        config = config.with_role_policy(policy);
    }
    if let Some(arn) = &args.integration_arn {
        config = config.with_integration_arn(arn);
    }
    if let Some(role_name) = &args.role_name {
        config = config.with_role_name(role_name);
    }
    debug!("Install configuration: {:?}", config);

    let cloud = conn_mgr.create_resources(session).await?;
    let nerdgraph = conn_mgr.create_nerdgraph_client(account)?;

    info!("Installing integration for account {}", config.nr_account_id);
    let report = workflows::install(&cloud, &nerdgraph, &config, progress(output_format)).await?;
    render(&report, output_format)
}

async fn handle_uninstall(
    args: &UninstallArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    let profile = conn_mgr.profile(profile_name)?;
    let session = conn_mgr.cloud_session(profile, &args.aws);

    let mut config = UninstallConfig::new()
        .with_force(args.force)
        .with_permissions_check(args.aws.aws_permissions_check);
    if let Some(id) = args
        .nr_account_id
        .or_else(|| profile.map(|p| p.nr_account_id))
    {
        config = config.with_nr_account_id(id);
    }
    debug!("Uninstall configuration: {:?}", config);

    let cloud = conn_mgr.create_resources(session).await?;

    let report =
        workflows::uninstall(&cloud, &config, &TerminalConfirm, progress(output_format)).await?;
    render(&report, output_format)
}

async fn handle_update(
    args: &UpdateArgs,
    conn_mgr: &ConnectionManager,
    profile_name: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    let profile = conn_mgr.profile(profile_name)?;
    let session = conn_mgr.cloud_session(profile, &args.aws);

    let mut config = UpdateConfig::new()
        .with_license_key_secret(args.secret.enabled())
        .with_tags(args.tags.to_tags())
        .with_permissions_check(args.aws.aws_permissions_check);
    if let Some(enabled) = args.enable_logs() {
        config = config.with_enable_logs(enabled);
    }
    if let Some(mib) = args.memory_size {
        config = config.with_memory_size(mib);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(secs);
    }
    if let Some(role_name) = &args.role_name {
        config = config.with_role_name(role_name);
    }
    debug!("Update configuration: {:?}", config);

    let cloud = conn_mgr.create_resources(session).await?;

    let report = workflows::update(&cloud, &config, progress(output_format)).await?;
    render(&report, output_format)
}

/// Interactive yes/no prompt, defaulting to no
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> nrlambda_core::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| CoreError::Io(std::io::Error::other(e.to_string())))
    }
}

/// Progress lines are printed only for human output
fn progress(output_format: OutputFormat) -> Option<ProgressCallback> {
    if structured_format(output_format).is_some() {
        return None;
    }
    let callback: ProgressCallback =
        Box::new(|event: WorkflowEvent| println!("{}", progress_line(&event)));
    Some(callback)
}

fn progress_line(event: &WorkflowEvent) -> String {
    match event {
        WorkflowEvent::Phase { message } => format!("{}...", message),
        WorkflowEvent::StepStarted { step } => format!("{}...", step.description()),
        WorkflowEvent::StepFinished { step, outcome } => match outcome {
            StepOutcome::Succeeded => format!("{} {}", "✔".green().bold(), step.description()),
            StepOutcome::Failed(reason) => format!(
                "{} {}: {}",
                "✘".red().bold(),
                step.description(),
                reason
            ),
            StepOutcome::Skipped(reason) => {
                format!("{} {} ({})", "-".dimmed(), step.description(), reason)
            }
        },
        WorkflowEvent::Notice { message } => message.yellow().to_string(),
    }
}

fn render(report: &WorkflowReport, output_format: OutputFormat) -> Result<(), NrLambdaError> {
    match structured_format(output_format) {
        Some(format) => {
            output::print_report(report, format)?;
            if !report.success() && format != output::OutputFormat::Table {
                eprintln!("{}", report.summary());
            }
        }
        None => {
            if let Some(next_steps) = &report.next_steps {
                println!("\n{}", next_steps);
            }
            if report.success() {
                println!("{} {}", "✔".green().bold(), report.summary().green().bold());
            } else {
                println!("{} {}", "✘".red().bold(), report.summary().red().bold());
            }
        }
    }

    if report.success() {
        Ok(())
    } else {
        Err(NrLambdaError::WorkflowIncomplete {
            summary: report.summary(),
        })
    }
}

//! Profile management command implementations

use crate::cli::{OutputFormat, ProfileCommands};
use crate::commands::structured_format;
use crate::connection::ConnectionManager;
use crate::error::NrLambdaError;
use crate::output;
use colored::Colorize;
use nrlambda_core::config::Profile;
use nrlambda_core::platform::NewRelicRegion;
use serde::Serialize;
use tracing::{debug, trace};

/// Handle profile management commands
pub async fn handle_profile_command(
    profile_cmd: &ProfileCommands,
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    use ProfileCommands::*;

    match profile_cmd {
        List => handle_list(conn_mgr, output_format),
        Path => handle_path(conn_mgr, output_format),
        Show { name } => handle_show(conn_mgr, name, output_format),
        Set {
            name,
            nr_account_id,
            nr_api_key,
            nr_region,
            aws_profile,
            aws_region,
        } => {
            let mut profile = Profile::new(*nr_account_id);
            profile.nr_api_key = nr_api_key.clone();
            profile.nr_region = *nr_region;
            profile.aws_profile = aws_profile.clone();
            profile.aws_region = aws_region.clone();
            handle_set(conn_mgr, name, profile)
        }
        Remove { name } => handle_remove(conn_mgr, name),
        ProfileCommands::Default { name } => handle_default(conn_mgr, name),
    }
}

/// Profile as shown to the user, API key masked
#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    name: &'a str,
    is_default: bool,
    nr_account_id: u64,
    nr_region: NewRelicRegion,
    #[serde(skip_serializing_if = "Option::is_none")]
    nr_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_profile: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    aws_region: Option<&'a str>,
}

impl<'a> ProfileView<'a> {
    fn new(name: &'a str, profile: &'a Profile, default_profile: Option<&str>) -> Self {
        Self {
            name,
            is_default: default_profile == Some(name),
            nr_account_id: profile.nr_account_id,
            nr_region: profile.nr_region,
            nr_api_key: profile.masked_api_key(),
            aws_profile: profile.aws_profile.as_deref(),
            aws_region: profile.aws_region.as_deref(),
        }
    }
}

fn handle_list(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    debug!("Listing all configured profiles");
    let default_profile = conn_mgr.config.default_profile.as_deref();
    let views: Vec<ProfileView> = conn_mgr
        .config
        .list_profiles()
        .into_iter()
        .map(|(name, profile)| ProfileView::new(name, profile, default_profile))
        .collect();
    trace!("Found {} profiles", views.len());

    if let Some(format) = structured_format(output_format) {
        output::print_output(&views, format)?;
        return Ok(());
    }

    if views.is_empty() {
        println!("No profiles configured.");
        println!("Use 'nrlambda profile set' to create a profile.");
        return Ok(());
    }

    for view in &views {
        let marker = if view.is_default {
            "*".green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {} (account {}, region {})",
            marker, view.name, view.nr_account_id, view.nr_region
        );
    }
    Ok(())
}

fn handle_path(
    conn_mgr: &ConnectionManager,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    let config_path = conn_mgr.active_config_path()?;

    match structured_format(output_format) {
        Some(format) => {
            let output_data = serde_json::json!({
                "config_path": config_path.to_string_lossy(),
            });
            output::print_output(&output_data, format)?;
        }
        None => {
            println!("{}", config_path.display());
        }
    }
    Ok(())
}

fn handle_show(
    conn_mgr: &ConnectionManager,
    name: &str,
    output_format: OutputFormat,
) -> Result<(), NrLambdaError> {
    let profile = conn_mgr.config.profile(name)?;
    let view = ProfileView::new(name, profile, conn_mgr.config.default_profile.as_deref());

    if let Some(format) = structured_format(output_format) {
        output::print_output(&view, format)?;
        return Ok(());
    }

    println!("Profile: {}", view.name);
    println!("  New Relic account: {}", view.nr_account_id);
    println!("  New Relic region: {}", view.nr_region);
    println!(
        "  New Relic API key: {}",
        view.nr_api_key.as_deref().unwrap_or("(not set)")
    );
    if let Some(aws_profile) = view.aws_profile {
        println!("  AWS profile: {}", aws_profile);
    }
    if let Some(aws_region) = view.aws_region {
        println!("  AWS region: {}", aws_region);
    }
    if view.is_default {
        println!("  (default)");
    }
    Ok(())
}

fn handle_set(
    conn_mgr: &ConnectionManager,
    name: &str,
    profile: Profile,
) -> Result<(), NrLambdaError> {
    debug!("Setting profile: {}", name);
    let mut updated = conn_mgr.clone();
    let replaced = updated.config.profiles.contains_key(name);
    updated.config.set_profile(name.to_string(), profile);

    // The first profile becomes the default
    if updated.config.default_profile.is_none() && updated.config.profiles.len() == 1 {
        updated.config.default_profile = Some(name.to_string());
    }
    updated.save_config()?;

    if replaced {
        println!("Profile '{}' updated successfully.", name);
    } else {
        println!("Profile '{}' created successfully.", name);
    }
    Ok(())
}

fn handle_remove(conn_mgr: &ConnectionManager, name: &str) -> Result<(), NrLambdaError> {
    debug!("Removing profile: {}", name);
    let mut updated = conn_mgr.clone();
    let was_default = updated.config.default_profile.as_deref() == Some(name);
    if updated.config.remove_profile(name).is_none() {
        return Err(NrLambdaError::ProfileNotFound { name: name.into() });
    }
    updated.save_config()?;

    println!("Profile '{}' removed successfully.", name);
    if was_default {
        println!("Default profile cleared.");
    }
    Ok(())
}

fn handle_default(conn_mgr: &ConnectionManager, name: &str) -> Result<(), NrLambdaError> {
    debug!("Setting default profile: {}", name);
    conn_mgr.config.profile(name)?;

    let mut updated = conn_mgr.clone();
    updated.config.default_profile = Some(name.to_string());
    updated.save_config()?;

    println!("Default profile set to '{}'.", name);
    Ok(())
}

//! Connection management for AWS and New Relic clients

use crate::cli::{AwsArgs, NewRelicArgs};
use crate::error::{NrLambdaError, Result as CliResult};
use anyhow::Context;
use nrlambda_core::aws::{AwsCli, CloudSession};
use nrlambda_core::config::{Config, Profile};
use nrlambda_core::platform::{NerdGraphClient, NewRelicAccount};
use nrlambda_core::resources::StackResources;
use std::path::PathBuf;
use tracing::{debug, info, trace};

/// Connection manager for creating authenticated clients
///
/// Values resolve as command-line flag (or its environment variable) first,
/// then the selected profile.
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            self.config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            self.config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Path of the active configuration file
    pub fn active_config_path(&self) -> CliResult<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Config::config_path()?),
        }
    }

    /// Profile selected by `--profile`, the default profile, or the only one there is
    pub fn profile(&self, profile_name: Option<&str>) -> CliResult<Option<&Profile>> {
        let profile = self.config.resolve_profile(profile_name)?;
        if let Some(name) = self.config.resolve_profile_name(profile_name)
            && profile.is_some()
        {
            info!("Using profile: {}", name);
        }
        Ok(profile)
    }

    /// AWS session scope from flags, falling back to the profile defaults
    pub fn cloud_session(&self, profile: Option<&Profile>, aws: &AwsArgs) -> CloudSession {
        let session = CloudSession::new(
            aws.aws_profile
                .clone()
                .or_else(|| profile.and_then(|p| p.aws_profile.clone())),
            aws.aws_region
                .clone()
                .or_else(|| profile.and_then(|p| p.aws_region.clone())),
        );
        debug!(
            "AWS session: profile={:?}, region={:?}",
            session.profile, session.region
        );
        session
    }

    /// New Relic account id from the flag or the profile
    pub fn nr_account_id(
        &self,
        profile: Option<&Profile>,
        flag: Option<u64>,
    ) -> CliResult<u64> {
        flag.or_else(|| profile.map(|p| p.nr_account_id))
            .ok_or(NrLambdaError::MissingAccountId)
    }

    /// Full New Relic account from flags, falling back to the profile
    pub fn newrelic_account(
        &self,
        profile: Option<&Profile>,
        args: &NewRelicArgs,
    ) -> CliResult<NewRelicAccount> {
        let account_id = self.nr_account_id(profile, args.nr_account_id)?;
        let api_key = args
            .nr_api_key
            .clone()
            .or_else(|| profile.and_then(|p| p.nr_api_key.clone()))
            .ok_or(NrLambdaError::MissingApiKey)?;
        let region = args
            .nr_region
            .or_else(|| profile.map(|p| p.nr_region))
            .unwrap_or_default();

        trace!("New Relic account {} in region {}", account_id, region);
        Ok(NewRelicAccount::new(account_id, api_key, region))
    }

    /// Create the AWS resource layer, verifying the session can authenticate
    pub async fn create_resources(
        &self,
        session: CloudSession,
    ) -> CliResult<StackResources<AwsCli>> {
        debug!("Connecting to AWS");
        let (aws, identity) = AwsCli::connect(session).await?;
        info!(
            "Using AWS identity {}",
            identity["Arn"].as_str().unwrap_or("<unknown>")
        );
        Ok(StackResources::new(aws))
    }

    /// Create a NerdGraph client for the account
    pub fn create_nerdgraph_client(&self, account: NewRelicAccount) -> CliResult<NerdGraphClient> {
        debug!("Creating NerdGraph client for region {}", account.region);
        Ok(NerdGraphClient::new(account)?)
    }
}

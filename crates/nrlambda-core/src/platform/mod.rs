//! New Relic platform access
//!
//! The workflows talk to New Relic through [`PlatformApi`]; the production
//! implementation is [`NerdGraphClient`].

pub mod nerdgraph;
mod queries;

pub use nerdgraph::NerdGraphClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// New Relic data center hosting the account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NewRelicRegion {
    #[default]
    Us,
    Eu,
    Staging,
}

impl NewRelicRegion {
    /// NerdGraph endpoint for the region
    pub fn endpoint(&self) -> &'static str {
        match self {
            NewRelicRegion::Us => "https://api.newrelic.com/graphql",
            NewRelicRegion::Eu => "https://api.eu.newrelic.com/graphql",
            NewRelicRegion::Staging => "https://staging-api.newrelic.com/graphql",
        }
    }
}

impl fmt::Display for NewRelicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewRelicRegion::Us => write!(f, "us"),
            NewRelicRegion::Eu => write!(f, "eu"),
            NewRelicRegion::Staging => write!(f, "staging"),
        }
    }
}

impl std::str::FromStr for NewRelicRegion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(NewRelicRegion::Us),
            "eu" => Ok(NewRelicRegion::Eu),
            "staging" => Ok(NewRelicRegion::Staging),
            other => Err(format!(
                "unknown New Relic region '{}', expected us, eu or staging",
                other
            )),
        }
    }
}

/// The New Relic account the integration reports into
#[derive(Clone, PartialEq, Eq)]
pub struct NewRelicAccount {
    pub account_id: u64,
    pub api_key: String,
    pub region: NewRelicRegion,
}

impl NewRelicAccount {
    pub fn new(account_id: u64, api_key: impl Into<String>, region: NewRelicRegion) -> Self {
        Self {
            account_id,
            api_key: api_key.into(),
            region,
        }
    }
}

// API keys must not end up in logs
impl fmt::Debug for NewRelicAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRelicAccount")
            .field("account_id", &self.account_id)
            .field("api_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// A New Relic cloud linked account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAccount {
    pub id: u64,
    pub name: String,
    /// AWS account id the link points at
    #[serde(rename = "externalId")]
    pub external_id: String,
}

/// New Relic operations the lifecycle workflows consume
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Fail with [`crate::CoreError::AuthenticationFailed`] unless the API key
    /// is accepted for the account
    async fn validate_credentials(&self) -> Result<()>;

    /// Ingest license key of the account
    async fn license_key(&self) -> Result<String>;

    /// Linked account called `name`, if one exists
    async fn find_linked_account(&self, name: &str) -> Result<Option<LinkedAccount>>;

    /// Link the AWS account reachable through `role_arn` under `name`
    async fn link_account(&self, role_arn: &str, name: &str) -> Result<bool>;

    /// Turn on the Lambda integration for the linked account called `name`
    async fn enable_lambda_integration(&self, name: &str) -> Result<bool>;
}

//! Resource operations layer
//!
//! Single-purpose operations on the AWS side of the integration. Each call is
//! independent: it takes everything it needs as arguments and returns either a
//! success flag or the identifier it produced. An operation that AWS refuses
//! returns `Ok(false)` / `Ok(None)`; only transport and credential problems
//! surface as `Err`.

pub mod stacks;
pub mod templates;

pub use stacks::{
    LICENSE_KEY_SECRET_STACK, LOG_INGESTION_FUNCTION, LOG_INGESTION_STACK, StackResources,
    role_stack_name,
};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Resource tag applied to every stack the integration creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Reference to the integration role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRef {
    pub arn: String,
}

/// Parameters for creating the integration role
#[derive(Debug, Clone, Default)]
pub struct RoleRequest {
    /// New Relic account the role trusts (used as the external id)
    pub nr_account_id: u64,
    /// Managed policy ARN replacing the default read-only policy
    pub policy_override: Option<String>,
    /// Pre-existing role; when set no role is created
    pub existing_arn: Option<String>,
    pub tags: Vec<Tag>,
}

/// Parameters for deploying the log ingestion function
#[derive(Debug, Clone)]
pub struct LogIngestionParams {
    pub license_key: String,
    pub enable_logs: bool,
    /// Memory size in MiB
    pub memory_size: u32,
    /// Timeout in seconds
    pub timeout: u32,
    /// Pre-created execution role name
    pub role_name: Option<String>,
    pub tags: Vec<Tag>,
}

/// In-place changes to the log ingestion function
///
/// `None` fields keep the deployed value. The license key is never re-sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogIngestionUpdate {
    pub enable_logs: Option<bool>,
    pub memory_size: Option<u32>,
    pub timeout: Option<u32>,
    pub role_name: Option<String>,
    pub tags: Vec<Tag>,
}

/// AWS-side operations the lifecycle workflows are composed from
#[async_trait]
pub trait CloudResources: Send + Sync {
    /// AWS account id of the current session
    async fn account_id(&self) -> Result<String>;

    /// Create the integration role, or hand back `existing_arn` untouched.
    ///
    /// `Ok(None)` means the role could not be created.
    async fn create_role(&self, request: &RoleRequest) -> Result<Option<RoleRef>>;

    /// Remove the integration role created for `nr_account_id`
    async fn remove_role(&self, nr_account_id: u64) -> Result<bool>;

    /// Create or update the license key managed secret
    async fn install_license_key_secret(&self, license_key: &str, tags: &[Tag]) -> Result<bool>;

    /// Ensure the managed secret exists, sourcing the key from the deployed
    /// log ingestion function when it has to be created
    async fn auto_install_license_key_secret(&self, tags: &[Tag]) -> Result<bool>;

    /// Remove the managed secret and its access policy
    async fn remove_license_key_secret(&self) -> Result<bool>;

    /// Deploy the log ingestion function
    async fn install_log_ingestion(&self, params: &LogIngestionParams) -> Result<bool>;

    /// Reconfigure the deployed log ingestion function
    async fn update_log_ingestion(&self, update: &LogIngestionUpdate) -> Result<bool>;

    /// Remove the log ingestion function
    async fn remove_log_ingestion(&self) -> Result<bool>;

    /// Subset of `actions` the session principal is not allowed to perform
    async fn missing_permissions(&self, actions: &[&str]) -> Result<Vec<String>>;
}

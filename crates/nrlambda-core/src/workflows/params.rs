//! Configuration bundles for the lifecycle workflows
//!
//! Each workflow takes one explicit value carrying everything it needs,
//! verbosity included.

use crate::aws::CloudSession;
use crate::resources::Tag;

/// Default memory size (MiB) of the log ingestion function
pub const DEFAULT_MEMORY_SIZE: u32 = 128;

/// Default timeout (seconds) of the log ingestion function
pub const DEFAULT_TIMEOUT: u32 = 30;

/// Parameters for installing the integration
///
/// # Example
///
/// ```rust
/// use nrlambda_core::workflows::InstallConfig;
///
/// let config = InstallConfig::new(1234567)
///     .with_enable_logs(true)
///     .with_memory_size(256)
///     .with_tag("team", "platform");
///
/// assert_eq!(config.memory_size, 256);
/// assert!(config.enable_license_key_secret);
/// ```
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// New Relic account to link (required)
    pub nr_account_id: u64,
    /// Linked account label; derived from the AWS account id when `None`
    pub linked_account_name: Option<String>,
    /// Managed policy ARN replacing the role's default read-only policy
    pub aws_role_policy: Option<String>,
    /// Pre-existing integration role; skips role creation
    pub integration_arn: Option<String>,
    /// Forward logs to New Relic Logs
    pub enable_logs: bool,
    /// Log ingestion function memory (MiB)
    pub memory_size: u32,
    /// Log ingestion function timeout (seconds)
    pub timeout: u32,
    /// Pre-created execution role for the log ingestion function
    pub role_name: Option<String>,
    /// Install the license key managed secret (default: true)
    pub enable_license_key_secret: bool,
    pub tags: Vec<Tag>,
    /// Simulate the install permissions before mutating anything
    pub permissions_check: bool,
    /// Attach next-step guidance to a complete install
    pub verbose: bool,
    /// Session scope, echoed in the next-step guidance
    pub session: CloudSession,
}

impl InstallConfig {
    #[must_use]
    pub fn new(nr_account_id: u64) -> Self {
        Self {
            nr_account_id,
            linked_account_name: None,
            aws_role_policy: None,
            integration_arn: None,
            enable_logs: false,
            memory_size: DEFAULT_MEMORY_SIZE,
            timeout: DEFAULT_TIMEOUT,
            role_name: None,
            enable_license_key_secret: true,
            tags: Vec::new(),
            permissions_check: false,
            verbose: false,
            session: CloudSession::default(),
        }
    }

    #[must_use]
    pub fn with_linked_account_name(mut self, name: impl Into<String>) -> Self {
        self.linked_account_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_role_policy(mut self, policy_arn: impl Into<String>) -> Self {
        self.aws_role_policy = Some(policy_arn.into());
        self
    }

    #[must_use]
    pub fn with_integration_arn(mut self, arn: impl Into<String>) -> Self {
        self.integration_arn = Some(arn.into());
        self
    }

    #[must_use]
    pub fn with_enable_logs(mut self, enabled: bool) -> Self {
        self.enable_logs = enabled;
        self
    }

    #[must_use]
    pub fn with_memory_size(mut self, mib: u32) -> Self {
        self.memory_size = mib;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout = secs;
        self
    }

    #[must_use]
    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }

    #[must_use]
    pub fn with_license_key_secret(mut self, enabled: bool) -> Self {
        self.enable_license_key_secret = enabled;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    #[must_use]
    pub fn with_permissions_check(mut self, enabled: bool) -> Self {
        self.permissions_check = enabled;
        self
    }

    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_session(mut self, session: CloudSession) -> Self {
        self.session = session;
        self
    }
}

/// Parameters for updating an installed integration
///
/// `None` fields leave the deployed value untouched.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub enable_logs: Option<bool>,
    pub memory_size: Option<u32>,
    pub timeout: Option<u32>,
    pub role_name: Option<String>,
    /// Keep the license key secret installed; `false` removes it
    pub enable_license_key_secret: bool,
    pub tags: Vec<Tag>,
    pub permissions_check: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enable_logs: None,
            memory_size: None,
            timeout: None,
            role_name: None,
            enable_license_key_secret: true,
            tags: Vec::new(),
            permissions_check: false,
        }
    }
}

impl UpdateConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_enable_logs(mut self, enabled: bool) -> Self {
        self.enable_logs = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_memory_size(mut self, mib: u32) -> Self {
        self.memory_size = Some(mib);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout = Some(secs);
        self
    }

    #[must_use]
    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }

    #[must_use]
    pub fn with_license_key_secret(mut self, enabled: bool) -> Self {
        self.enable_license_key_secret = enabled;
        self
    }

    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    #[must_use]
    pub fn with_permissions_check(mut self, enabled: bool) -> Self {
        self.permissions_check = enabled;
        self
    }
}

/// Parameters for removing the integration
#[derive(Debug, Clone, Default)]
pub struct UninstallConfig {
    /// New Relic account whose integration role should be removed
    pub nr_account_id: Option<u64>,
    /// Skip every confirmation
    pub force: bool,
    pub permissions_check: bool,
}

impl UninstallConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_nr_account_id(mut self, id: u64) -> Self {
        self.nr_account_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_permissions_check(mut self, enabled: bool) -> Self {
        self.permissions_check = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_defaults() {
        let config = InstallConfig::new(42);
        assert_eq!(config.memory_size, 128);
        assert_eq!(config.timeout, 30);
        assert!(!config.enable_logs);
        assert!(config.enable_license_key_secret);
        assert!(config.linked_account_name.is_none());
    }

    #[test]
    fn test_update_defaults_keep_deployed_values() {
        let config = UpdateConfig::new();
        assert!(config.enable_logs.is_none());
        assert!(config.memory_size.is_none());
        assert!(config.timeout.is_none());
        assert!(config.enable_license_key_secret);
    }

    #[test]
    fn test_tags_accumulate() {
        let config = UpdateConfig::new()
            .with_tag("env", "prod")
            .with_tags(vec![Tag::new("team", "sre")]);
        assert_eq!(
            config.tags,
            vec![Tag::new("env", "prod"), Tag::new("team", "sre")]
        );
    }
}

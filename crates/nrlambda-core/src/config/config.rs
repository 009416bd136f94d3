//! Configuration management for nrlambda
//!
//! Handles configuration loading from files and environment variable expansion.
//! Configuration is stored in TOML format with support for multiple named profiles.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{ConfigError, Result};
use crate::platform::NewRelicRegion;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is selected explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// Individual profile configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    /// New Relic account id
    pub nr_account_id: u64,
    /// New Relic user API key (`NRAK-...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nr_api_key: Option<String>,
    #[serde(default)]
    pub nr_region: NewRelicRegion,
    /// Named AWS profile used when `--aws-profile` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,
    /// AWS region used when `--aws-region` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
}

impl Profile {
    pub fn new(nr_account_id: u64) -> Self {
        Self {
            nr_account_id,
            nr_api_key: None,
            nr_region: NewRelicRegion::default(),
            aws_profile: None,
            aws_region: None,
        }
    }

    /// API key with everything but the last four characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.nr_api_key.as_deref().map(mask)
    }
}

fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

impl Config {
    /// Name of the profile to use.
    ///
    /// Resolution order: explicit name, `default_profile`, then the first
    /// profile alphabetically. `None` when no profile applies.
    pub fn resolve_profile_name(&self, explicit_profile: Option<&str>) -> Option<String> {
        if let Some(name) = explicit_profile {
            return Some(name.to_string());
        }
        if let Some(default) = &self.default_profile {
            return Some(default.clone());
        }
        self.list_profiles()
            .first()
            .map(|(name, _)| name.to_string())
    }

    /// Look up a profile by name
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })
    }

    /// Profile selected by [`Config::resolve_profile_name`], if any.
    ///
    /// An explicit name that does not exist is an error; an empty config is not.
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<Option<&Profile>> {
        match self.resolve_profile_name(explicit_profile) {
            Some(name) => self.profile(&name).map(Some),
            None => Ok(None),
        }
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/nrlambda/config.toml` is preferred when it (or its
    /// directory) exists, falling back to the platform location.
    ///
    /// On Linux: ~/.config/nrlambda/config.toml
    /// On Windows: %APPDATA%\newrelic\nrlambda\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("nrlambda")
                    .join("config.toml");

                if linux_style_path.exists()
                    || linux_style_path.parent().is_some_and(|p| p.exists())
                {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "newrelic", "nrlambda").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default}. Unset variables are left as-is so
    /// profiles that are not in use never fail to load.
    ///
    /// ```toml
    /// nr_api_key = "${NEW_RELIC_API_KEY}"
    /// aws_region = "${AWS_DEFAULT_REGION:-us-east-1}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut config = Config::default();
        let mut prod = Profile::new(1234567);
        prod.nr_api_key = Some("NRAK-PRODKEY1234".to_string());
        prod.nr_region = NewRelicRegion::Eu;
        prod.aws_profile = Some("prod".to_string());
        config.set_profile("prod".to_string(), prod);
        config.set_profile("dev".to_string(), Profile::new(7654321));
        config
    }

    #[test]
    fn test_config_serialization() {
        let mut config = sample();
        config.default_profile = Some("prod".to_string());

        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.default_profile.as_deref(), Some("prod"));
        assert_eq!(deserialized.profiles, config.profiles);
        assert!(serialized.contains("nr_region = \"eu\""));
    }

    #[test]
    fn test_profile_resolution_order() {
        let mut config = sample();
        assert_eq!(
            config.resolve_profile_name(Some("prod")).as_deref(),
            Some("prod")
        );
        // first alphabetically without a default
        assert_eq!(config.resolve_profile_name(None).as_deref(), Some("dev"));

        config.default_profile = Some("prod".to_string());
        assert_eq!(config.resolve_profile_name(None).as_deref(), Some("prod"));
    }

    #[test]
    fn test_resolve_missing_profile_errors() {
        let config = sample();
        let err = config.resolve_profile(Some("staging")).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound { .. }));
        assert!(Config::default().resolve_profile(None).unwrap().is_none());
    }

    #[test]
    fn test_remove_default_profile_clears_default() {
        let mut config = sample();
        config.default_profile = Some("prod".to_string());
        assert!(config.remove_profile("prod").is_some());
        assert!(config.default_profile.is_none());
        assert!(config.remove_profile("prod").is_none());
    }

    #[test]
    fn test_masked_api_key() {
        let config = sample();
        assert_eq!(
            config.profiles["prod"].masked_api_key().as_deref(),
            Some("****1234")
        );
        assert_eq!(config.profiles["dev"].masked_api_key(), None);
        assert_eq!(mask("abc"), "****");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("NRLAMBDA_TEST_API_KEY", "NRAK-FROMENV");
        }

        let content = r#"
[profiles.env]
nr_account_id = 42
nr_api_key = "${NRLAMBDA_TEST_API_KEY}"
aws_region = "${NRLAMBDA_TEST_UNSET_REGION:-eu-central-1}"
"#;
        let expanded = Config::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded).unwrap();
        let profile = &config.profiles["env"];

        assert_eq!(profile.nr_api_key.as_deref(), Some("NRAK-FROMENV"));
        assert_eq!(profile.aws_region.as_deref(), Some("eu-central-1"));
        assert_eq!(profile.nr_region, NewRelicRegion::Us);

        unsafe {
            std::env::remove_var("NRLAMBDA_TEST_API_KEY");
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_unset_env_var_left_as_is() {
        let content = r#"nr_api_key = "${NRLAMBDA_TEST_DEFINITELY_UNSET}""#;
        assert_eq!(Config::expand_env_vars(content), content);
    }
}

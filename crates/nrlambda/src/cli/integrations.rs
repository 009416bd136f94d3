//! Integration lifecycle command definitions

use clap::{Args, Subcommand};
use nrlambda_core::platform::NewRelicRegion;
use nrlambda_core::resources::Tag;
use nrlambda_core::workflows::{DEFAULT_MEMORY_SIZE, DEFAULT_TIMEOUT};

/// Integration lifecycle commands
#[derive(Subcommand, Debug)]
pub enum IntegrationsCommands {
    /// Link an AWS account to New Relic and deploy the integration resources
    #[command(after_help = "EXAMPLES:
    nrlambda integrations install --nr-account-id 1234567 --nr-api-key NRAK-XXXX
    nrlambda integrations install --enable-logs --memory-size 256 --tag team platform
    nrlambda integrations install --integration-arn arn:aws:iam::123456789012:role/existing
")]
    Install(InstallArgs),

    /// Remove the integration resources from an AWS account
    #[command(after_help = "EXAMPLES:
    nrlambda integrations uninstall
    nrlambda integrations uninstall --nr-account-id 1234567 --force
")]
    Uninstall(UninstallArgs),

    /// Reconfigure the log ingestion function and license key secret
    #[command(after_help = "EXAMPLES:
    nrlambda integrations update --enable-logs
    nrlambda integrations update --timeout 60 --disable-license-key-secret
")]
    Update(UpdateArgs),
}

/// AWS session flags shared by all lifecycle commands
#[derive(Args, Debug, Clone, Default)]
pub struct AwsArgs {
    /// AWS profile
    #[arg(long, short = 'p', env = "AWS_PROFILE")]
    pub aws_profile: Option<String>,

    /// AWS region
    #[arg(long, short = 'r', env = "AWS_DEFAULT_REGION")]
    pub aws_region: Option<String>,

    /// Check required AWS permissions before making changes
    #[arg(long)]
    pub aws_permissions_check: bool,
}

/// New Relic account flags
#[derive(Args, Debug, Clone, Default)]
pub struct NewRelicArgs {
    /// New Relic account id
    #[arg(long, short = 'a', env = "NEW_RELIC_ACCOUNT_ID")]
    pub nr_account_id: Option<u64>,

    /// New Relic user API key
    #[arg(long, short = 'k', env = "NEW_RELIC_API_KEY", hide_env_values = true)]
    pub nr_api_key: Option<String>,

    /// New Relic region
    #[arg(long, value_enum, env = "NEW_RELIC_REGION")]
    pub nr_region: Option<NewRelicRegion>,
}

/// Arguments for `integrations install`
#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub aws: AwsArgs,

    #[command(flatten)]
    pub newrelic: NewRelicArgs,

    /// Alternative AWS role policy ARN for the integration role
    #[arg(long)]
    pub aws_role_policy: Option<String>,

    /// Enable log forwarding to New Relic Logs
    #[arg(long, short = 'e')]
    pub enable_logs: bool,

    /// Memory size (MiB) for the log ingestion function
    #[arg(long, short = 'm', default_value_t = DEFAULT_MEMORY_SIZE)]
    pub memory_size: u32,

    /// Name of the linked account on the New Relic side
    #[arg(long, short = 'n')]
    pub linked_account_name: Option<String>,

    /// Timeout (seconds) for the log ingestion function
    #[arg(long, short = 't', default_value_t = DEFAULT_TIMEOUT)]
    pub timeout: u32,

    /// Pre-created execution role for the log ingestion function
    #[arg(long)]
    pub role_name: Option<String>,

    #[command(flatten)]
    pub secret: SecretToggle,

    /// ARN of an existing integration role; no role is created
    #[arg(long)]
    pub integration_arn: Option<String>,

    #[command(flatten)]
    pub tags: TagArgs,
}

/// Arguments for `integrations uninstall`
#[derive(Args, Debug)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub aws: AwsArgs,

    /// New Relic account id whose integration role should be removed
    /// (defaults to the selected profile's account id)
    #[arg(long, short = 'a', env = "NEW_RELIC_ACCOUNT_ID")]
    pub nr_account_id: Option<u64>,

    /// Skip all confirmation prompts
    #[arg(long, short = 'f')]
    pub force: bool,
}

/// Arguments for `integrations update`
#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub aws: AwsArgs,

    /// Enable log forwarding to New Relic Logs
    #[arg(long, overrides_with = "disable_logs")]
    pub enable_logs: bool,

    /// Disable log forwarding to New Relic Logs
    #[arg(long, overrides_with = "enable_logs")]
    pub disable_logs: bool,

    /// Memory size (MiB) for the log ingestion function
    #[arg(long, short = 'm')]
    pub memory_size: Option<u32>,

    /// Timeout (seconds) for the log ingestion function
    #[arg(long, short = 't')]
    pub timeout: Option<u32>,

    /// Pre-created execution role for the log ingestion function
    #[arg(long)]
    pub role_name: Option<String>,

    #[command(flatten)]
    pub secret: SecretToggle,

    #[command(flatten)]
    pub tags: TagArgs,
}

impl UpdateArgs {
    /// `None` when neither flag was given
    pub fn enable_logs(&self) -> Option<bool> {
        if self.enable_logs {
            Some(true)
        } else if self.disable_logs {
            Some(false)
        } else {
            None
        }
    }
}

/// `--enable-license-key-secret` / `--disable-license-key-secret`, last one wins
#[derive(Args, Debug, Clone, Default)]
pub struct SecretToggle {
    /// Create a managed secret for the New Relic license key (default)
    #[arg(long, overrides_with = "disable_license_key_secret")]
    pub enable_license_key_secret: bool,

    /// Do not create a managed secret for the New Relic license key
    #[arg(long, overrides_with = "enable_license_key_secret")]
    pub disable_license_key_secret: bool,
}

impl SecretToggle {
    pub fn enabled(&self) -> bool {
        !self.disable_license_key_secret
    }
}

/// Repeatable `--tag KEY VALUE`
#[derive(Args, Debug, Clone, Default)]
pub struct TagArgs {
    /// Tag to add to created resources (repeatable)
    #[arg(
        long = "tag",
        num_args = 2,
        value_names = ["KEY", "VALUE"],
        action = clap::ArgAction::Append
    )]
    pub tag: Vec<String>,
}

impl TagArgs {
    pub fn to_tags(&self) -> Vec<Tag> {
        self.tag
            .chunks_exact(2)
            .map(|pair| Tag::new(pair[0].as_str(), pair[1].as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn install_args(cli: Cli) -> InstallArgs {
        match cli.command {
            Commands::Integrations(IntegrationsCommands::Install(args)) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn update_args(cli: Cli) -> UpdateArgs {
        match cli.command {
            Commands::Integrations(IntegrationsCommands::Update(args)) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_install_defaults() {
        let args = install_args(parse(&["nrlambda", "integrations", "install"]));
        assert_eq!(args.memory_size, DEFAULT_MEMORY_SIZE);
        assert_eq!(args.timeout, DEFAULT_TIMEOUT);
        assert!(!args.enable_logs);
        assert!(args.secret.enabled());
        assert!(args.tags.to_tags().is_empty());
    }

    #[test]
    #[serial_test::serial]
    fn test_repeated_tags_pair_up() {
        let args = install_args(parse(&[
            "nrlambda",
            "integrations",
            "install",
            "--tag",
            "team",
            "platform",
            "--tag",
            "env",
            "prod",
        ]));
        assert_eq!(
            args.tags.to_tags(),
            vec![Tag::new("team", "platform"), Tag::new("env", "prod")]
        );
    }

    #[test]
    #[serial_test::serial]
    fn test_tag_requires_key_and_value() {
        let result = Cli::try_parse_from(["nrlambda", "integrations", "install", "--tag", "team"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_secret_toggle_last_wins() {
        let args = install_args(parse(&[
            "nrlambda",
            "integrations",
            "install",
            "--disable-license-key-secret",
        ]));
        assert!(!args.secret.enabled());

        let args = install_args(parse(&[
            "nrlambda",
            "integrations",
            "install",
            "--disable-license-key-secret",
            "--enable-license-key-secret",
        ]));
        assert!(args.secret.enabled());
    }

    #[test]
    #[serial_test::serial]
    fn test_update_logs_tri_state() {
        let args = update_args(parse(&["nrlambda", "integrations", "update"]));
        assert_eq!(args.enable_logs(), None);

        let args = update_args(parse(&["nrlambda", "integrations", "update", "--disable-logs"]));
        assert_eq!(args.enable_logs(), Some(false));

        let args = update_args(parse(&[
            "nrlambda",
            "integrations",
            "update",
            "--disable-logs",
            "--enable-logs",
        ]));
        assert_eq!(args.enable_logs(), Some(true));
    }

    #[test]
    #[serial_test::serial]
    fn test_short_flags() {
        let args = install_args(parse(&[
            "nrlambda", "int", "install", "-a", "1234567", "-k", "NRAK-1", "-p", "dev", "-r",
            "eu-west-1", "-e", "-m", "256", "-t", "60", "-n", "prod",
        ]));
        assert_eq!(args.newrelic.nr_account_id, Some(1234567));
        assert_eq!(args.newrelic.nr_api_key.as_deref(), Some("NRAK-1"));
        assert_eq!(args.aws.aws_profile.as_deref(), Some("dev"));
        assert_eq!(args.aws.aws_region.as_deref(), Some("eu-west-1"));
        assert!(args.enable_logs);
        assert_eq!(args.memory_size, 256);
        assert_eq!(args.timeout, 60);
        assert_eq!(args.linked_account_name.as_deref(), Some("prod"));
    }

    #[test]
    #[serial_test::serial]
    fn test_environment_fills_credentials() {
        unsafe {
            std::env::set_var("NEW_RELIC_ACCOUNT_ID", "2345678");
            std::env::set_var("NEW_RELIC_REGION", "eu");
            std::env::set_var("AWS_DEFAULT_REGION", "ap-southeast-2");
        }

        let from_env = install_args(parse(&["nrlambda", "integrations", "install"]));
        let from_flags = install_args(parse(&[
            "nrlambda",
            "integrations",
            "install",
            "--nr-account-id",
            "1234567",
            "--nr-region",
            "us",
        ]));

        unsafe {
            std::env::remove_var("NEW_RELIC_ACCOUNT_ID");
            std::env::remove_var("NEW_RELIC_REGION");
            std::env::remove_var("AWS_DEFAULT_REGION");
        }

        assert_eq!(from_env.newrelic.nr_account_id, Some(2345678));
        assert_eq!(from_env.newrelic.nr_region, Some(NewRelicRegion::Eu));
        assert_eq!(from_env.aws.aws_region.as_deref(), Some("ap-southeast-2"));
        assert_eq!(from_flags.newrelic.nr_account_id, Some(1234567));
        assert_eq!(from_flags.newrelic.nr_region, Some(NewRelicRegion::Us));
    }
}

//! CLI structure and command definitions
//!
//! Two command groups sit under the binary:
//! 1. `integrations` - install, update and uninstall the AWS Lambda integration
//! 2. `profile` - manage stored New Relic / AWS defaults

use clap::{Parser, Subcommand};
use nrlambda_core::platform::NewRelicRegion;

pub mod integrations;

pub use integrations::*;

/// Manage the New Relic AWS Lambda integration
#[derive(Parser, Debug)]
#[command(name = "nrlambda")]
#[command(
    version,
    about = "Install, update and remove the New Relic AWS Lambda integration"
)]
#[command(long_about = "
Install, update and remove the New Relic AWS Lambda integration

The integration consists of an IAM role New Relic assumes to read Lambda
metrics, a managed secret holding the account license key, the
newrelic-log-ingestion function and the linked account on the New Relic side.

EXAMPLES:
    # Store New Relic credentials once
    nrlambda profile set prod --nr-account-id 1234567 --nr-api-key NRAK-XXXX

    # Install everything, including log forwarding
    nrlambda integrations install --enable-logs

    # Change the log ingestion function later
    nrlambda integrations update --memory-size 256 --disable-logs

    # Remove it all without prompts
    nrlambda integrations uninstall --nr-account-id 1234567 --force

    # Machine-readable step report
    nrlambda integrations install -o json

For more help on a specific command, run:
    nrlambda <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, global = true, env = "NRLAMBDA_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "NRLAMBDA_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and summary lines
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install, update or remove the Lambda integration
    #[command(subcommand, visible_alias = "int")]
    Integrations(IntegrationsCommands),

    /// Profile management
    #[command(subcommand, visible_aliases = ["prof", "pr"])]
    Profile(ProfileCommands),

    /// Show version information
    #[command(visible_aliases = ["ver", "v"])]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    #[command(after_help = "EXAMPLES:
    # Bash
    nrlambda completions bash > ~/.local/share/bash-completion/completions/nrlambda

    # Zsh
    nrlambda completions zsh > \"${fpath[1]}/_nrlambda\"

    # Fish
    nrlambda completions fish > ~/.config/fish/completions/nrlambda.fish
")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Shell types for completions
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    Elvish,
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "get")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Create or update a profile
    #[command(visible_alias = "add")]
    #[command(after_help = "EXAMPLES:
    nrlambda profile set prod --nr-account-id 1234567 --nr-api-key NRAK-XXXX
    nrlambda profile set eu --nr-account-id 7654321 --nr-region eu --aws-profile eu-admin

    # Keep the key out of the file, expanded when the config is loaded
    nrlambda profile set ci --nr-account-id 1234567 --nr-api-key '${NEW_RELIC_API_KEY}'
")]
    Set {
        /// Profile name
        name: String,

        /// New Relic account id
        #[arg(long)]
        nr_account_id: u64,

        /// New Relic user API key
        #[arg(long)]
        nr_api_key: Option<String>,

        /// New Relic region
        #[arg(long, value_enum, default_value = "us")]
        nr_region: NewRelicRegion,

        /// AWS profile to use by default
        #[arg(long)]
        aws_profile: Option<String>,

        /// AWS region to use by default
        #[arg(long)]
        aws_region: Option<String>,
    },

    /// Remove a profile
    #[command(visible_aliases = ["rm", "del", "delete"])]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    #[command(visible_alias = "def")]
    Default {
        /// Profile name to make default
        name: String,
    },
}

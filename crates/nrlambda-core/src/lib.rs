//! # nrlambda-core
//!
//! Lifecycle workflows for the New Relic AWS Lambda integration: install,
//! update and uninstall of the integration role, the license key managed
//! secret, the log ingestion function and the New Relic linked account.
//!
//! ## Layers
//!
//! - [`aws`] - AWS access through the `aws` command line ([`aws::AwsApi`])
//! - [`platform`] - New Relic access through NerdGraph ([`platform::PlatformApi`])
//! - [`resources`] - single-purpose AWS operations ([`resources::CloudResources`])
//! - [`workflows`] - the ordered, best-effort lifecycle sequences
//! - [`report`] - per-step outcomes folded into an overall result
//! - [`confirm`] / [`progress`] - capabilities injected by the caller
//! - [`config`] - profiles persisted in a TOML file
//!
//! Workflows never print or prompt on their own. A caller supplies a
//! [`confirm::Confirm`] implementation and an optional progress callback,
//! and renders the returned [`report::WorkflowReport`].
//!
//! ```rust,ignore
//! use nrlambda_core::aws::{AwsCli, CloudSession};
//! use nrlambda_core::platform::{NerdGraphClient, NewRelicAccount, NewRelicRegion};
//! use nrlambda_core::resources::StackResources;
//! use nrlambda_core::workflows::{InstallConfig, install};
//!
//! let (aws, _identity) = AwsCli::connect(CloudSession::default()).await?;
//! let cloud = StackResources::new(aws);
//! let nerdgraph = NerdGraphClient::new(NewRelicAccount::new(
//!     1234567,
//!     api_key,
//!     NewRelicRegion::Us,
//! ))?;
//!
//! let report = install(&cloud, &nerdgraph, &InstallConfig::new(1234567), None).await?;
//! println!("{}", report.summary());
//! ```

pub mod aws;
pub mod config;
pub mod confirm;
pub mod error;
pub mod permissions;
pub mod platform;
pub mod progress;
pub mod report;
pub mod resources;
pub mod workflows;

pub use confirm::{AlwaysApprove, AlwaysDecline, Confirm};
pub use error::{CoreError, Result};
pub use progress::{ProgressCallback, WorkflowEvent};
pub use report::{Step, StepOutcome, StepRecord, WorkflowKind, WorkflowReport};

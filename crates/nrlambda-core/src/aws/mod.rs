//! AWS access
//!
//! All AWS traffic goes through the [`AwsApi`] trait: one call per AWS API
//! operation, JSON in and out. [`AwsCli`] implements it by driving the `aws`
//! command line with the profile and region of a [`CloudSession`].

pub mod cli;

pub use cli::AwsCli;

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

/// Scope for all AWS operations of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CloudSession {
    /// Named profile from the AWS shared config, `None` for the default chain
    pub profile: Option<String>,
    /// Region override, `None` for the profile's region
    pub region: Option<String>,
}

impl CloudSession {
    pub fn new(profile: Option<String>, region: Option<String>) -> Self {
        Self { profile, region }
    }
}

/// Low-level AWS API access
#[async_trait]
pub trait AwsApi: Send + Sync {
    /// Invoke `service operation args...` and return the parsed JSON response.
    ///
    /// Operations that print nothing on success (waiters, deletes) return
    /// `Value::Null`.
    async fn call(&self, service: &str, operation: &str, args: &[String]) -> Result<Value>;

    /// Like [`AwsApi::call`], but a response indicating the target does not
    /// exist yields `Ok(None)` instead of an error.
    async fn try_call(
        &self,
        service: &str,
        operation: &str,
        args: &[String],
    ) -> Result<Option<Value>>;
}

/// Error fragments the AWS CLI prints for missing resources
pub(crate) const NOT_FOUND_MARKERS: &[&str] = &[
    "does not exist",
    "ResourceNotFoundException",
    "NoSuchEntity",
    "not found",
];

pub(crate) fn is_not_found(message: &str) -> bool {
    NOT_FOUND_MARKERS.iter().any(|m| message.contains(m))
}

/// Error fragments meaning the session itself is unusable
const TRANSPORT_MARKERS: &[&str] = &[
    "Unable to locate credentials",
    "could not be found",
    "Could not connect to the endpoint URL",
    "ExpiredToken",
    "InvalidClientTokenId",
    "Connect timeout",
];

/// True when an AWS CLI failure says nothing about the resource and
/// everything about the session or network
pub(crate) fn is_transport_failure(message: &str) -> bool {
    TRANSPORT_MARKERS.iter().any(|m| message.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(is_not_found(
            "An error occurred (ValidationError) when calling the DescribeStacks operation: \
             Stack with id NewRelicLogIngestion does not exist"
        ));
        assert!(is_not_found(
            "An error occurred (ResourceNotFoundException) when calling the GetFunction operation"
        ));
        assert!(!is_not_found(
            "An error occurred (AccessDenied) when calling the CreateStack operation"
        ));
    }

    #[test]
    fn test_transport_failure_detection() {
        assert!(is_transport_failure(
            "Unable to locate credentials. You can configure credentials by running \"aws configure\"."
        ));
        assert!(is_transport_failure(
            "The config profile (missing) could not be found"
        ));
        assert!(!is_transport_failure(
            "An error occurred (AlreadyExistsException) when calling the CreateStack operation"
        ));
    }
}

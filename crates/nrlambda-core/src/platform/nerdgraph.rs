//! NerdGraph (New Relic GraphQL API) client

use super::queries;
use super::{LinkedAccount, NewRelicAccount, PlatformApi};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, info, trace, warn};

const USER_AGENT: &str = concat!("nrlambda/", env!("CARGO_PKG_VERSION"));

/// [`PlatformApi`] over NerdGraph
#[derive(Debug, Clone)]
pub struct NerdGraphClient {
    account: NewRelicAccount,
    endpoint: url::Url,
    http: reqwest::Client,
}

impl NerdGraphClient {
    /// Client for the account's regional endpoint
    pub fn new(account: NewRelicAccount) -> Result<Self> {
        let endpoint = account.region.endpoint();
        Self::with_base_url(account, endpoint)
    }

    /// Client against an explicit GraphQL endpoint
    pub fn with_base_url(account: NewRelicAccount, endpoint: &str) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| CoreError::Config(format!("invalid NerdGraph URL '{}': {}", endpoint, e)))?;
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            account,
            endpoint,
            http,
        })
    }

    pub fn account(&self) -> &NewRelicAccount {
        &self.account
    }

    /// POST a document and return the whole response body (`data` and `errors`)
    async fn execute(&self, document: &str, variables: Value) -> Result<Value> {
        trace!("POST {}", self.endpoint);
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("API-Key", &self.account.api_key)
            .json(&json!({ "query": document, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CoreError::AuthenticationFailed {
                message: format!("NerdGraph rejected the API key (HTTP {})", status.as_u16()),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::GraphQl(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        Ok(response.json().await?)
    }

    /// Run a query whose errors are fatal, returning `data`
    async fn query(&self, document: &str, variables: Value) -> Result<Value> {
        let body = self.execute(document, variables).await?;
        if let Some(message) = error_messages(&body) {
            return Err(CoreError::GraphQl(message));
        }
        Ok(body["data"].clone())
    }

    /// Run a lookup inside a step; GraphQL errors are logged and yield `None`
    async fn lookup(&self, document: &str, variables: Value, what: &str) -> Result<Option<Value>> {
        let body = self.execute(document, variables).await?;
        if let Some(message) = error_messages(&body) {
            warn!("Looking up {} failed: {}", what, message);
            return Ok(None);
        }
        Ok(Some(body["data"].clone()))
    }

    fn account_variable(&self) -> Value {
        json!({ "accountId": self.account.account_id })
    }

    async fn lambda_enabled(&self, linked_account_id: u64) -> Result<Option<bool>> {
        let Some(data) = self
            .lookup(
                queries::LINKED_ACCOUNT_INTEGRATIONS,
                json!({
                    "accountId": self.account.account_id,
                    "linkedAccountId": linked_account_id,
                }),
                "linked account integrations",
            )
            .await?
        else {
            return Ok(None);
        };
        let integrations = &data["actor"]["account"]["cloud"]["linkedAccount"]["integrations"];
        Ok(Some(integrations.as_array().is_some_and(|list| {
            list.iter().any(|i| i["service"]["slug"] == "lambda")
        })))
    }
}

fn linked_account_named(data: &Value, name: &str) -> Result<Option<LinkedAccount>> {
    let Some(accounts) = data["actor"]["account"]["cloud"]["linkedAccounts"].as_array() else {
        return Ok(None);
    };
    match accounts.iter().find(|a| a["name"] == name) {
        Some(found) => Ok(Some(serde_json::from_value(found.clone())?)),
        None => Ok(None),
    }
}

/// Joined `message` fields of a GraphQL `errors` array, if any
fn error_messages(node: &Value) -> Option<String> {
    let errors = node["errors"].as_array().filter(|e| !e.is_empty())?;
    Some(
        errors
            .iter()
            .map(|e| e["message"].as_str().unwrap_or("unknown error"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

#[async_trait]
impl PlatformApi for NerdGraphClient {
    async fn validate_credentials(&self) -> Result<()> {
        let body = self.execute(queries::CURRENT_USER, json!({})).await?;
        if let Some(message) = error_messages(&body) {
            return Err(CoreError::AuthenticationFailed { message });
        }
        if body["data"]["actor"]["user"].is_null() {
            return Err(CoreError::AuthenticationFailed {
                message: "API key is not associated with a user".to_string(),
            });
        }
        debug!(
            "New Relic credentials accepted for account {}",
            self.account.account_id
        );
        Ok(())
    }

    async fn license_key(&self) -> Result<String> {
        let data = self
            .query(queries::LICENSE_KEY, self.account_variable())
            .await?;
        data["actor"]["account"]["licenseKey"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| {
                CoreError::GraphQl(format!(
                    "no license key available for account {}",
                    self.account.account_id
                ))
            })
    }

    async fn find_linked_account(&self, name: &str) -> Result<Option<LinkedAccount>> {
        let data = self
            .query(queries::LINKED_ACCOUNTS, self.account_variable())
            .await?;
        linked_account_named(&data, name)
    }

    async fn link_account(&self, role_arn: &str, name: &str) -> Result<bool> {
        let body = self
            .execute(
                queries::LINK_ACCOUNT,
                json!({
                    "accountId": self.account.account_id,
                    "accounts": { "aws": [{ "arn": role_arn, "name": name }] },
                }),
            )
            .await?;
        let payload = &body["data"]["cloudLinkAccount"];
        if let Some(message) = error_messages(&body).or_else(|| error_messages(payload)) {
            warn!("Linking account '{}' failed: {}", name, message);
            return Ok(false);
        }
        let linked = payload["linkedAccounts"]
            .as_array()
            .is_some_and(|list| !list.is_empty());
        if linked {
            info!("Linked AWS account as '{}'", name);
        } else {
            warn!("NerdGraph returned no linked account for '{}'", name);
        }
        Ok(linked)
    }

    async fn enable_lambda_integration(&self, name: &str) -> Result<bool> {
        let Some(data) = self
            .lookup(queries::LINKED_ACCOUNTS, self.account_variable(), "linked accounts")
            .await?
        else {
            return Ok(false);
        };
        let Some(linked) = linked_account_named(&data, name)? else {
            warn!("Linked account '{}' not found in New Relic", name);
            return Ok(false);
        };
        match self.lambda_enabled(linked.id).await? {
            Some(true) => {
                info!("Lambda integration already enabled on '{}'", name);
                return Ok(true);
            }
            Some(false) => {}
            None => return Ok(false),
        }

        let body = self
            .execute(
                queries::ENABLE_LAMBDA,
                json!({
                    "accountId": self.account.account_id,
                    "integrations": { "aws": { "lambda": [{ "linkedAccountId": linked.id }] } },
                }),
            )
            .await?;
        let payload = &body["data"]["cloudConfigureIntegration"];
        if let Some(message) = error_messages(&body).or_else(|| error_messages(payload)) {
            warn!("Enabling the Lambda integration failed: {}", message);
            return Ok(false);
        }
        Ok(payload["integrations"]
            .as_array()
            .is_some_and(|list| !list.is_empty()))
    }
}

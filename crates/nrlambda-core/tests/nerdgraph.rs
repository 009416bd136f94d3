//! NerdGraph client against a mock server

use nrlambda_core::CoreError;
use nrlambda_core::platform::{NerdGraphClient, NewRelicAccount, NewRelicRegion, PlatformApi};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> NerdGraphClient {
    let account = NewRelicAccount::new(2345678, "NRAK-TEST", NewRelicRegion::Us);
    NerdGraphClient::with_base_url(account, &format!("{}/graphql", server.uri())).unwrap()
}

fn linked_accounts() -> serde_json::Value {
    json!({
        "data": { "actor": { "account": { "cloud": { "linkedAccounts": [
            { "id": 11, "name": "staging", "externalId": "111111111111", "nrAccountId": 2345678 },
            { "id": 12, "name": "prod", "externalId": "123456789012", "nrAccountId": 2345678 }
        ] } } } }
    })
}

#[tokio::test]
async fn test_validate_credentials_sends_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("API-Key", "NRAK-TEST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "actor": { "user": { "id": 1, "email": "dev@example.com" } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).await.validate_credentials().await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_is_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .validate_credentials()
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert!(err.is_precondition());
}

#[tokio::test]
async fn test_graphql_errors_fail_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Invalid API key" }]
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .validate_credentials()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid API key"));
}

#[tokio::test]
async fn test_license_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("licenseKey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "actor": { "account": { "licenseKey": "abc123NRAL" } } }
        })))
        .mount(&server)
        .await;

    let key = client(&server).await.license_key().await.unwrap();
    assert_eq!(key, "abc123NRAL");
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).await.license_key().await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_find_linked_account_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("linkedAccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(linked_accounts()))
        .mount(&server)
        .await;
    let nerdgraph = client(&server).await;

    let found = nerdgraph.find_linked_account("prod").await.unwrap().unwrap();
    assert_eq!(found.id, 12);
    assert_eq!(found.external_id, "123456789012");

    assert!(nerdgraph.find_linked_account("qa").await.unwrap().is_none());
}

#[tokio::test]
async fn test_link_account_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("cloudLinkAccount"))
        .and(body_string_contains("NewRelicLambdaIntegrationRole_2345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cloudLinkAccount": {
                "linkedAccounts": [{ "id": 13, "name": "prod" }],
                "errors": []
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .link_account(
            "arn:aws:iam::123456789012:role/NewRelicLambdaIntegrationRole_2345678",
            "prod",
        )
        .await
        .unwrap();
    assert!(ok);
}

#[tokio::test]
async fn test_link_account_mutation_errors_are_step_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cloudLinkAccount": {
                "linkedAccounts": [],
                "errors": [{ "message": "role cannot be assumed" }]
            } }
        })))
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .link_account("arn:aws:iam::1:role/x", "prod")
        .await
        .unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn test_enable_lambda_already_enabled_is_noop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("linkedAccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(linked_accounts()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("integrations {"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "actor": { "account": { "cloud": { "linkedAccount": {
                "integrations": [{ "id": 5, "name": "Lambda", "service": { "slug": "lambda", "isEnabled": true } }]
            } } } } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("cloudConfigureIntegration"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .enable_lambda_integration("prod")
        .await
        .unwrap();
    assert!(ok);
}

#[tokio::test]
async fn test_enable_lambda_configures_integration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("linkedAccounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(linked_accounts()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("cloudConfigureIntegration"))
        .and(body_string_contains("\"linkedAccountId\":12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cloudConfigureIntegration": {
                "integrations": [{ "id": 6, "name": "Lambda", "service": { "id": 1, "slug": "lambda" } }],
                "errors": []
            } }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("integrations {"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "actor": { "account": { "cloud": { "linkedAccount": {
                "integrations": []
            } } } } }
        })))
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .enable_lambda_integration("prod")
        .await
        .unwrap();
    assert!(ok);
}

#[tokio::test]
async fn test_enable_lambda_without_link_fails_step() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(linked_accounts()))
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .enable_lambda_integration("missing")
        .await
        .unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn test_enable_lambda_lookup_errors_fail_step() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Access denied to linked accounts" }]
        })))
        .mount(&server)
        .await;

    let ok = client(&server)
        .await
        .enable_lambda_integration("prod")
        .await
        .unwrap();
    assert!(!ok);
}

#[tokio::test]
async fn test_enable_lambda_http_failure_still_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .enable_lambda_integration("prod")
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

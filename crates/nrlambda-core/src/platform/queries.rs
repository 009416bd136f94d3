//! NerdGraph documents used by the client

pub(super) const CURRENT_USER: &str = r#"
query {
  actor {
    user {
      id
      email
    }
  }
}
"#;

pub(super) const LICENSE_KEY: &str = r#"
query ($accountId: Int!) {
  actor {
    account(id: $accountId) {
      licenseKey
    }
  }
}
"#;

pub(super) const LINKED_ACCOUNTS: &str = r#"
query ($accountId: Int!) {
  actor {
    account(id: $accountId) {
      cloud {
        linkedAccounts(provider: "aws") {
          id
          name
          externalId
          nrAccountId
        }
      }
    }
  }
}
"#;

pub(super) const LINK_ACCOUNT: &str = r#"
mutation ($accountId: Int!, $accounts: CloudLinkCloudAccountsInput!) {
  cloudLinkAccount(accountId: $accountId, accounts: $accounts) {
    linkedAccounts {
      id
      name
    }
    errors {
      message
    }
  }
}
"#;

pub(super) const LINKED_ACCOUNT_INTEGRATIONS: &str = r#"
query ($accountId: Int!, $linkedAccountId: Int!) {
  actor {
    account(id: $accountId) {
      cloud {
        linkedAccount(id: $linkedAccountId) {
          integrations {
            id
            name
            service {
              slug
              isEnabled
            }
          }
        }
      }
    }
  }
}
"#;

pub(super) const ENABLE_LAMBDA: &str = r#"
mutation ($accountId: Int!, $integrations: CloudIntegrationsInput!) {
  cloudConfigureIntegration(accountId: $accountId, integrations: $integrations) {
    integrations {
      id
      name
      service {
        id
        slug
      }
    }
    errors {
      linkedAccountId
      message
    }
  }
}
"#;

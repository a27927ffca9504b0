//! Request and response shapes the client itself needs to understand.
//!
//! Everything else is passed through as `serde_json::Value`.

use serde::{Deserialize, Serialize};

use patch_api_client::AccountType;

/// Body of `POST /api/v3/account/auth-with-password`.
///
/// Managers sign in with an email address, viewers with a username.
#[derive(Debug, Clone, Serialize)]
pub struct AuthWithPassword {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthWithPassword {
    /// Build credentials, treating an account containing `@` as a manager email.
    pub fn for_account(account: &str, password: impl Into<String>) -> Self {
        let password = password.into();
        if account.contains('@') {
            Self {
                account_type: AccountType::Manager,
                password,
                email: Some(account.to_string()),
                username: None,
            }
        } else {
            Self {
                account_type: AccountType::Viewer,
                password,
                email: None,
                username: Some(account.to_string()),
            }
        }
    }
}

/// The fields of an auth response the client stores.
#[derive(Clone, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(rename = "type", default)]
    pub account_type: Option<String>,
}

impl AuthSession {
    /// The account type, if the server sent a known one.
    pub fn account_type(&self) -> Option<AccountType> {
        self.account_type.as_deref().and_then(|t| t.parse().ok())
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("account_type", &self.account_type)
            .finish()
    }
}

/// Query for `GET /api/v3/plants/{plant}/metrics/{source}/{unit}-{interval}`.
#[derive(Debug, Clone, Default)]
pub struct MetricsQuery {
    /// Day to read, e.g. `2024-05-01`.
    pub date: String,
    /// Only records before this timestamp.
    pub before: Option<i64>,
    /// Fields to return; empty means all.
    pub fields: Vec<String>,
}

impl MetricsQuery {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    pub fn before(mut self, before: i64) -> Self {
        self.before = Some(before);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }
}

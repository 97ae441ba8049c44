use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field name -> human readable validation message.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Disabled,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disabled => "disabled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(AccountStatus::Active),
            "disabled" => Some(AccountStatus::Disabled),
            _ => None,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable identity record. Every identity field is stored in normalized form.
#[derive(Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub email_lower: String,
    pub phone_e164: String,
    pub username_lower: String,
    pub password_hash: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

// The hash must never reach a log line.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email_lower", &self.email_lower)
            .field("phone_e164", &self.phone_e164)
            .field("username_lower", &self.username_lower)
            .field("password_hash", &"<redacted>")
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Candidate record handed to the store; the store assigns the identifier.
#[derive(Clone)]
pub struct NewAccount {
    pub email_lower: String,
    pub phone_e164: String,
    pub username_lower: String,
    pub password_hash: String,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn into_account(self, id: Uuid) -> Account {
        Account {
            id,
            email_lower: self.email_lower,
            phone_e164: self.phone_e164,
            username_lower: self.username_lower,
            password_hash: self.password_hash,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email_lower", &self.email_lower)
            .field("phone_e164", &self.phone_e164)
            .field("username_lower", &self.username_lower)
            .field("password_hash", &"<redacted>")
            .field("status", &self.status)
            .finish()
    }
}

/// Normalized login value, tagged with the identity field it is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(String),
    Phone(String),
    Username(String),
}

impl LoginIdentifier {
    pub fn value(&self) -> &str {
        match self {
            LoginIdentifier::Email(v) | LoginIdentifier::Phone(v) | LoginIdentifier::Username(v) => v,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            LoginIdentifier::Email(_) => "email",
            LoginIdentifier::Phone(_) => "phone",
            LoginIdentifier::Username(_) => "username",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub created_at: String,
    pub status: String,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        AccountProfile {
            id: account.id.to_string(),
            email: account.email_lower.clone(),
            phone: account.phone_e164.clone(),
            username: account.username_lower.clone(),
            created_at: account.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            status: account.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: AccountProfile,
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: AccountProfile,
}

/// Signed access token claims. Timestamps are seconds since the Unix epoch.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use akiba_config::IdentitySettings;
use akiba_database::{AccountStore, StoreError};
use akiba_models::{Account, AccountStatus, FieldErrors, LoginRequest, NewAccount, SignupRequest};
use akiba_observability::{record_auth_event, AuthEvent};
use chrono::Utc;
use uuid::Uuid;

use super::password::PasswordHasher;
use super::tokens::TokenService;
use super::validation::{validate_login, validate_signup};
use crate::errors::AuthError;

pub const CONFLICT_MESSAGE: &str = "email, phone, or username already exists";

const DUMMY_PASSWORD: &str = "akiba-timing-equalizer-1";

/// A persisted account together with a freshly issued access token.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub account: Account,
    pub token: String,
}

/// Signup, login and profile lookup over an injected account store.
pub struct IdentityService {
    accounts: Arc<dyn AccountStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    /// Digest verified on login paths that have no account to check, so
    /// unknown and disabled logins cost the same as a wrong password.
    dummy_digest: Option<String>,
    access_token_ttl: Duration,
    operation_timeout: Duration,
}

impl IdentityService {
    pub fn new(accounts: Arc<dyn AccountStore>, tokens: Arc<TokenService>, settings: &IdentitySettings) -> Self {
        let hasher = PasswordHasher::new(settings.bcrypt_cost);
        let dummy_digest = match hasher.hash(DUMMY_PASSWORD) {
            Ok(digest) => Some(digest),
            Err(e) => {
                tracing::warn!(error = %e, "Could not prepare login timing digest");
                None
            }
        };
        Self {
            accounts,
            tokens,
            hasher,
            dummy_digest,
            access_token_ttl: settings.access_token_ttl,
            operation_timeout: settings.operation_timeout,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResult, AuthError> {
        let normalized = validate_signup(&request).map_err(|fields| {
            record_auth_event(AuthEvent::SignupRejected, None, Some(&field_list(&fields)));
            AuthError::InvalidInput(fields)
        })?;

        let password_hash = self.hash_password(normalized.password).await?;

        let now = Utc::now();
        let candidate = NewAccount {
            email_lower: normalized.email,
            phone_e164: normalized.phone,
            username_lower: normalized.username,
            password_hash,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let account = match self.with_timeout("create account", self.accounts.create(candidate)).await? {
            Ok(account) => account,
            Err(StoreError::Conflict) => {
                record_auth_event(AuthEvent::SignupConflict, None, None);
                let mut fields = FieldErrors::new();
                fields.insert("login".to_string(), CONFLICT_MESSAGE.to_string());
                return Err(AuthError::Conflict(fields));
            }
            Err(e) => return Err(AuthError::internal(e, "create account")),
        };

        let account_id = account.id.to_string();
        // The account exists at this point; a signing failure must still reach the caller.
        let token = self
            .tokens
            .issue(&account_id, self.access_token_ttl)
            .map_err(|e| match e {
                AuthError::Internal(cause) => AuthError::Internal(cause.context("issue token for created account")),
                other => other,
            })?;

        record_auth_event(AuthEvent::SignupSucceeded, Some(&account_id), None);
        Ok(AuthResult { account, token })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResult, AuthError> {
        let normalized = validate_login(&request).map_err(AuthError::InvalidInput)?;

        let account = match self.with_timeout("look up account", self.accounts.get_by_login(&normalized.login)).await? {
            Ok(account) => account,
            Err(StoreError::NotFound) => {
                self.equalize_timing(normalized.password).await;
                record_auth_event(AuthEvent::LoginFailed, None, Some(normalized.login.field()));
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::internal(e, "look up account")),
        };

        let account_id = account.id.to_string();
        if !account.is_active() {
            self.equalize_timing(normalized.password).await;
            record_auth_event(AuthEvent::LoginFailed, Some(&account_id), Some("account not active"));
            return Err(AuthError::InvalidCredentials);
        }

        let matches = self
            .verify_password(account.password_hash.clone(), normalized.password)
            .await?;
        if !matches {
            record_auth_event(AuthEvent::LoginFailed, Some(&account_id), Some("password mismatch"));
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(&account_id, self.access_token_ttl)?;
        record_auth_event(AuthEvent::LoginSucceeded, Some(&account_id), Some(normalized.login.field()));
        Ok(AuthResult { account, token })
    }

    /// Looks up the caller's own account. An empty id means the request never
    /// carried a verified token.
    pub async fn me(&self, account_id: &str) -> Result<Account, AuthError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(AuthError::Unauthorized);
        }
        let id = Uuid::parse_str(account_id).map_err(|_| AuthError::NotFound)?;

        match self.with_timeout("fetch account", self.accounts.get_by_id(id)).await? {
            Ok(account) => Ok(account),
            Err(StoreError::NotFound) => Err(AuthError::NotFound),
            Err(e) => Err(AuthError::internal(e, "fetch account")),
        }
    }

    /// Readiness of the backing store.
    pub async fn ping(&self) -> Result<(), AuthError> {
        self.with_timeout("ping store", self.accounts.ping())
            .await?
            .map_err(|e| AuthError::internal(e, "ping store"))
    }

    async fn equalize_timing(&self, candidate: String) {
        if let Some(digest) = self.dummy_digest.clone() {
            let _ = self.verify_password(digest, candidate).await;
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let task = tokio::task::spawn_blocking(move || hasher.hash(&password));
        self.with_timeout("hash password", task)
            .await?
            .map_err(|e| AuthError::internal(e, "hash password task"))?
            .map_err(|e| AuthError::internal(e, "hash password"))
    }

    async fn verify_password(&self, digest: String, candidate: String) -> Result<bool, AuthError> {
        let hasher = self.hasher;
        let task = tokio::task::spawn_blocking(move || hasher.verify(&digest, &candidate));
        self.with_timeout("verify password", task)
            .await?
            .map_err(|e| AuthError::internal(e, "verify password task"))?
            .map_err(|e| AuthError::internal(e, "verify password"))
    }

    async fn with_timeout<F, T>(&self, operation: &'static str, future: F) -> Result<T, AuthError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.operation_timeout, future)
            .await
            .map_err(|elapsed| {
                tracing::warn!(operation, timeout_ms = self.operation_timeout.as_millis() as u64, "Operation timed out");
                AuthError::internal(elapsed, operation)
            })
    }
}

fn field_list(fields: &FieldErrors) -> String {
    fields.keys().map(String::as_str).collect::<Vec<_>>().join(",")
}

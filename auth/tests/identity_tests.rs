mod common;

use std::sync::Arc;
use std::time::Duration;

use akiba_auth::{AuthError, ErrorKind, IdentityService};
use akiba_config::IdentitySettings;
use akiba_database::{AccountStore, StoreError};
use akiba_models::{Account, AccountStatus, LoginIdentifier, NewAccount};
use async_trait::async_trait;
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn signup_then_login_end_to_end() {
    let (_, identity) = memory_identity();

    let created = identity.signup(default_signup()).await.unwrap();
    assert!(!created.token.is_empty());

    let logged_in = identity.login(login_request("USER_1", "Password1")).await.unwrap();
    assert_eq!(logged_in.account.id, created.account.id);
    assert!(!logged_in.token.is_empty());

    let wrong = identity.login(login_request("user_1", "wrong")).await;
    assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn signup_stores_normalized_fields() {
    let (_, identity) = memory_identity();

    let result = identity
        .signup(signup_request(" USER@Example.com ", " +14155552671 ", " User_1 ", "Password1"))
        .await
        .unwrap();

    assert_eq!(result.account.email_lower, "user@example.com");
    assert_eq!(result.account.phone_e164, "+14155552671");
    assert_eq!(result.account.username_lower, "user_1");
    assert_eq!(result.account.status, AccountStatus::Active);
    assert_eq!(result.account.created_at, result.account.updated_at);
    assert_ne!(result.account.password_hash, "Password1");
}

#[tokio::test]
async fn token_subject_is_the_account_id() {
    let (_, identity) = memory_identity();
    let result = identity.signup(default_signup()).await.unwrap();

    let claims = token_service().verify(&result.token).unwrap();
    assert_eq!(claims.sub, result.account.id.to_string());
    assert_eq!(claims.iss, ISSUER);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn signup_errors_accumulate() {
    let (store, identity) = memory_identity();

    let err = identity
        .signup(signup_request("user@example.com", "123", "ab", "weak"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let fields = err.field_errors().unwrap();
    assert!(fields.contains_key("password"));
    assert!(fields.contains_key("username"));
    assert!(fields.contains_key("phone"));
    assert!(!fields.contains_key("email"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn duplicate_identity_is_a_login_conflict() {
    let (store, identity) = memory_identity();
    identity.signup(default_signup()).await.unwrap();

    let duplicates = [
        signup_request("USER@example.com", "+14155550001", "other_1", "Password1"),
        signup_request("other2@example.com", "+14155552671", "other_2", "Password1"),
        signup_request("other3@example.com", "+14155550003", "USER_1", "Password1"),
    ];
    for request in duplicates {
        let err = identity.signup(request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let fields = err.field_errors().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["login"], "email, phone, or username already exists");
    }
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn failed_logins_are_indistinguishable() {
    let (_, identity) = memory_identity();
    identity.signup(default_signup()).await.unwrap();

    let wrong_password = identity.login(login_request("user_1", "Password2")).await.unwrap_err();
    let unknown_login = identity.login(login_request("nobody_here", "Password1")).await.unwrap_err();
    let unknown_email = identity.login(login_request("nobody@example.com", "Password1")).await.unwrap_err();

    for err in [&wrong_password, &unknown_login, &unknown_email] {
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(err.field_errors().is_none());
    }
    assert_eq!(wrong_password.to_string(), unknown_login.to_string());
}

#[tokio::test]
async fn login_accepts_every_identity_field() {
    let (_, identity) = memory_identity();
    let created = identity.signup(default_signup()).await.unwrap();

    for login in ["USER@Example.com", " +14155552671 ", "User_1"] {
        let result = identity.login(login_request(login, "Password1")).await.unwrap();
        assert_eq!(result.account.id, created.account.id, "{login}");
    }
}

#[tokio::test]
async fn login_compares_the_raw_password() {
    let (_, identity) = memory_identity();
    identity
        .signup(signup_request("user@example.com", "+14155552671", "user_1", "  Password1  "))
        .await
        .unwrap();

    assert!(identity.login(login_request("user_1", "Password1")).await.is_ok());
    assert!(matches!(
        identity.login(login_request("user_1", "  Password1  ")).await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn login_requires_login_and_password() {
    let (_, identity) = memory_identity();

    let err = identity.login(login_request("   ", "")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let fields = err.field_errors().unwrap();
    assert_eq!(fields["login"], "is required");
    assert_eq!(fields["password"], "is required");
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let (store, identity) = memory_identity();
    let created = identity.signup(default_signup()).await.unwrap();
    store.set_status(created.account.id, AccountStatus::Disabled).unwrap();

    let err = identity.login(login_request("user_1", "Password1")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn me_returns_the_signed_up_account() {
    let (_, identity) = memory_identity();
    let created = identity.signup(default_signup()).await.unwrap();

    let account = identity.me(&created.account.id.to_string()).await.unwrap();
    assert_eq!(account, created.account);

    let missing = identity.me(&Uuid::new_v4().to_string()).await.unwrap_err();
    assert!(matches!(missing.kind(), ErrorKind::NotFound | ErrorKind::Unauthorized));
    assert!(matches!(identity.me("").await, Err(AuthError::Unauthorized)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_signups_admit_exactly_one() {
    let (store, identity) = memory_identity();
    let identity = Arc::new(identity);

    let mut handles = Vec::new();
    for i in 0..16 {
        let identity = Arc::clone(&identity);
        handles.push(tokio::spawn(async move {
            identity
                .signup(signup_request(
                    "race@example.com",
                    &format!("+1415555{:04}", i),
                    &format!("racer_{}", i),
                    "Password1",
                ))
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) => assert_eq!(e.kind(), ErrorKind::Conflict),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn overlong_password_is_refused_at_signup() {
    let (store, identity) = memory_identity();

    let long = format!("{}X", "A1".repeat(40));
    let err = identity
        .signup(signup_request("user@example.com", "+14155552671", "user_1", &long))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.field_errors().unwrap()["password"], "must be at most 72 bytes");
    assert!(store.is_empty());
}

#[tokio::test]
async fn login_never_matches_on_a_shared_72_byte_prefix() {
    let (_, identity) = memory_identity();
    let exact = "A1".repeat(36);
    identity
        .signup(signup_request("user@example.com", "+14155552671", "user_1", &exact))
        .await
        .unwrap();

    assert!(identity.login(login_request("user_1", &exact)).await.is_ok());
    for candidate in [format!("{exact}X"), format!("{exact}DIFFERENT")] {
        assert!(matches!(
            identity.login(login_request("user_1", &candidate)).await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}

#[tokio::test]
async fn hash_failure_is_internal_and_stores_nothing() {
    let store = Arc::new(akiba_database::InMemoryAccountStore::new());
    let settings = IdentitySettings {
        bcrypt_cost: 2,
        ..settings()
    };
    let identity = IdentityService::new(store.clone(), token_service(), &settings);

    let err = identity.signup(default_signup()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(store.is_empty());
}

#[tokio::test]
async fn token_failure_after_create_is_internal() {
    let store = Arc::new(akiba_database::InMemoryAccountStore::new());
    let settings = IdentitySettings {
        access_token_ttl: Duration::MAX,
        ..settings()
    };
    let identity = IdentityService::new(store.clone(), token_service(), &settings);

    let err = identity.signup(default_signup()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert_eq!(store.len(), 1);

    // The account exists, so a retry is a conflict rather than a second row.
    let retry = identity.signup(default_signup()).await.unwrap_err();
    assert_eq!(retry.kind(), ErrorKind::Conflict);
}

/// Store whose every call fails or stalls.
struct BrokenStore {
    delay: Option<Duration>,
}

impl BrokenStore {
    async fn fail<T>(&self) -> Result<T, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StoreError::Corrupt("disk on fire".to_string()))
    }
}

#[async_trait]
impl AccountStore for BrokenStore {
    async fn create(&self, _account: NewAccount) -> Result<Account, StoreError> {
        self.fail().await
    }

    async fn get_by_id(&self, _id: Uuid) -> Result<Account, StoreError> {
        self.fail().await
    }

    async fn get_by_login(&self, _login: &LoginIdentifier) -> Result<Account, StoreError> {
        self.fail().await
    }

    async fn ensure_uniqueness_constraints(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.fail().await
    }
}

#[tokio::test]
async fn store_failures_surface_as_internal() {
    let identity = identity_with(Arc::new(BrokenStore { delay: None }));

    let signup = identity.signup(default_signup()).await.unwrap_err();
    let login = identity.login(login_request("user_1", "Password1")).await.unwrap_err();
    let me = identity.me(&Uuid::new_v4().to_string()).await.unwrap_err();

    for err in [signup, login, me] {
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.to_string().contains("disk on fire"));
    }
    assert!(identity.ping().await.is_err());
}

#[tokio::test]
async fn slow_store_times_out() {
    let settings = IdentitySettings {
        operation_timeout: Duration::from_millis(50),
        ..settings()
    };
    let identity = IdentityService::new(
        Arc::new(BrokenStore {
            delay: Some(Duration::from_secs(5)),
        }),
        token_service(),
        &settings,
    );

    let err = identity.login(login_request("user_1", "Password1")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
}

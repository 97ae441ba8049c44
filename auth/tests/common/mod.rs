#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use akiba_auth::{IdentityService, TokenService};
use akiba_config::{IdentitySettings, JwtConfig};
use akiba_database::{AccountStore, InMemoryAccountStore};
use akiba_models::{LoginRequest, SignupRequest};

pub const ISSUER: &str = "akiba-test";
pub const SECRET: &str = "integration-secret";

pub fn token_service() -> Arc<TokenService> {
    Arc::new(
        TokenService::new(&JwtConfig {
            secret: SECRET.to_string(),
            issuer: ISSUER.to_string(),
        })
        .expect("token service"),
    )
}

// Minimum bcrypt cost keeps the suite fast.
pub fn settings() -> IdentitySettings {
    IdentitySettings {
        access_token_ttl: Duration::from_secs(3600),
        operation_timeout: Duration::from_secs(5),
        bcrypt_cost: 4,
    }
}

pub fn identity_with(store: Arc<dyn AccountStore>) -> IdentityService {
    IdentityService::new(store, token_service(), &settings())
}

pub fn memory_identity() -> (Arc<InMemoryAccountStore>, IdentityService) {
    let store = Arc::new(InMemoryAccountStore::new());
    let identity = identity_with(store.clone());
    (store, identity)
}

pub fn signup_request(email: &str, phone: &str, username: &str, password: &str) -> SignupRequest {
    SignupRequest {
        email: email.to_string(),
        phone: phone.to_string(),
        username: username.to_string(),
        password: password.to_string(),
    }
}

pub fn default_signup() -> SignupRequest {
    signup_request("user@example.com", "+14155552671", "user_1", "Password1")
}

pub fn login_request(login: &str, password: &str) -> LoginRequest {
    LoginRequest {
        login: login.to_string(),
        password: password.to_string(),
    }
}

// Repository pattern for account persistence

pub mod account;
pub mod memory;

pub use account::AccountRepository;
pub use memory::InMemoryAccountStore;

use akiba_models::{Account, LoginIdentifier, NewAccount};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique identity field (email, phone or username) is already taken.
    /// Which one is deliberately not reported.
    #[error("account with this email, phone, or username already exists")]
    Conflict,

    #[error("account not found")]
    NotFound,

    #[error("corrupt account record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable account storage with atomic three-field uniqueness.
///
/// `create` must enforce uniqueness of email, phone and username in a single
/// atomic step; callers never check-then-insert.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return it with its assigned identifier.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError>;

    async fn get_by_login(&self, login: &LoginIdentifier) -> Result<Account, StoreError>;

    /// Idempotent setup of the unique constraints, run once at startup.
    async fn ensure_uniqueness_constraints(&self) -> Result<(), StoreError>;

    /// Readiness probe.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

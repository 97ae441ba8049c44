use std::collections::HashMap;

use akiba_models::{Account, AccountStatus, LoginIdentifier, NewAccount};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{AccountStore, StoreError};

#[derive(Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    by_phone: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
}

/// Process-local account store for tests and local development.
///
/// The uniqueness check and the insert happen under one write lock, which
/// gives the same all-or-nothing behavior as a unique index.
#[derive(Default)]
pub struct InMemoryAccountStore {
    inner: RwLock<Inner>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Status transition for administrative flows.
    pub fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let account = inner.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.status = status;
        account.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.write();
        if inner.by_email.contains_key(&account.email_lower)
            || inner.by_phone.contains_key(&account.phone_e164)
            || inner.by_username.contains_key(&account.username_lower)
        {
            return Err(StoreError::Conflict);
        }

        let mut id = Uuid::new_v4();
        while inner.accounts.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let account = account.into_account(id);
        inner.by_email.insert(account.email_lower.clone(), id);
        inner.by_phone.insert(account.phone_e164.clone(), id);
        inner.by_username.insert(account.username_lower.clone(), id);
        inner.accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        self.inner
            .read()
            .accounts
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_login(&self, login: &LoginIdentifier) -> Result<Account, StoreError> {
        let inner = self.inner.read();
        let index = match login {
            LoginIdentifier::Email(_) => &inner.by_email,
            LoginIdentifier::Phone(_) => &inner.by_phone,
            LoginIdentifier::Username(_) => &inner.by_username,
        };
        index
            .get(login.value())
            .and_then(|id| inner.accounts.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn ensure_uniqueness_constraints(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

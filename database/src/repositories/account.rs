use akiba_models::{Account, LoginIdentifier, NewAccount};
use async_trait::async_trait;
use sqlx::{query, query_as, PgPool};
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::AccountRow;

const ACCOUNT_COLUMNS: &str =
    "id, email_lower, phone_e164, username_lower, password_hash, status, created_at, updated_at";

const UNIQUE_INDEXES: [&str; 3] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS uniq_accounts_email_lower ON accounts (email_lower)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uniq_accounts_phone_e164 ON accounts (phone_e164)",
    "CREATE UNIQUE INDEX IF NOT EXISTS uniq_accounts_username_lower ON accounts (username_lower)",
];

/// PostgreSQL-backed account store. Uniqueness is enforced by unique indexes,
/// so concurrent inserts of the same identity resolve inside the database.
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn login_column(login: &LoginIdentifier) -> &'static str {
        match login {
            LoginIdentifier::Email(_) => "email_lower",
            LoginIdentifier::Phone(_) => "phone_e164",
            LoginIdentifier::Username(_) => "username_lower",
        }
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            "INSERT INTO accounts (email_lower, phone_e164, username_lower, password_hash, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ACCOUNT_COLUMNS}"
        );

        let row = query_as::<_, AccountRow>(&sql)
            .bind(&account.email_lower)
            .bind(&account.phone_e164)
            .bind(&account.username_lower)
            .bind(&account.password_hash)
            .bind(account.status.as_str())
            .bind(account.created_at)
            .bind(account.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_insert_error)?;

        tracing::debug!(account_id = %row.id, "Inserted account");
        Account::try_from(row)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Account::try_from(row)
    }

    async fn get_by_login(&self, login: &LoginIdentifier) -> Result<Account, StoreError> {
        // The column comes from a closed set, never from input.
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {} = $1",
            Self::login_column(login)
        );
        let row = query_as::<_, AccountRow>(&sql)
            .bind(login.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Account::try_from(row)
    }

    async fn ensure_uniqueness_constraints(&self) -> Result<(), StoreError> {
        for statement in UNIQUE_INDEXES {
            query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Account uniqueness constraints in place");
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

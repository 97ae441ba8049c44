use akiba_models::{Account, AccountStatus};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::repositories::StoreError;

/// Raw `accounts` row; status is stored as text. No `Debug`: it carries the hash.
#[derive(Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email_lower: String,
    pub phone_e164: String,
    pub username_lower: String,
    pub password_hash: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let status = AccountStatus::parse(&row.status)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status {:?} for account {}", row.status, row.id)))?;

        Ok(Account {
            id: row.id,
            email_lower: row.email_lower,
            phone_e164: row.phone_e164,
            username_lower: row.username_lower,
            password_hash: row.password_hash,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

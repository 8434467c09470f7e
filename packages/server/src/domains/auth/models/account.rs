use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::AccountId;

/// Credential record owned by the built-in identity provider.
///
/// Holds no role; see `UserProfile`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an insert that may collide on the unique email.
pub enum InsertAccount {
    Created(Account),
    EmailTaken,
}

impl Account {
    pub async fn insert(
        email: &str,
        password_hash: &str,
        email_verified: bool,
        pool: &PgPool,
    ) -> Result<InsertAccount> {
        let result = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, email, password_hash, email_verified)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(AccountId::new())
        .bind(email)
        .bind(password_hash)
        .bind(email_verified)
        .fetch_one(pool)
        .await;

        match result {
            Ok(account) => Ok(InsertAccount::Created(account)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertAccount::EmailTaken)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(account)
    }
}

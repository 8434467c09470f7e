//! Built-in identity provider: argon2id credentials in Postgres, JWT sessions.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::AccountId;
use crate::domains::auth::jwt::JwtService;
use crate::domains::auth::models::{Account, InsertAccount};
use crate::domains::auth::password::{hash_password, verify_password};
use crate::domains::auth::types::{CallerIdentity, IdentityError, IssuedSession};
use crate::kernel::BaseIdentityProvider;

pub struct PostgresIdentityProvider {
    pool: PgPool,
    jwt: Arc<JwtService>,
}

impl PostgresIdentityProvider {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self { pool, jwt }
    }
}

#[async_trait]
impl BaseIdentityProvider for PostgresIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        email_verified: bool,
    ) -> Result<AccountId, IdentityError> {
        // argon2 is CPU-bound; keep it off the async workers
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .context("password hashing task panicked")??;

        match Account::insert(email, &password_hash, email_verified, &self.pool).await? {
            InsertAccount::Created(account) => {
                info!(account_id = %account.id, "Account created");
                Ok(account.id)
            }
            InsertAccount::EmailTaken => Err(IdentityError::EmailAlreadyExists),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, IdentityError> {
        let Some(account) = Account::find_by_email(email, &self.pool).await? else {
            debug!("Sign-in for unknown email");
            return Err(IdentityError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored_hash = account.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .context("password verification task panicked")??;
        if !matches {
            debug!(account_id = %account.id, "Sign-in with wrong password");
            return Err(IdentityError::InvalidCredentials);
        }

        let token = self
            .jwt
            .create_token(account.id, account.email)
            .map_err(|e| anyhow!("Failed to create token: {e}"))?;
        Ok(IssuedSession {
            account_id: account.id,
            token,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<CallerIdentity, IdentityError> {
        let claims = self
            .jwt
            .verify_token(token)
            .map_err(|_| IdentityError::InvalidToken)?;
        Ok(CallerIdentity {
            account_id: claims.account_id,
            email: claims.email,
        })
    }
}

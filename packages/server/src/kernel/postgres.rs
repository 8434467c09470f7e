//! Postgres-backed stores. Each method delegates to the model's SQL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::common::{AccountId, OtpRequestId, Role};
use crate::domains::auth::models::{NewOtpRequest, OtpRequest};
use crate::domains::profiles::models::UserProfile;
use crate::kernel::{BaseOtpRequestStore, BaseProfileStore};

pub struct PostgresOtpRequestStore {
    pool: PgPool,
}

impl PostgresOtpRequestStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseOtpRequestStore for PostgresOtpRequestStore {
    async fn create(&self, request: NewOtpRequest) -> Result<OtpRequest> {
        OtpRequest::insert(request, &self.pool).await
    }

    async fn find_by_id(&self, id: OtpRequestId) -> Result<Option<OtpRequest>> {
        OtpRequest::find_by_id(id, &self.pool).await
    }

    async fn reserve_attempt(&self, id: OtpRequestId, now: DateTime<Utc>) -> Result<Option<i32>> {
        OtpRequest::reserve_attempt(id, now, &self.pool).await
    }

    async fn mark_used(&self, id: OtpRequestId, verified_at: DateTime<Utc>) -> Result<bool> {
        OtpRequest::mark_used(id, verified_at, &self.pool).await
    }
}

pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseProfileStore for PostgresProfileStore {
    async fn create(&self, profile: UserProfile) -> Result<()> {
        profile.insert(&self.pool).await
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<UserProfile>> {
        UserProfile::find_by_id(id, &self.pool).await
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<UserProfile>> {
        UserProfile::find_by_role(role, &self.pool).await
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>> {
        UserProfile::find_all(&self.pool).await
    }
}

//! OTP store wrapper that suspends once before every call.
//!
//! The in-memory store resolves immediately, so without this two verifications
//! joined on one task never overlap. Yielding first lets every caller read the
//! same snapshot before any of them writes, like a round trip to Postgres.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_core::common::OtpRequestId;
use portal_core::domains::auth::models::{NewOtpRequest, OtpRequest};
use portal_core::kernel::test_dependencies::InMemoryOtpRequestStore;
use portal_core::kernel::BaseOtpRequestStore;
use std::sync::Arc;

pub struct YieldingOtpStore {
    inner: Arc<InMemoryOtpRequestStore>,
}

impl YieldingOtpStore {
    pub fn new(inner: Arc<InMemoryOtpRequestStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl BaseOtpRequestStore for YieldingOtpStore {
    async fn create(&self, request: NewOtpRequest) -> Result<OtpRequest> {
        tokio::task::yield_now().await;
        self.inner.create(request).await
    }

    async fn find_by_id(&self, id: OtpRequestId) -> Result<Option<OtpRequest>> {
        tokio::task::yield_now().await;
        self.inner.find_by_id(id).await
    }

    async fn reserve_attempt(&self, id: OtpRequestId, now: DateTime<Utc>) -> Result<Option<i32>> {
        tokio::task::yield_now().await;
        self.inner.reserve_attempt(id, now).await
    }

    async fn mark_used(&self, id: OtpRequestId, verified_at: DateTime<Utc>) -> Result<bool> {
        tokio::task::yield_now().await;
        self.inner.mark_used(id, verified_at).await
    }
}

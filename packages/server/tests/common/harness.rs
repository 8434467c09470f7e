//! Test harness backed by in-memory stores.
//!
//! Every test gets fresh stores, a recording email service and an identity
//! provider that issues real JWTs, so flows run end to end without Postgres.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use portal_core::common::{AccountId, OtpRequestId};
use portal_core::domains::auth::activities::send_otp;
use portal_core::domains::auth::types::CallerIdentity;
use portal_core::domains::profiles::types::DirectoryPolicy;
use portal_core::domains::profiles::models::UserProfile;
use portal_core::kernel::{BaseProfileStore, ServerDeps, TestDependencies};
use portal_core::server::{build_app, AppOptions};
use serde_json::Value;
use std::sync::Arc;
use test_context::AsyncTestContext;
use tower::ServiceExt;

use super::YieldingOtpStore;

/// Test harness that manages test infrastructure.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let (rid, code) = ctx.issue_otp("a@x.com", "patient").await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub test_deps: TestDependencies,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {
        // In-memory stores are dropped with the harness
    }
}

impl TestHarness {
    pub fn new() -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            test_deps: TestDependencies::new(),
        }
    }

    pub fn with_policy(policy: DirectoryPolicy) -> Self {
        let mut harness = Self::new();
        harness.test_deps = harness.test_deps.directory_policy(policy);
        harness
    }

    pub fn deps(&self) -> ServerDeps {
        self.test_deps.clone().into_deps()
    }

    /// Deps whose OTP store suspends before every call, so concurrent
    /// verifications interleave. Writes still land in `test_deps`.
    pub fn interleaving_deps(&self) -> ServerDeps {
        let mut deps = self.deps();
        deps.otp_requests = Arc::new(YieldingOtpStore::new(self.test_deps.otp_requests.clone()));
        deps
    }

    /// Router without rate limiting (oneshot requests carry no client address)
    pub fn app(&self) -> Router {
        build_app(
            self.deps(),
            None,
            AppOptions {
                allowed_origins: None,
                rate_limit: false,
            },
        )
        .expect("Failed to build router")
    }

    /// Router with the OTP rate limiter on. Requests must carry `ConnectInfo`.
    pub fn limited_app(&self) -> Router {
        build_app(
            self.deps(),
            None,
            AppOptions {
                allowed_origins: None,
                rate_limit: true,
            },
        )
        .expect("Failed to build router")
    }

    /// Insert profiles into the in-memory store
    pub async fn seed(&self, profiles: Vec<UserProfile>) {
        for profile in profiles {
            self.test_deps
                .profiles
                .create(profile)
                .await
                .expect("Failed to seed profile");
        }
    }

    /// Issue an OTP and return the request id and the code that was mailed
    pub async fn issue_otp(&self, email: &str, role: &str) -> (OtpRequestId, String) {
        let sent = send_otp(email, Some(role), &self.deps())
            .await
            .expect("Failed to issue OTP");
        let code = self
            .test_deps
            .email
            .last_code_for(&email.trim().to_lowercase())
            .expect("No code was mailed");
        (sent.rid, code)
    }

    pub fn caller(&self, account_id: AccountId, email: &str) -> CallerIdentity {
        CallerIdentity {
            account_id,
            email: email.to_string(),
        }
    }

    pub fn token_for(&self, account_id: AccountId, email: &str) -> String {
        self.test_deps.identity.token_for(account_id, email)
    }

    /// POST a JSON body (optionally with a bearer token) and return status + parsed JSON
    pub async fn post_json(
        &self,
        path: &str,
        body: Value,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        send(self.app(), request).await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Run one request through the router and parse the JSON response body
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

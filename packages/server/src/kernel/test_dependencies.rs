// TestDependencies - mock implementations for testing
//
// Provides in-memory stores and mock services that can be injected into ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    BaseEmailService, BaseIdentityProvider, BaseOtpRequestStore, BaseProfileStore, ServerDeps,
};
use crate::common::utils::{digest, digests_match};
use crate::common::{AccountId, OtpRequestId, Role};
use crate::domains::auth::jwt::JwtService;
use crate::domains::auth::models::{NewOtpRequest, OtpRequest};
use crate::domains::auth::types::{CallerIdentity, IdentityError, IssuedSession};
use crate::domains::profiles::models::UserProfile;
use crate::domains::profiles::types::DirectoryPolicy;

pub const TEST_JWT_SECRET: &str = "test_secret_key";
pub const TEST_JWT_ISSUER: &str = "echocare-test";

// =============================================================================
// In-memory OTP Request Store
// =============================================================================

/// Every mutation happens under one lock, which gives the same per-record
/// atomicity as the conditional updates in Postgres.
pub struct InMemoryOtpRequestStore {
    requests: Mutex<HashMap<OtpRequestId, OtpRequest>>,
}

impl InMemoryOtpRequestStore {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Snapshot of a stored request
    pub fn get(&self, id: OtpRequestId) -> Option<OtpRequest> {
        self.requests.lock().unwrap().get(&id).cloned()
    }

    /// Insert a request as-is (for setting up used/expired fixtures)
    pub fn put(&self, request: OtpRequest) {
        self.requests.lock().unwrap().insert(request.id, request);
    }

    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryOtpRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOtpRequestStore for InMemoryOtpRequestStore {
    async fn create(&self, request: NewOtpRequest) -> Result<OtpRequest> {
        let request = request.into_request(OtpRequestId::new());
        self.requests
            .lock()
            .unwrap()
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: OtpRequestId) -> Result<Option<OtpRequest>> {
        Ok(self.get(id))
    }

    async fn reserve_attempt(&self, id: OtpRequestId, now: DateTime<Utc>) -> Result<Option<i32>> {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| anyhow!("otp request {} not found", id))?;
        if !request.accepts_attempt_at(now) {
            return Ok(None);
        }
        request.attempts += 1;
        Ok(Some(request.attempts))
    }

    async fn mark_used(&self, id: OtpRequestId, verified_at: DateTime<Utc>) -> Result<bool> {
        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| anyhow!("otp request {} not found", id))?;
        if request.used || request.is_expired_at(verified_at) {
            return Ok(false);
        }
        request.used = true;
        request.verified_at = Some(verified_at);
        request.attempts = (request.attempts - 1).max(0);
        Ok(true)
    }
}

// =============================================================================
// In-memory Profile Store
// =============================================================================

/// Profiles kept in insertion order, matching `ORDER BY created_at`
pub struct InMemoryProfileStore {
    profiles: Mutex<Vec<UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(Vec::new()),
        }
    }

    pub fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
        }
    }

    pub fn get(&self, id: AccountId) -> Option<UserProfile> {
        self.profiles
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProfileStore for InMemoryProfileStore {
    async fn create(&self, profile: UserProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(anyhow!("profile {} already exists", profile.id));
        }
        profiles.push(profile);
        Ok(())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<UserProfile>> {
        Ok(self.get(id))
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<UserProfile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.role == Some(role))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<UserProfile>> {
        Ok(self.profiles.lock().unwrap().clone())
    }
}

// =============================================================================
// In-memory Identity Provider
// =============================================================================

#[derive(Debug, Clone)]
struct TestAccount {
    id: AccountId,
    password_digest: String,
    email_verified: bool,
}

/// Identity provider backed by a map, issuing real JWTs.
///
/// Stores a SHA-256 digest of the password instead of argon2 to keep tests fast.
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, TestAccount>>,
    jwt: JwtService,
    fail_create: AtomicBool,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            jwt: JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string()),
            fail_create: AtomicBool::new(false),
        }
    }

    /// Make every `create_account` fail with an infrastructure error
    pub fn failing() -> Self {
        let provider = Self::new();
        provider.fail_create.store(true, Ordering::SeqCst);
        provider
    }

    /// Register an account directly, bypassing signup
    pub fn register(&self, email: &str, password: &str) -> AccountId {
        let id = AccountId::new();
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            TestAccount {
                id,
                password_digest: digest(password),
                email_verified: true,
            },
        );
        id
    }

    /// Mint a session token for an account id
    pub fn token_for(&self, account_id: AccountId, email: &str) -> String {
        self.jwt
            .create_token(account_id, email.to_string())
            .unwrap()
    }

    pub fn account_id(&self, email: &str) -> Option<AccountId> {
        self.accounts.lock().unwrap().get(email).map(|a| a.id)
    }

    pub fn is_email_verified(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|a| a.email_verified)
            .unwrap_or(false)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        email_verified: bool,
    ) -> Result<AccountId, IdentityError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(IdentityError::Other(anyhow!("identity provider unavailable")));
        }
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdentityError::EmailAlreadyExists);
        }
        let id = AccountId::new();
        accounts.insert(
            email.to_string(),
            TestAccount {
                id,
                password_digest: digest(password),
                email_verified,
            },
        );
        Ok(id)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedSession, IdentityError> {
        let account = self
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;
        if !digests_match(&account.password_digest, &digest(password)) {
            return Err(IdentityError::InvalidCredentials);
        }
        let token = self.jwt.create_token(account.id, email.to_string())?;
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

// =============================================================================
// Mock Email Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct MockEmailService {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Every send fails after being recorded
    pub fn failing() -> Self {
        let service = Self::new();
        service.fail.store(true, Ordering::SeqCst);
        service
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<SentEmail> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// The six-digit code from the most recent message sent to `to`
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|part| part.len() == 6)
                    .map(str::to_string)
            })
    }
}

impl Default for MockEmailService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailService for MockEmailService {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("smtp connection refused"));
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub otp_requests: Arc<InMemoryOtpRequestStore>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub email: Arc<MockEmailService>,
    pub directory_policy: DirectoryPolicy,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            otp_requests: Arc::new(InMemoryOtpRequestStore::new()),
            profiles: Arc::new(InMemoryProfileStore::new()),
            identity: Arc::new(InMemoryIdentityProvider::new()),
            email: Arc::new(MockEmailService::new()),
            directory_policy: DirectoryPolicy::default(),
        }
    }

    /// Seed the profile store
    pub fn with_profiles(mut self, profiles: Vec<UserProfile>) -> Self {
        self.profiles = Arc::new(InMemoryProfileStore::with_profiles(profiles));
        self
    }

    /// Set a mock identity provider
    pub fn mock_identity(mut self, identity: InMemoryIdentityProvider) -> Self {
        self.identity = Arc::new(identity);
        self
    }

    /// Set a mock email service
    pub fn mock_email(mut self, email: MockEmailService) -> Self {
        self.email = Arc::new(email);
        self
    }

    pub fn directory_policy(mut self, policy: DirectoryPolicy) -> Self {
        self.directory_policy = policy;
        self
    }

    /// Convert into ServerDeps for testing
    pub fn into_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.otp_requests,
            self.profiles,
            self.identity,
            self.email,
            self.directory_policy,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

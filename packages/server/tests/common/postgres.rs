//! Postgres harness with testcontainers.
//!
//! One container is started and migrated on first use, then shared by every
//! test in the binary. Tests isolate themselves with unique emails.

use anyhow::{Context, Result};
use portal_core::domains::auth::JwtService;
use portal_core::domains::profiles::types::DirectoryPolicy;
use portal_core::kernel::test_dependencies::{MockEmailService, TEST_JWT_ISSUER, TEST_JWT_SECRET};
use portal_core::kernel::{
    PostgresIdentityProvider, PostgresOtpRequestStore, PostgresProfileStore, ServerDeps,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

struct SharedPostgres {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_POSTGRES: OnceCell<SharedPostgres> = OnceCell::const_new();

impl SharedPostgres {
    async fn init() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_POSTGRES
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared Postgres")
            })
            .await
    }
}

/// Harness wiring the Postgres adapters into `ServerDeps`.
///
/// Mail goes to a recording mock so tests can read the issued code.
pub struct PostgresHarness {
    pub db_pool: PgPool,
    pub email: Arc<MockEmailService>,
}

impl AsyncTestContext for PostgresHarness {
    async fn setup() -> Self {
        Self::new()
            .await
            .expect("Failed to create Postgres harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}

impl PostgresHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedPostgres::get().await;
        let db_pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&infra.db_url)
            .await
            .context("Failed to connect to test database")?;

        Ok(Self {
            db_pool,
            email: Arc::new(MockEmailService::new()),
        })
    }

    pub fn jwt(&self) -> Arc<JwtService> {
        Arc::new(JwtService::new(TEST_JWT_SECRET, TEST_JWT_ISSUER.to_string()))
    }

    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(
            Arc::new(PostgresOtpRequestStore::new(self.db_pool.clone())),
            Arc::new(PostgresProfileStore::new(self.db_pool.clone())),
            Arc::new(PostgresIdentityProvider::new(self.db_pool.clone(), self.jwt())),
            self.email.clone(),
            DirectoryPolicy::default(),
        )
    }
}

/// Email address no other test in the shared database uses
pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@x.com", prefix, Uuid::new_v4().simple())
}

//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    health_handler, list_doctors_handler, list_doctors_http, list_patients_for_doctor_http,
    list_patients_handler, me_handler, send_otp_handler, sign_in_handler, verify_otp_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    /// `None` when running on in-memory stores
    pub db_pool: Option<PgPool>,
}

/// Router options that vary between deployment and tests
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Exact origins for CORS; `None` mirrors the request origin
    pub allowed_origins: Option<Vec<String>>,
    /// Per-IP limit on the OTP endpoints (needs client address info)
    pub rate_limit: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            allowed_origins: None,
            rate_limit: true,
        }
    }
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origin = match allowed_origins {
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
            // A wildcard can't be combined with credentials
            if origin == "*" {
                warn!("Ignoring wildcard CORS origin");
                return None;
            }
            HeaderValue::from_str(origin)
                .map_err(|_| warn!(origin = %origin, "Ignoring invalid CORS origin"))
                .ok()
        })),
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, db_pool: Option<PgPool>, options: AppOptions) -> Result<Router> {
    let identity = deps.identity.clone();
    let app_state = AppState {
        deps: Arc::new(deps),
        db_pool,
    };

    // OTP endpoints are the only unauthenticated writes
    let mut otp_routes = Router::new()
        .route("/sendOtp", post(send_otp_handler))
        .route("/verifyOtpAndCreateUser", post(verify_otp_handler))
        .route("/signIn", post(sign_in_handler));

    if options.rate_limit {
        // One request replenished every 6 seconds, bursts of up to 5
        let rate_limit_config = Arc::new(
            GovernorConfigBuilder::default()
                .per_second(6)
                .burst_size(5)
                .use_headers() // x-ratelimit-* response headers; the key stays the peer IP
                .finish()
                .context("Invalid rate limiter configuration")?,
        );
        otp_routes = otp_routes.layer(GovernorLayer {
            config: rate_limit_config,
        });
    }

    let app = Router::new()
        .merge(otp_routes)
        .route("/listDoctors", post(list_doctors_handler))
        .route("/listPatientsForDoctor", post(list_patients_handler))
        .route("/me", post(me_handler))
        .route(
            "/listDoctorsHttp",
            get(list_doctors_http).post(list_doctors_http),
        )
        .route(
            "/listPatientsForDoctorHttp",
            post(list_patients_for_doctor_http),
        )
        // Health check (no auth, no rate limit)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(identity.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(options.allowed_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

use axum::http::StatusCode;
use thiserror::Error;

/// Error taxonomy shared by every exposed operation.
///
/// Each variant carries the human-readable message the client shows as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("{0}")]
    DeadlineExceeded(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    ResourceExhausted(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition(message.into())
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::DeadlineExceeded(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Self::ResourceExhausted(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Callable-protocol status name, e.g. `INVALID_ARGUMENT`.
    pub fn status(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::FailedPrecondition(_) => "FAILED_PRECONDITION",
            Self::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Short kebab-case code used by the plain HTTP endpoints.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid-argument",
            Self::NotFound(_) => "not-found",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::DeadlineExceeded(_) => "deadline-exceeded",
            Self::PermissionDenied(_) => "permission-denied",
            Self::ResourceExhausted(_) => "resource-exhausted",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::AlreadyExists(_) => "already-exists",
            Self::Internal(_) => "internal",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) | Self::FailedPrecondition(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::ResourceExhausted(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::FailedPrecondition(m)
            | Self::DeadlineExceeded(m)
            | Self::PermissionDenied(m)
            | Self::ResourceExhausted(m)
            | Self::Unauthenticated(m)
            | Self::AlreadyExists(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Infrastructure failures (store, identity provider) surface as `Internal`.
/// The cause is logged here and never sent to the client.
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "Internal error");
        Self::Internal("Internal error.".to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

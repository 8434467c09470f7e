//! RPC-style endpoints: `{"data": ...}` in, `{"result": ...}` out.
//!
//! Errors render as `{"error": {"status": "INVALID_ARGUMENT", "message": ...}}`
//! with the HTTP status mapped from the error kind.

use axum::{
    async_trait,
    body::Bytes,
    extract::{Extension, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::common::ApiError;
use crate::domains::auth::activities::{send_otp, sign_in, verify_otp};
use crate::domains::auth::types::{
    AccountCreated, CallerIdentity, OtpSent, SignedIn, VerifyOtpInput,
};
use crate::domains::profiles::activities::{list_doctors, list_patients_for_doctor, me};
use crate::domains::profiles::types::{DirectoryEntry, ListPatientsInput, MyProfile};
use crate::server::app::AppState;
use crate::server::middleware::caller_of;

/// Callable error envelope
#[derive(Debug)]
pub struct CallableError(pub ApiError);

impl From<ApiError> for CallableError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "status": self.0.status(),
                "message": self.0.message(),
            }
        });
        (self.0.http_status(), Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CallableResponse<T> {
    pub result: T,
}

pub type CallableResult<T> = Result<Json<CallableResponse<T>>, CallableError>;

fn respond<T>(result: T) -> CallableResult<T> {
    Ok(Json(CallableResponse { result }))
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Extracts `data` from the request envelope.
///
/// An empty body, a missing `data`, or `"data": null` all yield `T::default()`.
pub struct Callable<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Callable<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = CallableError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::invalid_argument("Invalid request body."))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|_| ApiError::invalid_argument("Invalid request body."))?;
        Ok(Self(envelope.data.unwrap_or_default()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendOtpData {
    pub email: String,
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignInData {
    pub email: String,
    pub password: String,
}

/// Accepts any `data` payload and ignores it
#[derive(Debug, Default, Deserialize)]
pub struct Ignored {}

pub async fn send_otp_handler(
    Extension(state): Extension<AppState>,
    Callable(data): Callable<SendOtpData>,
) -> CallableResult<OtpSent> {
    respond(send_otp(&data.email, data.role.as_deref(), &state.deps).await?)
}

pub async fn verify_otp_handler(
    Extension(state): Extension<AppState>,
    Callable(input): Callable<VerifyOtpInput>,
) -> CallableResult<AccountCreated> {
    respond(verify_otp(input, &state.deps).await?)
}

pub async fn sign_in_handler(
    Extension(state): Extension<AppState>,
    Callable(data): Callable<SignInData>,
) -> CallableResult<SignedIn> {
    respond(sign_in(&data.email, &data.password, &state.deps).await?)
}

pub async fn list_doctors_handler(
    Extension(state): Extension<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    Callable(_): Callable<Ignored>,
) -> CallableResult<Vec<DirectoryEntry>> {
    respond(list_doctors(caller_of(&caller), &state.deps).await?)
}

pub async fn list_patients_handler(
    Extension(state): Extension<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    Callable(input): Callable<ListPatientsInput>,
) -> CallableResult<Vec<DirectoryEntry>> {
    respond(list_patients_for_doctor(caller_of(&caller), input, &state.deps).await?)
}

pub async fn me_handler(
    Extension(state): Extension<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    Callable(_): Callable<Ignored>,
) -> CallableResult<MyProfile> {
    respond(me(caller_of(&caller), &state.deps).await?)
}

//! Plain-JSON directory endpoints for browser `fetch` callers.
//!
//! Same authorization as the callables. Bodies and responses are bare JSON
//! and errors render as `{"error": "<code>", "message": ...}`.

use axum::{
    body::Bytes,
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::common::ApiError;
use crate::domains::auth::types::CallerIdentity;
use crate::domains::profiles::activities::{list_doctors, list_patients_for_doctor};
use crate::domains::profiles::types::{DirectoryEntry, ListPatientsInput};
use crate::server::app::AppState;
use crate::server::middleware::caller_of;

#[derive(Debug)]
pub struct HttpError(pub ApiError);

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.0.code(),
            "message": self.0.message(),
        });
        (self.0.http_status(), Json(body)).into_response()
    }
}

pub async fn list_doctors_http(
    Extension(state): Extension<AppState>,
    caller: Option<Extension<CallerIdentity>>,
) -> Result<Json<Vec<DirectoryEntry>>, HttpError> {
    let doctors = list_doctors(caller_of(&caller), &state.deps).await?;
    debug!(count = doctors.len(), "listDoctorsHttp");
    Ok(Json(doctors))
}

pub async fn list_patients_for_doctor_http(
    Extension(state): Extension<AppState>,
    caller: Option<Extension<CallerIdentity>>,
    body: Bytes,
) -> Result<Json<Vec<DirectoryEntry>>, HttpError> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        ListPatientsInput::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| ApiError::invalid_argument("Invalid request body."))?
    };

    let patients = list_patients_for_doctor(caller_of(&caller), input, &state.deps).await?;
    debug!(count = patients.len(), "listPatientsForDoctorHttp");
    Ok(Json(patients))
}

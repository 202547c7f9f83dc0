#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use filegate_contracts::relay::{ErrorBody, FilePart, RelayError, UploadInput};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;
use crate::service::RelayService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RelayService>,
    pub lifecycle: Lifecycle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/upload", post(upload))
        .route("/v1/issue-key", post(issue_key))
        .route("/v1/shutdown", post(shutdown))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    phase: &'static str,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        phase: state.lifecycle.phase().as_str(),
    })
}

async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let input = match decode_upload(multipart).await {
        Ok(input) => input,
        Err(err) => return error_response(upload_status(&err), &err),
    };
    match state.service.handle_upload(input).await {
        Ok(accepted) => (StatusCode::CREATED, Json(accepted)).into_response(),
        Err(err) => error_response(upload_status(&err), &err),
    }
}

// Malformed multipart framing short-circuits into the closed taxonomy
// (NoFile) instead of leaking a transport error.
async fn decode_upload(mut multipart: Multipart) -> Result<UploadInput, RelayError> {
    let mut input = UploadInput::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return Err(RelayError::NoFile),
        };
        let field_name = field.name().map(ToString::to_string);
        match field_name.as_deref() {
            Some("key") => {
                input.key = Some(field.text().await.map_err(|_| RelayError::NoFile)?);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.bin").to_string();
                let bytes = field.bytes().await.map_err(|_| RelayError::NoFile)?;
                input.file = Some(FilePart {
                    name,
                    declared_size: bytes.len() as u64,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }
    Ok(input)
}

fn upload_status(err: &RelayError) -> StatusCode {
    match err {
        RelayError::NoKey => StatusCode::UNAUTHORIZED,
        RelayError::KeyUnknown => StatusCode::NOT_ACCEPTABLE,
        RelayError::UploadQuotaExceeded => StatusCode::FORBIDDEN,
        RelayError::NoFile
        | RelayError::StorageProviderError(_)
        | RelayError::KeyQuotaExceeded
        | RelayError::Unauthorized => StatusCode::BAD_REQUEST,
    }
}

#[derive(Debug, Deserialize)]
struct IssueKeyBody {
    key: Option<String>,
}

// Every failure on this route answers 202 with the taxonomy body.
async fn issue_key(State(state): State<AppState>, body: Option<Json<IssueKeyBody>>) -> Response {
    let key = body.and_then(|Json(body)| body.key);
    match state.service.handle_issue_key(key).await {
        Ok(issued) => (StatusCode::CREATED, Json(issued)).into_response(),
        Err(err) => error_response(StatusCode::ACCEPTED, &err),
    }
}

#[derive(Debug, Deserialize)]
struct ShutdownForm {
    secret: Option<String>,
}

async fn shutdown(State(state): State<AppState>, form: Option<Form<ShutdownForm>>) -> Response {
    let secret = form.and_then(|Form(form)| form.secret);
    match state.service.handle_shutdown(secret).await {
        Ok(ack) => (StatusCode::OK, ack).into_response(),
        Err(err) => error_response(StatusCode::UNAUTHORIZED, &err),
    }
}

fn error_response(status: StatusCode, err: &RelayError) -> Response {
    (status, Json(ErrorBody::from(err))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_http_01_upload_statuses_match_the_wire_table() {
        assert_eq!(upload_status(&RelayError::NoFile), StatusCode::BAD_REQUEST);
        assert_eq!(upload_status(&RelayError::NoKey), StatusCode::UNAUTHORIZED);
        assert_eq!(
            upload_status(&RelayError::KeyUnknown),
            StatusCode::NOT_ACCEPTABLE
        );
        assert_eq!(
            upload_status(&RelayError::UploadQuotaExceeded),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            upload_status(&RelayError::StorageProviderError("x".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}

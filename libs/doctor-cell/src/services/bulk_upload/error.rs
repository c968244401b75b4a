use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use shared_models::error::AppError;

use super::validator::RowError;

#[derive(Error, Debug)]
pub enum BulkUploadError {
    /// Wrong extension, oversize file or missing multipart field.
    #[error("{0}")]
    InputRejected(String),

    /// Unreadable workbook or a header row that does not match.
    #[error("{0}")]
    MalformedWorkbook(String),

    #[error("{} row(s) failed validation", .0.len())]
    RowValidationFailed(Vec<RowError>),

    #[error("{} doctor username(s) could not be resolved", .0.len())]
    UnresolvedReference(Vec<String>),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<anyhow::Error> for BulkUploadError {
    fn from(err: anyhow::Error) -> Self {
        BulkUploadError::Storage(err.to_string())
    }
}

impl IntoResponse for BulkUploadError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            BulkUploadError::InputRejected(msg) | BulkUploadError::MalformedWorkbook(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            BulkUploadError::RowValidationFailed(rows) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Uploaded file contains invalid rows",
                    "data": rows,
                }),
            ),
            BulkUploadError::UnresolvedReference(usernames) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Error occurred while uploading data in bulk",
                    "data": usernames,
                }),
            ),
            BulkUploadError::Storage(msg) => {
                tracing::error!("Bulk upload storage failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg }))
            }
            BulkUploadError::App(err) => return err.into_response(),
        };

        (status, Json(body)).into_response()
    }
}

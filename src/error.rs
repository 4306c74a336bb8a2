use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No dataset loaded. Upload a CSV first.")]
    NoDatasetLoaded,
    #[error("Column '{0}' not found.")]
    ColumnNotFound(String),
    #[error("Unrecognized cleaning action: '{0}'")]
    UnrecognizedAction(String),
    #[error("Error processing the CSV: {0}")]
    MalformedInput(String),
    #[error("Remote sync failed: {0}")]
    RemoteSync(String),
    #[error("No cleaned data yet")]
    NoCleanedData,
    #[error("DataFrame error: {0}")]
    DataFrame(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<polars::prelude::PolarsError> for AppError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        AppError::DataFrame(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteSync(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    /// Only the export endpoint reports a transport-level failure; every
    /// other error travels as a structured payload on a success status.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoCleanedData => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_missing_export_is_a_transport_failure() {
        assert_eq!(AppError::NoCleanedData.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoDatasetLoaded.status(), StatusCode::OK);
        assert_eq!(AppError::ColumnNotFound("x".into()).status(), StatusCode::OK);
        assert_eq!(AppError::MalformedInput("bad".into()).status(), StatusCode::OK);
    }

    #[test]
    fn test_messages_name_the_offending_input() {
        assert_eq!(
            AppError::ColumnNotFound("price".into()).to_string(),
            "Column 'price' not found."
        );
        assert!(AppError::UnrecognizedAction("drop".into()).to_string().contains("'drop'"));
    }
}

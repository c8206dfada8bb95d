//! HTTP API のエラーレスポンス

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{infrastructure::dto::http::ErrorDto, usecase::SyncError};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Authorization ヘッダーがない、または解決できない
    #[error("missing or invalid bearer token")]
    Unauthorized,

    /// クエリパラメータが不正
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Sync(SyncError::SnapshotNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Sync(SyncError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            Self::Sync(SyncError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (
            status,
            Json(ErrorDto {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

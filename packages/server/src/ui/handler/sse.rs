//! SSE connection handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response, Sse},
};

use crate::{
    domain::Identity,
    infrastructure::{dto::http::SseConnectQuery, transport::ActiveTransport},
    ui::{error::ApiError, state::AppState},
};

/// `GET /sse/connect?userId=&roomId=`
///
/// 識別子はクエリで受け取る。ハートビートはアダプタの配信タスクが送るので
/// axum の keep-alive は使わない。
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SseConnectQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let ActiveTransport::Sse(adapter) = &state.transport else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let identity =
        Identity::try_from(query).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let events = adapter.connect(identity).await;
    Ok((
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(events),
    )
        .into_response())
}

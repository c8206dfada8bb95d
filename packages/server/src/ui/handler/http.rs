//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{
        MessageDto, PlaybackStatusDto, ProtocolDto, RoomMembersDto, SwitchItemRequest,
        UpdatePauseRequest, UpdateTimeRequest,
    },
    ui::{error::ApiError, extract::AuthenticatedUser, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// `POST /api/sync/updateTime`
pub async fn update_time(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<UpdateTimeRequest>,
) -> Result<Json<MessageDto>, ApiError> {
    state
        .update_time_usecase
        .execute(identity, request.time, request.timestamp, request.video_id)
        .await?;
    Ok(Json(MessageDto::new("Time updated")))
}

/// `POST /api/sync/updatePause`
pub async fn update_pause(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<UpdatePauseRequest>,
) -> Result<Json<MessageDto>, ApiError> {
    state
        .update_pause_usecase
        .execute(identity, request.paused, request.timestamp)
        .await?;
    Ok(Json(MessageDto::new("Pause state updated")))
}

/// `GET /api/sync/query`
pub async fn query_playback(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<PlaybackStatusDto>, ApiError> {
    let snapshot = state
        .query_playback_usecase
        .execute(identity.room_id)
        .await?;

    // Domain Model から DTO への変換
    Ok(Json(PlaybackStatusDto::from_snapshot(
        identity.room_id,
        &snapshot,
    )))
}

/// `GET /api/sync/protocol`
pub async fn get_protocol(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Json<ProtocolDto> {
    Json(ProtocolDto {
        protocol: state.transport.protocol().to_string(),
    })
}

/// `POST /api/playlist/switch`
pub async fn switch_item(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    Json(request): Json<SwitchItemRequest>,
) -> Result<Json<MessageDto>, ApiError> {
    state
        .switch_item_usecase
        .execute(identity, request.playlist_item_id)
        .await?;
    Ok(Json(MessageDto::new("Playlist item switched")))
}

/// `GET /api/room/members`
pub async fn get_room_members(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Json<RoomMembersDto> {
    let members = state.list_members_usecase.execute(identity.room_id).await;
    Json(RoomMembersDto::from_members(identity.room_id, &members))
}

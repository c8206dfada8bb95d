//! Conversion logic between DTOs and domain models.

use std::collections::BTreeSet;

use crate::domain::{Identity, PlaybackSnapshot, RoomId, UserId, ValueObjectError};
use crate::infrastructure::dto::http as dto;

// ========================================
// Domain Model → DTO
// ========================================

impl dto::PlaybackStatusDto {
    pub fn from_snapshot(room_id: RoomId, snapshot: &PlaybackSnapshot) -> Self {
        Self {
            room_id: room_id.value(),
            paused: snapshot.paused,
            time: snapshot.position,
            timestamp: snapshot.timestamp.value(),
            video_id: snapshot.current_item_id,
        }
    }
}

impl dto::RoomMembersDto {
    pub fn from_members(room_id: RoomId, members: &BTreeSet<UserId>) -> Self {
        Self {
            room_id: room_id.value(),
            user_ids: members.iter().map(UserId::value).collect(),
        }
    }
}

// ========================================
// DTO → Domain Model
// ========================================

impl TryFrom<dto::SseConnectQuery> for Identity {
    type Error = ValueObjectError;

    fn try_from(query: dto::SseConnectQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(query.user_id)?,
            room_id: RoomId::new(query.room_id)?,
        })
    }
}

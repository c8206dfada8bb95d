//! ユースケースのテスト用アダプタ

use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{RoomId, SyncAdapter, SyncMessage, SyncProtocol, TransportError, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBroadcast {
    pub room_id: RoomId,
    pub message: SyncMessage,
    pub excluded: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSend {
    pub room_id: RoomId,
    pub user_ids: Vec<UserId>,
    pub message: SyncMessage,
}

/// 呼び出しを記録するだけの SyncAdapter
#[derive(Default)]
pub struct RecordingAdapter {
    members: BTreeSet<(RoomId, UserId)>,
    broadcasts: Mutex<Vec<RecordedBroadcast>>,
    sends: Mutex<Vec<RecordedSend>>,
    stops: AtomicUsize,
}

impl RecordingAdapter {
    pub fn with_members(members: impl IntoIterator<Item = (u64, u64)>) -> Self {
        Self {
            members: members
                .into_iter()
                .map(|(room, user)| (RoomId::new(room).unwrap(), UserId::new(user).unwrap()))
                .collect(),
            ..Self::default()
        }
    }

    pub async fn broadcasts(&self) -> Vec<RecordedBroadcast> {
        self.broadcasts.lock().await.clone()
    }

    pub async fn direct_sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().await.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SyncAdapter for RecordingAdapter {
    async fn broadcast(&self, room_id: RoomId, message: &SyncMessage, excluded: &[UserId]) {
        self.broadcasts.lock().await.push(RecordedBroadcast {
            room_id,
            message: message.clone(),
            excluded: excluded.to_vec(),
        });
    }

    async fn send_to_users(&self, room_id: RoomId, user_ids: &[UserId], message: &SyncMessage) {
        self.sends.lock().await.push(RecordedSend {
            room_id,
            user_ids: user_ids.to_vec(),
            message: message.clone(),
        });
    }

    async fn list_members(&self, room_id: RoomId) -> BTreeSet<UserId> {
        self.members
            .iter()
            .filter(|(room, _)| *room == room_id)
            .map(|(_, user)| *user)
            .collect()
    }

    async fn start(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn protocol(&self) -> SyncProtocol {
        SyncProtocol::WebSocket
    }
}

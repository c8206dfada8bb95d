//! UseCase: ルームの接続中メンバー一覧

use std::{collections::BTreeSet, sync::Arc};

use crate::domain::{RoomId, UserId};

use super::SyncFanout;

/// 有効なトランスポートに接続中のメンバーを返すユースケース
pub struct ListMembersUseCase {
    fanout: Arc<SyncFanout>,
}

impl ListMembersUseCase {
    pub fn new(fanout: Arc<SyncFanout>) -> Self {
        Self { fanout }
    }

    pub async fn execute(&self, room_id: RoomId) -> BTreeSet<UserId> {
        self.fanout.list_members(room_id).await
    }
}

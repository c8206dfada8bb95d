//! Server state shared by every handler.

use std::sync::Arc;

use crate::{
    domain::IdentityResolver,
    infrastructure::transport::ActiveTransport,
    usecase::{
        ListMembersUseCase, QueryPlaybackUseCase, SwitchItemUseCase, SyncFanout,
        UpdatePauseUseCase, UpdateTimeUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// 起動時に選ばれたトランスポート（`/ws` か `/sse/connect` のルーティングに使う）
    pub transport: ActiveTransport,
    /// SyncFanout（ルームへの配信口）
    pub fanout: Arc<SyncFanout>,
    /// Bearer トークンから識別子を解決する
    pub identity_resolver: Arc<dyn IdentityResolver>,
    pub update_time_usecase: Arc<UpdateTimeUseCase>,
    pub update_pause_usecase: Arc<UpdatePauseUseCase>,
    pub switch_item_usecase: Arc<SwitchItemUseCase>,
    pub query_playback_usecase: Arc<QueryPlaybackUseCase>,
    pub list_members_usecase: Arc<ListMembersUseCase>,
}

//! Playback sync server.
//!
//! Relays room playback state (time, pause, playlist switches) to every connected member.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin syncplay-server
//! cargo run --bin syncplay-server -- --host 0.0.0.0 --port 3000 --protocol sse
//! SYNC_PROTOCOL=sse cargo run --bin syncplay-server
//! ```

use std::sync::Arc;

use clap::Parser;
use syncplay_server::{
    config::{ServerArgs, ServerConfig},
    domain::RoomStore,
    infrastructure::{
        identity::UnverifiedTokenResolver, repository::InMemoryRoomStore,
        transport::build_transport,
    },
    ui::{AppState, Server},
    usecase::{
        ListMembersUseCase, QueryPlaybackUseCase, SwitchItemUseCase, SyncFanout,
        UpdatePauseUseCase, UpdateTimeUseCase,
    },
};
use syncplay_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[tokio::main]
async fn main() {
    let args = ServerArgs::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match ServerConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    // Initialize dependencies in order:
    // 1. Repository
    // 2. Transport adapter
    // 3. Fanout
    // 4. UseCases
    // 5. Server

    // 1. Create Repository (in-memory database)
    let store: Arc<dyn RoomStore> = Arc::new(InMemoryRoomStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 2. Create the transport adapter selected by --protocol
    let transport = match build_transport(config.protocol, store.clone(), config.transport).await {
        Ok(transport) => transport,
        Err(e) => {
            tracing::error!("Failed to start sync transport: {}", e);
            std::process::exit(1);
        }
    };

    // 3. Create the fanout around the active adapter
    let fanout = Arc::new(SyncFanout::with_adapter(transport.adapter()));

    // 4. Create UseCases
    let update_time_usecase = Arc::new(UpdateTimeUseCase::new(store.clone(), fanout.clone()));
    let update_pause_usecase = Arc::new(UpdatePauseUseCase::new(store.clone(), fanout.clone()));
    let switch_item_usecase = Arc::new(SwitchItemUseCase::new(
        store.clone(),
        fanout.clone(),
        clock.clone(),
    ));
    let query_playback_usecase = Arc::new(QueryPlaybackUseCase::new(store.clone(), clock));
    let list_members_usecase = Arc::new(ListMembersUseCase::new(fanout.clone()));

    tracing::warn!(
        "Bearer tokens and WebSocket auth frames are trusted without verification; \
         do not expose this server without an authenticating proxy"
    );

    // 5. Create and run the server
    let state = AppState {
        transport,
        fanout,
        identity_resolver: Arc::new(UnverifiedTokenResolver::new()),
        update_time_usecase,
        update_pause_usecase,
        switch_item_usecase,
        query_playback_usecase,
        list_members_usecase,
    };
    let server = Server::new(state, &config);
    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

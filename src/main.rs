//! Blind test backend entrypoint wiring REST, SSE, Spotify and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blindtest_back::{
    build_router,
    config::AppConfig,
    dao::room_store::memory::MemoryRoomStore,
    spotify::{SpotifyClient, SpotifyCredentials},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let credentials = SpotifyCredentials::from_env();
    if credentials.is_none() {
        warn!("SPOTIFY_CLIENT_ID / SPOTIFY_CLIENT_SECRET not set; Spotify endpoints will fail");
    }
    let spotify = SpotifyClient::new(config.spotify.clone(), credentials);

    let app_state = AppState::new(config, spotify);
    start_storage(app_state.clone()).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the storage backend: CouchDB under supervision when `COUCH_BASE_URL` is set, the
/// in-memory store otherwise.
async fn start_storage(state: SharedState) {
    #[cfg(feature = "couch-store")]
    if env::var("COUCH_BASE_URL").is_ok() {
        use blindtest_back::{
            dao::{
                room_store::{
                    RoomStore,
                    couchdb::{CouchConfig, CouchRoomStore},
                },
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        info!("CouchDB configured; storage supervisor starting in degraded mode");
        tokio::spawn(storage_supervisor::run(state, || async {
            let config = CouchConfig::from_env()?;
            let store = CouchRoomStore::connect(config).await?;
            Ok::<_, StorageError>(Arc::new(store) as Arc<dyn RoomStore>)
        }));
        return;
    }

    info!("no database configured; rooms are kept in memory");
    state.set_room_store(Arc::new(MemoryRoomStore::new())).await;
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

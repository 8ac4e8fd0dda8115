use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::db::{Db, MemoryStore, Store};
use crate::error::Result;
use crate::feed::OddsApiClient;
use crate::server::router;
use crate::state::AppState;
use crate::sync::{RetryPolicy, SyncOrchestrator};

pub async fn run(config: Config) -> Result<()> {
    info!("🥊 Started");
    info!("================================");

    info!("Feed: {} ({})", config.feed.base_url, config.feed.sport);

    let store = open_store(&config).await?;
    let feed = Arc::new(OddsApiClient::new(config.feed.clone())?);
    let orchestrator = SyncOrchestrator::new(feed, store.clone(), RetryPolicy::from(&config.sync));
    let state = AppState::new(orchestrator, store);

    if let Some(period) = config.sync.interval {
        tokio::spawn(schedule_passes(state.clone(), period));
    }

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Stopped");
    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match &config.database.url {
        Some(_) => {
            let db = Db::new(&config.database).await?;
            db.create_tables().await?;
            Ok(Arc::new(db))
        }
        None => {
            warn!("DATABASE_URL not set, events and fights are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn schedule_passes(state: AppState, period: Duration) {
    info!("⏱️ Scheduled sync every {:?}", period);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = state.orchestrator.run_pass().await {
            error!("Scheduled sync failed: {}", e);
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Could not listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

//! HostelFlow
//!
//! Main application entry point

use std::sync::Arc;
use anyhow::Context;
use tracing::{info, warn};
use uuid::Uuid;

use hostelflow::{
    config::Settings,
    database::{
        create_pool, memory::DEMO_STUDENT_ID, run_migrations, ChangeFeed, ChangeListener,
        DatabaseService, InMemoryStore, PoolConfig, RecordStore, trigger_notifies_on,
    },
    state::AppContext,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", hostelflow::info());

    let feed = ChangeFeed::new(settings.sync.buffer);
    let (store, _listener): (Arc<dyn RecordStore>, Option<ChangeListener>) = if settings.database.is_memory() {
        info!("Using in-memory store with demo data");
        (Arc::new(InMemoryStore::with_demo_data(feed.clone())?), None)
    } else {
        info!("Connecting to database...");
        let pool = create_pool(&PoolConfig::from(&settings.database)).await?;
        run_migrations(&pool).await?;
        trigger_notifies_on(&pool, &settings.sync.channel).await?;
        let listener = ChangeListener::start(&pool, &settings.sync.channel, feed.clone()).await?;
        (Arc::new(DatabaseService::new(pool)), Some(listener))
    };

    let context = AppContext::new(settings, store, feed)?;

    let health = context.services.health_check().await;
    for issue in health.get_issues() {
        warn!(issue = %issue, "Service degraded");
    }

    let user_id = match std::env::args().nth(1) {
        Some(raw) => Uuid::parse_str(&raw).with_context(|| format!("invalid user id: {raw}"))?,
        None if context.store().backend_tag() == "memory" => Uuid::from_u128(DEMO_STUDENT_ID),
        None => anyhow::bail!("usage: hostelflow <user-id>"),
    };

    let session = match context.services.auth_service.sign_in(user_id).await {
        Ok(session) => session,
        Err(e) => {
            logging::log_error("sign_in", &e);
            return Err(e.into());
        }
    };
    info!(user = %session.name, role = %session.role, "Session opened");

    let mut views = context.open_views(session).await;
    info!(dashboard = %views.dashboard(), "Dashboard");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
            alive = views.changed() => {
                if !alive {
                    warn!("Change feed closed, views are no longer updated");
                    break;
                }
                info!(dashboard = %views.dashboard(), "Dashboard");
            }
        }
    }

    let session = views.close();
    context.services.auth_service.sign_out(session);
    info!("HostelFlow has been shut down.");

    Ok(())
}

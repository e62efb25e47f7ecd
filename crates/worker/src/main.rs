mod sweep;

use std::sync::Arc;

use studyplan_events::{EventBus, EventLogger};
use studyplan_planner::catalog::PgLessonCatalog;
use studyplan_planner::repository::PgScheduleRepository;
use studyplan_planner::{AdaptiveScheduler, CalendarStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyplan_worker=info,studyplan_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::error!("DATABASE_URL must be set");
            return;
        }
    };

    let pool = match studyplan_db::create_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to database");
            return;
        }
    };
    if let Err(e) = studyplan_db::health_check(&pool).await {
        tracing::error!(error = %e, "Database health check failed");
        return;
    }
    if let Err(e) = studyplan_db::run_migrations(&pool).await {
        tracing::error!(error = %e, "Failed to run migrations");
        return;
    }
    tracing::info!("Database ready");

    let store = Arc::new(CalendarStore::new(Arc::new(PgScheduleRepository::new(
        pool.clone(),
    ))));
    let catalog = Arc::new(PgLessonCatalog::new(pool));
    let scheduler = Arc::new(AdaptiveScheduler::new(store, catalog));

    let bus = Arc::new(EventBus::default());
    let logger = tokio::spawn(EventLogger::run(bus.subscribe()));

    let cancel = CancellationToken::new();
    let sweep = tokio::spawn(sweep::run(
        scheduler,
        Arc::clone(&bus),
        sweep::interval_from_env(),
        cancel.clone(),
    ));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    if let Err(e) = sweep.await {
        tracing::error!(error = %e, "Adaptation sweep task panicked");
    }

    // The logger exits once the last bus handle is gone.
    drop(bus);
    match logger.await {
        Ok(logged) => tracing::info!(logged, "Worker stopped"),
        Err(e) => tracing::error!(error = %e, "Event logger task panicked"),
    }
}

use crate::shutdown;
use chrono::Local;
use lukkari::components::preferences::UserPreferences;
use lukkari::components::reminders::notifications::UpcomingAnnouncer;
use lukkari::components::store::open_store;
use lukkari::components::{ApiClient, ComponentManager, Reminders};
use lukkari::config::Config;
use lukkari::error::Error;
use lukkari::utils::time::current_week_dates;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio::time::{interval, Duration};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// How often upcoming reminders are checked, in seconds
const UPCOMING_CHECK_SECS: u64 = 60;

/// How far ahead a reminder counts as upcoming, in minutes
const UPCOMING_WINDOW_MINUTES: i64 = 60;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Start the components and run until a shutdown signal arrives
pub async fn run(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (store, redis_handle, api, week_start_day) = {
        let config_read = config.read().await;
        let (store, redis_handle) = open_store(&config_read)?;
        let api = ApiClient::from_config(&config_read, Arc::clone(&store))?;
        (store, redis_handle, api, config_read.week_start_day)
    };

    let preferences = UserPreferences::load(store.as_ref()).await?;
    info!(
        "Study preferences: {} h/day in {} min sessions, {:?}",
        preferences.study_hours_per_day, preferences.session_length, preferences.preferred_study_time
    );

    let week = current_week_dates(&Local::now(), week_start_day);
    if let (Some(first), Some(last)) = (week.first(), week.last()) {
        info!("Current planning week: {} to {}", first, last);
    }

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Reminders::new(Arc::new(api)));
    let component_manager = Arc::new(component_manager);
    component_manager.init_all().await?;

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, redis_handle).await;
    });

    let announce_components = Arc::clone(&component_manager);
    let announcer = tokio::spawn(async move {
        announce_upcoming(announce_components).await;
    });

    if shutdown_recv.await.is_err() {
        warn!("Signal handler ended without sending a shutdown signal");
    }
    announcer.abort();

    info!("lukkari stopped");
    Ok(())
}

/// Log reminders that start within the next hour, each one once
async fn announce_upcoming(component_manager: Arc<ComponentManager>) {
    let poller = match component_manager.get_component::<Reminders>() {
        Some(reminders) => reminders.get_poller().await,
        None => None,
    };
    let Some(poller) = poller else {
        info!("Reminders component not running, no upcoming reminders will be shown");
        return;
    };

    let mut announcer = UpcomingAnnouncer::new();
    let mut ticker = interval(Duration::from_secs(UPCOMING_CHECK_SECS));

    loop {
        ticker.tick().await;
        let reminders = poller.reminders().await;
        let announced = announcer.announce(
            &reminders,
            Local::now(),
            chrono::Duration::minutes(UPCOMING_WINDOW_MINUTES),
        );
        debug!(
            "Announced {} reminders, tracking {}",
            announced,
            announcer.remembered()
        );
    }
}

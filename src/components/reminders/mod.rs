pub mod notifications;
mod poller;

pub use poller::{RefreshOutcome, ReminderPoller};

use crate::components::api::{ApiClient, Reminder};
use crate::config::Config;
use crate::error::{component_error, PlannerResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Anything reminders can be fetched from
#[async_trait]
pub trait ReminderSource: Send + Sync + 'static {
    async fn fetch_reminders(&self) -> PlannerResult<Vec<Reminder>>;
}

#[async_trait]
impl ReminderSource for ApiClient {
    async fn fetch_reminders(&self) -> PlannerResult<Vec<Reminder>> {
        self.get_reminders().await
    }
}

/// Reminders component keeping a polled copy of the user's reminders
pub struct Reminders {
    source: Arc<dyn ReminderSource>,
    poller: RwLock<Option<(ReminderPoller, JoinHandle<()>)>>,
}

impl Reminders {
    pub fn new(source: Arc<dyn ReminderSource>) -> Self {
        Self {
            source,
            poller: RwLock::new(None),
        }
    }

    /// Get the running poller, if the component has been initialized
    pub async fn get_poller(&self) -> Option<ReminderPoller> {
        let poller_lock = self.poller.read().await;
        poller_lock.as_ref().map(|(poller, _)| poller.clone())
    }
}

#[async_trait]
impl super::Component for Reminders {
    fn name(&self) -> &'static str {
        "reminders"
    }

    async fn init(&self, config: Arc<RwLock<Config>>) -> PlannerResult<()> {
        let period = {
            let config_read = config.read().await;
            Duration::from_secs(config_read.reminder_poll_interval_secs)
        };
        if period.is_zero() {
            return Err(component_error("Reminder poll interval must be positive"));
        }

        let mut poller_lock = self.poller.write().await;
        if poller_lock.is_some() {
            warn!("Reminder poller is already running, skipping initialization");
            return Ok(());
        }

        let poller = ReminderPoller::new(Arc::clone(&self.source), period);
        let task = poller.start();
        *poller_lock = Some((poller, task));

        Ok(())
    }

    async fn shutdown(&self) -> PlannerResult<()> {
        let running = self.poller.write().await.take();
        if let Some((poller, task)) = running {
            poller.stop();
            if let Err(e) = task.await {
                return Err(component_error(&format!("Reminder poller task failed: {}", e)));
            }
            info!("Reminder poller shut down");
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

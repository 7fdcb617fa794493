use super::ReminderSource;
use crate::components::api::Reminder;
use crate::error::PlannerResult;
use chrono::{DateTime, Local};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// What a refresh attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Local state replaced with this many reminders
    Updated(usize),
    /// Another refresh was still running, nothing was started
    Skipped,
}

/// Clears the in-flight flag however the refresh ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Periodic reminder refresh that never runs two fetches at once
#[derive(Clone)]
pub struct ReminderPoller {
    source: Arc<dyn ReminderSource>,
    reminders: Arc<RwLock<Vec<Reminder>>>,
    last_refreshed: Arc<RwLock<Option<DateTime<Local>>>>,
    in_flight: Arc<AtomicBool>,
    cancel: CancellationToken,
    period: Duration,
}

impl ReminderPoller {
    pub fn new(source: Arc<dyn ReminderSource>, period: Duration) -> Self {
        Self {
            source,
            reminders: Arc::new(RwLock::new(Vec::new())),
            last_refreshed: Arc::new(RwLock::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
            cancel: CancellationToken::new(),
            period,
        }
    }

    /// The reminders from the last successful refresh
    pub async fn reminders(&self) -> Vec<Reminder> {
        self.reminders.read().await.clone()
    }

    /// When the last successful refresh finished
    pub async fn last_refreshed(&self) -> Option<DateTime<Local>> {
        *self.last_refreshed.read().await
    }

    /// Whether a refresh is running right now
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Refresh immediately unless a refresh is already outstanding.
    ///
    /// On failure the previous reminders are kept and the error returned.
    pub async fn refresh_now(&self) -> PlannerResult<RefreshOutcome> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Reminder refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        }
        let _guard = InFlight(&self.in_flight);

        let fetched = self.source.fetch_reminders().await?;
        let count = fetched.len();

        *self.reminders.write().await = fetched;
        *self.last_refreshed.write().await = Some(Local::now());

        Ok(RefreshOutcome::Updated(count))
    }

    /// Spawn the polling loop. The first refresh happens right away.
    pub fn start(&self) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            poller.run().await;
        })
    }

    /// Ask the polling loop to stop, abandoning any fetch in progress
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    async fn run(&self) {
        info!("Reminder poller started, refreshing every {:?}", self.period);

        let mut ticker = interval(self.period);
        // A slow fetch swallows the ticks it overlaps instead of queueing them
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.refresh_now() => match result {
                    Ok(RefreshOutcome::Updated(count)) => {
                        debug!("Refreshed {} reminders", count);
                    }
                    Ok(RefreshOutcome::Skipped) => {
                        debug!("Scheduled reminder refresh skipped, previous one still running");
                    }
                    Err(e) => {
                        error!("Failed to refresh reminders: {}", e);
                    }
                },
            }
        }

        info!("Reminder poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::other_error;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn reminder(id: &str) -> Reminder {
        Reminder {
            id: id.to_string(),
            title: format!("Reminder {}", id),
            ..Reminder::default()
        }
    }

    /// Blocks inside the fetch until released
    #[derive(Default)]
    struct GatedSource {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReminderSource for GatedSource {
        async fn fetch_reminders(&self) -> PlannerResult<Vec<Reminder>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            self.release.notified().await;
            Ok(vec![reminder("gated")])
        }
    }

    /// Returns a fixed list, failing on the calls listed in `fail_on`
    struct ScriptedSource {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReminderSource for ScriptedSource {
        async fn fetch_reminders(&self) -> PlannerResult<Vec<Reminder>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail_on.contains(&call) {
                return Err(other_error("API unavailable"));
            }
            Ok(vec![reminder("a"), reminder("b")])
        }
    }

    #[tokio::test]
    async fn test_refresh_is_single_flight() {
        let source = Arc::new(GatedSource::default());
        let poller = ReminderPoller::new(source.clone(), Duration::from_secs(60));

        let first = tokio::spawn({
            let poller = poller.clone();
            async move { poller.refresh_now().await }
        });
        source.entered.notified().await;
        assert!(poller.is_refreshing());

        let second = poller.refresh_now().await.unwrap();
        assert_eq!(second, RefreshOutcome::Skipped);

        source.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), RefreshOutcome::Updated(1));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(!poller.is_refreshing());
        assert_eq!(poller.reminders().await[0].id, "gated");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let source = Arc::new(ScriptedSource::new(vec![1]));
        let poller = ReminderPoller::new(source, Duration::from_secs(60));

        assert_eq!(poller.refresh_now().await.unwrap(), RefreshOutcome::Updated(2));
        let refreshed_at = poller.last_refreshed().await;
        assert!(refreshed_at.is_some());

        assert!(poller.refresh_now().await.is_err());
        assert_eq!(poller.reminders().await.len(), 2);
        assert_eq!(poller.last_refreshed().await, refreshed_at);

        // The flag is released after a failure
        assert!(!poller.is_refreshing());
        assert_eq!(poller.refresh_now().await.unwrap(), RefreshOutcome::Updated(2));
    }

    #[tokio::test]
    async fn test_polling_loop_refreshes_and_stops() {
        let source = Arc::new(ScriptedSource::new(vec![0]));
        let poller = ReminderPoller::new(source.clone(), Duration::from_millis(10));

        let task = poller.start();
        tokio::time::sleep(Duration::from_millis(150)).await;
        poller.stop();
        task.await.unwrap();

        let calls = source.calls.load(Ordering::SeqCst);
        assert!(calls >= 2, "expected repeated refreshes, got {}", calls);
        assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
        // The first call failed, a later one succeeded
        assert_eq!(poller.reminders().await.len(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
    }
}

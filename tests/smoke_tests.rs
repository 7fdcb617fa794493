use async_trait::async_trait;
use lukkari::components::preferences::{StudyTime, UserPreferences};
use lukkari::components::reminders::{ReminderSource, Reminders};
use lukkari::components::store::{keys, InMemoryStore, LocalStore, RedisStoreHandle};
use lukkari::components::api::Reminder;
use lukkari::components::{Component, ComponentManager};
use lukkari::config::Config;
use lukkari::error::PlannerResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

fn test_config(components: &[(&str, bool)]) -> Config {
    Config {
        api_url: "http://127.0.0.1:5000/api".to_string(),
        redis_url: None,
        store_key_prefix: "lukkari-test:".to_string(),
        reminder_poll_interval_secs: 60,
        request_timeout_secs: 5,
        week_start_day: 1,
        components: components
            .iter()
            .map(|(name, enabled)| (name.to_string(), *enabled))
            .collect::<HashMap<_, _>>(),
    }
}

/// Smoke test to verify that a hand-built config is valid
#[tokio::test]
async fn test_config_validates() {
    let config = test_config(&[("reminders", true)]);
    assert!(config.validate().is_ok());
    assert!(config.is_component_enabled("reminders"));
    assert!(!config.is_component_enabled("missing"));

    let bad = Config {
        week_start_day: 7,
        ..config
    };
    assert!(bad.validate().is_err());
}

/// Smoke test for the Redis store handle
#[tokio::test]
async fn test_redis_handle_creation() {
    // A handle without an actor fails requests but shuts down cleanly
    let store_handle = RedisStoreHandle::empty();
    assert!(store_handle.get(keys::TOKEN).await.is_err());
    assert!(store_handle.shutdown().await.is_ok());
}

/// Preferences survive a save and load through the store
#[tokio::test]
async fn test_preferences_through_store() {
    let store = InMemoryStore::new();

    let preferences = UserPreferences {
        study_hours_per_day: 2.5,
        preferred_study_time: StudyTime::Evening,
        subjects: vec!["Algebra".to_string()],
        ..UserPreferences::default()
    };
    preferences.save(&store).await.unwrap();

    let stored = store.get(keys::USER_PREFERENCES).await.unwrap().unwrap();
    assert!(stored.contains("\"preferredStudyTime\":\"evening\""));

    let loaded = UserPreferences::load(&store).await.unwrap();
    assert_eq!(loaded, preferences);
}

/// Test for component initialization order using real ComponentManager and mock components
#[tokio::test]
async fn test_component_initialization_order() {
    struct MockComponent {
        name: &'static str,
        order_recorder: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Component for MockComponent {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _config: Arc<RwLock<Config>>) -> PlannerResult<()> {
            self.order_recorder.lock().unwrap().push(self.name);
            Ok(())
        }

        async fn shutdown(&self) -> PlannerResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    let order_recorder = Arc::new(Mutex::new(Vec::new()));
    let config = Arc::new(RwLock::new(test_config(&[
        ("store", true),
        ("reminders", true),
        ("analytics", false),
    ])));

    let mut component_manager = ComponentManager::new(config);
    for name in ["store", "reminders", "analytics"] {
        component_manager.register(MockComponent {
            name,
            order_recorder: Arc::clone(&order_recorder),
        });
    }

    component_manager.init_all().await.unwrap();

    // Disabled components are skipped, the rest start in registration order
    let records = order_recorder.lock().unwrap().clone();
    assert_eq!(records, vec!["store", "reminders"]);

    assert!(component_manager.get_component_by_name("analytics").is_some());
    assert!(component_manager.get_component::<MockComponent>().is_some());
    assert!(component_manager.shutdown_all().await.is_ok());
}

/// The reminders component polls its source once started and stops cleanly
#[tokio::test]
async fn test_reminders_component_lifecycle() {
    struct StaticSource;

    #[async_trait]
    impl ReminderSource for StaticSource {
        async fn fetch_reminders(&self) -> PlannerResult<Vec<Reminder>> {
            Ok(vec![Reminder {
                id: "r1".to_string(),
                title: "Read chapter 3".to_string(),
                ..Reminder::default()
            }])
        }
    }

    let config = Arc::new(RwLock::new(test_config(&[("reminders", true)])));
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Reminders::new(Arc::new(StaticSource)));
    component_manager.init_all().await.unwrap();

    let reminders = component_manager.get_component::<Reminders>().unwrap();
    let poller = reminders.get_poller().await.unwrap();

    // The first tick fires immediately
    for _ in 0..50 {
        if poller.last_refreshed().await.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(poller.reminders().await.len(), 1);

    component_manager.shutdown_all().await.unwrap();
    assert!(reminders.get_poller().await.is_none());
}

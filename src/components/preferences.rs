use crate::components::store::{keys, LocalStore};
use crate::error::{validation_error, PlannerResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Part of the day the user prefers to study in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyTime {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// Preferences submitted from the preferences form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    pub study_hours_per_day: f64,
    pub preferred_study_time: StudyTime,
    /// Minutes per study session
    pub session_length: u32,
    /// Minutes between sessions
    pub break_duration: u32,
    /// First day of the week, 0 = Sunday
    pub week_start_day: u32,
    pub available_days: Vec<String>,
    pub subjects: Vec<String>,
    /// Fields set by newer clients, kept so a save does not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            study_hours_per_day: 4.0,
            preferred_study_time: StudyTime::Morning,
            session_length: 50,
            break_duration: 10,
            week_start_day: 1,
            available_days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
                .iter()
                .map(|day| day.to_string())
                .collect(),
            subjects: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl UserPreferences {
    /// Load preferences from the store.
    ///
    /// A missing key gives the defaults. So does stored JSON that no longer
    /// parses, which is logged and otherwise ignored.
    pub async fn load(store: &dyn LocalStore) -> PlannerResult<Self> {
        let Some(raw) = store.get(keys::USER_PREFERENCES).await? else {
            debug!("No stored preferences, using defaults");
            return Ok(Self::default());
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                warn!("Stored preferences are malformed, using defaults: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Validate and write the preferences to the store
    pub async fn save(&self, store: &dyn LocalStore) -> PlannerResult<()> {
        self.validate()?;
        let json = serde_json::to_string(self)?;
        store.set(keys::USER_PREFERENCES, &json).await
    }

    /// Check the form values, naming the first field that is out of range
    pub fn validate(&self) -> PlannerResult<()> {
        if !(self.study_hours_per_day > 0.0 && self.study_hours_per_day <= 24.0) {
            return Err(validation_error("studyHoursPerDay must be between 0 and 24"));
        }
        if self.session_length == 0 {
            return Err(validation_error("sessionLength must be at least 1 minute"));
        }
        if self.break_duration == 0 {
            return Err(validation_error("breakDuration must be at least 1 minute"));
        }
        if self.week_start_day > 6 {
            return Err(validation_error("weekStartDay must be between 0 and 6"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::store::InMemoryStore;
    use crate::error::Error;

    #[tokio::test]
    async fn test_missing_preferences_use_defaults() {
        let store = InMemoryStore::new();
        let preferences = UserPreferences::load(&store).await.unwrap();
        assert_eq!(preferences, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let store = InMemoryStore::new();
        let preferences = UserPreferences {
            study_hours_per_day: 6.5,
            preferred_study_time: StudyTime::Evening,
            subjects: vec!["Linear algebra".to_string()],
            ..UserPreferences::default()
        };
        preferences.save(&store).await.unwrap();

        let raw = store.get(keys::USER_PREFERENCES).await.unwrap().unwrap();
        assert!(raw.contains("\"preferredStudyTime\":\"evening\""));
        assert_eq!(UserPreferences::load(&store).await.unwrap(), preferences);
    }

    #[tokio::test]
    async fn test_malformed_preferences_use_defaults() {
        let store = InMemoryStore::with_entries([(keys::USER_PREFERENCES, "{not json")]);
        let preferences = UserPreferences::load(&store).await.unwrap();
        assert_eq!(preferences, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_partial_preferences_keep_unknown_fields() {
        let store = InMemoryStore::with_entries([(
            keys::USER_PREFERENCES,
            r#"{"studyHoursPerDay": 2, "theme": "dark"}"#,
        )]);
        let preferences = UserPreferences::load(&store).await.unwrap();
        assert_eq!(preferences.study_hours_per_day, 2.0);
        assert_eq!(preferences.session_length, 50);
        assert_eq!(preferences.extra["theme"], Value::from("dark"));
    }

    #[tokio::test]
    async fn test_invalid_preferences_are_not_saved() {
        let store = InMemoryStore::new();
        let preferences = UserPreferences {
            study_hours_per_day: 30.0,
            ..UserPreferences::default()
        };
        assert!(matches!(
            preferences.save(&store).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(store.get(keys::USER_PREFERENCES).await.unwrap(), None);

        let preferences = UserPreferences {
            week_start_day: 7,
            ..UserPreferences::default()
        };
        assert!(preferences.validate().is_err());
    }
}

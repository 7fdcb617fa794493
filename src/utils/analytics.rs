use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Name used by the simple mapping when a user has none
pub const UNKNOWN_USER_NAME: &str = "Unknown User";
/// Name used by the server-response mapping when a user has none
pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_ID: &str = "unknown";
pub const NO_EMAIL: &str = "No Email";
pub const DEFAULT_ROLE: &str = "user";

/// Per-user activity in the admin analytics view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Passed through exactly as the server sent it
    pub last_login: Option<Value>,
    pub total_sessions: u64,
    pub average_session_duration: f64,
}

/// Fully populated analytics for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    pub total_users: u64,
    pub active_today: u64,
    pub average_session_duration: f64,
    pub user_activity: Vec<UserRecord>,
}

/// A user entry as it may arrive from the API. Every field is optional and
/// untyped; [`RawUserRecord::from_value`] never fails.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawUserRecord {
    #[serde(rename = "_id")]
    pub object_id: Option<Value>,
    pub id: Option<Value>,
    #[serde(rename = "userId")]
    pub user_id: Option<Value>,
    pub name: Option<Value>,
    #[serde(rename = "displayName")]
    pub display_name: Option<Value>,
    pub username: Option<Value>,
    pub email: Option<Value>,
    pub role: Option<Value>,
    #[serde(rename = "lastLogin")]
    pub last_login: Option<Value>,
    #[serde(rename = "sessionDurations")]
    pub session_durations: Option<Value>,
    #[serde(rename = "loginHistory")]
    pub login_history: Option<Value>,
    #[serde(rename = "totalSessions")]
    pub total_sessions: Option<Value>,
    #[serde(rename = "averageSessionDuration")]
    pub average_session_duration: Option<Value>,
}

/// Aggregate counters as they may arrive from the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAnalyticsResponse {
    #[serde(rename = "totalUsers")]
    pub total_users: Option<Value>,
    #[serde(rename = "userCount")]
    pub user_count: Option<Value>,
    #[serde(rename = "activeToday")]
    pub active_today: Option<Value>,
    #[serde(rename = "averageSessionDuration")]
    pub average_session_duration: Option<Value>,
    #[serde(rename = "userData")]
    pub user_data: Option<Value>,
    pub users: Option<Value>,
}

impl RawUserRecord {
    /// Read a raw entry; anything that is not an object reads as empty
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        Self::deserialize(value).unwrap_or_default()
    }

    fn id_or_unknown(&self) -> String {
        first_truthy([&self.object_id, &self.id, &self.user_id])
            .map(coerce_string)
            .unwrap_or_else(|| UNKNOWN_ID.to_string())
    }

    fn email_or_default(&self) -> String {
        string_or(&self.email, NO_EMAIL)
    }

    fn role_or_default(&self) -> String {
        string_or(&self.role, DEFAULT_ROLE)
    }
}

impl RawAnalyticsResponse {
    /// Read a raw response; anything that is not an object reads as empty
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        Self::deserialize(value).unwrap_or_default()
    }
}

/// JavaScript truthiness, which the API's loosely typed payloads rely on
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn first_truthy<'a, const N: usize>(candidates: [&'a Option<Value>; N]) -> Option<&'a Value> {
    candidates
        .into_iter()
        .filter_map(Option::as_ref)
        .find(|value| is_truthy(value))
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn string_or(value: &Option<Value>, default: &str) -> String {
    first_truthy([value])
        .map(coerce_string)
        .unwrap_or_else(|| default.to_string())
}

/// A finite number, or nothing
fn number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|f| f.is_finite())
}

/// A non-negative float, with anything else reading as 0
fn non_negative(value: Option<&Value>) -> f64 {
    number(value).map_or(0.0, |f| f.max(0.0))
}

/// A non-negative whole count, with anything else reading as 0
fn count(value: Option<&Value>) -> u64 {
    number(value).map_or(0, |f| f.max(0.0).floor() as u64)
}

/// Map raw user entries with fixed defaults for missing fields
pub fn process_user_data(raw_users: &Value) -> Vec<UserRecord> {
    let Some(entries) = raw_users.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .map(RawUserRecord::from_value)
        .map(|raw| UserRecord {
            id: raw.id_or_unknown(),
            name: string_or(&raw.name, UNKNOWN_USER_NAME),
            email: raw.email_or_default(),
            role: raw.role_or_default(),
            last_login: raw.last_login.clone(),
            total_sessions: count(raw.total_sessions.as_ref()),
            average_session_duration: non_negative(raw.average_session_duration.as_ref()),
        })
        .collect()
}

/// Combine processed users with aggregate counters.
///
/// `totalUsers` falls back to the number of users when the aggregate does
/// not carry a number for it.
pub fn extract_analytics(user_records: Vec<UserRecord>, raw_aggregate: &Value) -> AnalyticsRecord {
    let aggregate = RawAnalyticsResponse::from_value(raw_aggregate);

    let total_users = match number(aggregate.total_users.as_ref()) {
        Some(_) => count(aggregate.total_users.as_ref()),
        None => user_records.len() as u64,
    };

    AnalyticsRecord {
        total_users,
        active_today: count(aggregate.active_today.as_ref()),
        average_session_duration: non_negative(aggregate.average_session_duration.as_ref()),
        user_activity: user_records,
    }
}

/// Session count and locally derived average for one raw user.
///
/// Non-empty `sessionDurations` wins over `loginHistory`, which only yields
/// a count.
fn session_stats(raw: &RawUserRecord) -> (u64, f64) {
    let durations = raw
        .session_durations
        .as_ref()
        .and_then(Value::as_array)
        .filter(|sessions| !sessions.is_empty());

    if let Some(sessions) = durations {
        let total: f64 = sessions
            .iter()
            .map(|session| number(session.get("duration")).unwrap_or(0.0))
            .sum();
        return (sessions.len() as u64, total / sessions.len() as f64);
    }

    match raw.login_history.as_ref().and_then(Value::as_array) {
        Some(history) => (history.len() as u64, 0.0),
        None => (0, 0.0),
    }
}

fn server_user_record(raw: RawUserRecord) -> UserRecord {
    let (total_sessions, derived_average) = session_stats(&raw);

    // A precomputed average from the server beats the local one
    let average_session_duration = match number(raw.average_session_duration.as_ref()) {
        Some(_) => non_negative(raw.average_session_duration.as_ref()),
        None => derived_average.max(0.0),
    };

    UserRecord {
        id: raw.id_or_unknown(),
        name: first_truthy([&raw.name, &raw.display_name, &raw.username])
            .map(coerce_string)
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        email: raw.email_or_default(),
        role: raw.role_or_default(),
        last_login: raw.last_login,
        total_sessions,
        average_session_duration,
    }
}

/// Normalize an analytics response whose shape is unknown or inconsistent.
///
/// Users are read from `userData`, else `users`; the first one present is
/// used on its own. Never fails: anything unreadable becomes a zero or an
/// empty list.
pub fn direct_server_response_handler(raw_response: &Value) -> AnalyticsRecord {
    let response = RawAnalyticsResponse::from_value(raw_response);

    let mut record = AnalyticsRecord {
        total_users: count(response.user_count.as_ref()),
        active_today: count(response.active_today.as_ref()),
        average_session_duration: non_negative(response.average_session_duration.as_ref()),
        ..AnalyticsRecord::default()
    };

    let users = first_truthy([&response.user_data, &response.users]);
    if let Some(entries) = users.and_then(Value::as_array) {
        record.user_activity = entries
            .iter()
            .map(RawUserRecord::from_value)
            .map(server_user_record)
            .collect();
    }

    debug!(
        "Normalized analytics: {} users, {} active today, {} user records",
        record.total_users,
        record.active_today,
        record.user_activity.len()
    );

    record
}

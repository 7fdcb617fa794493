use super::time::{format_time_range, DEFAULT_TIME_RANGE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A generated study schedule, week by week
pub type WeeklySchedule = Vec<Week>;

/// One week of a generated schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Week {
    #[serde(default)]
    pub days: Vec<Day>,
    /// Fields the planner does not interpret, kept as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One day inside a week
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Day {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single study task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Canonical `HH:MM-HH:MM` once repaired
    #[serde(default)]
    pub time: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn sequence(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn fields(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Repair every task time in a raw schedule.
///
/// A level that is not an array becomes an empty list without affecting its
/// siblings. Task times are normalized with [`format_time_range`]; a missing
/// or empty time becomes the default range. Other fields are copied as is.
pub fn fix_schedule_time_formats(schedule: &Value) -> WeeklySchedule {
    sequence(Some(schedule)).iter().map(repair_week).collect()
}

fn repair_week(raw: &Value) -> Week {
    let mut extra = fields(raw);
    let days = extra.remove("days");
    Week {
        days: sequence(days.as_ref()).iter().map(repair_day).collect(),
        extra,
    }
}

fn repair_day(raw: &Value) -> Day {
    let mut extra = fields(raw);
    let tasks = extra.remove("tasks");
    Day {
        tasks: sequence(tasks.as_ref()).iter().map(repair_task).collect(),
        extra,
    }
}

fn repair_task(raw: &Value) -> Task {
    let mut extra = fields(raw);
    let time = match extra.remove("time") {
        Some(Value::String(time)) if !time.is_empty() => format_time_range(&time),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => format_time_range(&n.to_string()),
        _ => DEFAULT_TIME_RANGE.to_string(),
    };
    Task { time, extra }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_array_days_become_empty() {
        let fixed = fix_schedule_time_formats(&json!([{ "days": "not-an-array" }]));
        assert_eq!(serde_json::to_value(&fixed).unwrap(), json!([{ "days": [] }]));
    }

    #[test]
    fn test_non_array_schedule_is_empty() {
        assert!(fix_schedule_time_formats(&json!({ "weeks": [] })).is_empty());
        assert!(fix_schedule_time_formats(&Value::Null).is_empty());
        assert!(fix_schedule_time_formats(&json!("schedule")).is_empty());
    }

    #[test]
    fn test_malformed_week_does_not_affect_others() {
        let raw = json!([
            { "week": 1, "days": 42 },
            { "week": 2, "days": [{ "day": "Monday", "tasks": [{ "time": "9-11", "title": "Maths" }] }] },
        ]);
        let fixed = fix_schedule_time_formats(&raw);

        assert_eq!(fixed.len(), 2);
        assert!(fixed[0].days.is_empty());
        assert_eq!(fixed[0].extra["week"], json!(1));
        assert_eq!(fixed[1].days[0].tasks[0].time, "09:00-11:00");
        assert_eq!(fixed[1].days[0].tasks[0].extra["title"], json!("Maths"));
        assert_eq!(fixed[1].days[0].extra["day"], json!("Monday"));
    }

    #[test]
    fn test_task_times_are_repaired() {
        let raw = json!([{
            "days": [{
                "date": "2024-01-08",
                "tasks": [
                    { "time": "14:00 - 15:30" },
                    { "time": "" },
                    { "title": "no time" },
                    { "time": null },
                    { "time": 13 },
                    { "time": "after lunch" },
                ],
            }, {
                "tasks": { "not": "a list" },
            }],
        }]);
        let fixed = fix_schedule_time_formats(&raw);
        let day = &fixed[0].days[0];
        let times: Vec<&str> = day.tasks.iter().map(|t| t.time.as_str()).collect();

        assert_eq!(
            times,
            vec![
                "14:00-15:30",
                "09:00-10:00",
                "09:00-10:00",
                "09:00-10:00",
                "13:00-14:00",
                "00:00-01:00",
            ]
        );
        assert_eq!(day.extra["date"], json!("2024-01-08"));
        assert!(fixed[0].days[1].tasks.is_empty());
    }

    #[test]
    fn test_non_object_entries_become_empty_objects() {
        let fixed = fix_schedule_time_formats(&json!([7, { "days": [null, { "tasks": ["x"] }] }]));
        assert_eq!(
            serde_json::to_value(&fixed).unwrap(),
            json!([
                { "days": [] },
                { "days": [{ "tasks": [] }, { "tasks": [{ "time": "09:00-10:00" }] }] },
            ])
        );
    }
}

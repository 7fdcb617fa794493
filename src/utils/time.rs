use crate::error::{parse_error, PlannerResult};
use chrono::{DateTime, Datelike, Duration, Local, LocalResult, NaiveDate, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use tracing::warn;

/// Time substituted when a time string cannot be parsed
pub const DEFAULT_TIME: &str = "00:00";

/// Range substituted when no time range is given at all
pub const DEFAULT_TIME_RANGE: &str = "09:00-10:00";

/// Date format used for every date string the planner exchanges
pub const DATE_FORMAT: &str = "%Y-%m-%d";

lazy_static! {
    static ref HOUR_MINUTE: Regex =
        Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("hour:minute pattern is valid");
    static ref BARE_HOUR: Regex = Regex::new(r"^([0-9]{1,2})$").expect("hour pattern is valid");
}

/// Result of parsing a loosely formatted time string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    /// The input had a recognised shape. Values are not range checked.
    Parsed { hour: u32, minute: u32 },
    /// The input was empty or unrecognised; renders as `00:00`
    Fallback,
}

impl ParsedTime {
    /// Hour and minute, with the fallback reading as midnight
    pub fn hour_minute(self) -> (u32, u32) {
        match self {
            ParsedTime::Parsed { hour, minute } => (hour, minute),
            ParsedTime::Fallback => (0, 0),
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, ParsedTime::Fallback)
    }
}

impl fmt::Display for ParsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, minute) = self.hour_minute();
        write!(f, "{:02}:{:02}", hour, minute)
    }
}

/// A scheduled start and end on a concrete local date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

fn match_hour_minute(input: &str) -> Option<(u32, u32)> {
    if let Some(caps) = HOUR_MINUTE.captures(input) {
        return Some((caps[1].parse().ok()?, caps[2].parse().ok()?));
    }
    let caps = BARE_HOUR.captures(input)?;
    Some((caps[1].parse().ok()?, 0))
}

/// Parse `H:MM`, `HH:MM`, `H` or `HH` into a tagged result.
///
/// Minutes must be exactly two digits, so `"9:5"` is a fallback. Hours and
/// minutes are not range checked: `"25:99"` parses as hour 25, minute 99.
pub fn parse_time(input: &str) -> ParsedTime {
    match match_hour_minute(input) {
        Some((hour, minute)) => ParsedTime::Parsed { hour, minute },
        None => ParsedTime::Fallback,
    }
}

/// Normalize a time string to zero-padded `HH:MM`, falling back to `00:00`
pub fn parse_time_string(input: &str) -> String {
    parse_time(input).to_string()
}

/// Normalize a time range string to `HH:MM-HH:MM`.
///
/// All whitespace is removed first. Without a `-` the input is a start time
/// and the end is one hour later, capped at hour 23 with the minutes kept.
/// With a `-` the input is split on the first one and each half is parsed on
/// its own. The end is never checked against the start.
pub fn format_time_range(input: &str) -> String {
    if input.is_empty() {
        return DEFAULT_TIME_RANGE.to_string();
    }

    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();

    match compact.split_once('-') {
        Some((start, end)) => format!("{}-{}", parse_time_string(start), parse_time_string(end)),
        None => {
            let (hour, minute) = parse_time(&compact).hour_minute();
            let end_hour = (hour + 1).min(23);
            format!("{:02}:{:02}-{:02}:{:02}", hour, minute, end_hour, minute)
        }
    }
}

/// Combine a `YYYY-MM-DD` date with an `HH:MM` time in local wall-clock time.
///
/// Hours and minutes are applied as offsets from local midnight, so values
/// past 23 hours or 59 minutes roll over into the following hour or day.
pub fn create_date_with_time(date_str: &str, time_str: &str) -> PlannerResult<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
        .map_err(|e| parse_error(&format!("Invalid date {}: {}", date_str, e)))?;

    let (hour, minute) = time_str
        .split_once(':')
        .and_then(|(h, m)| Some((h.trim().parse::<i64>().ok()?, m.trim().parse::<i64>().ok()?)))
        .ok_or_else(|| parse_error(&format!("Invalid time {}", time_str)))?;

    let naive = date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.checked_add_signed(Duration::hours(hour)))
        .and_then(|dt| dt.checked_add_signed(Duration::minutes(minute)))
        .ok_or_else(|| parse_error(&format!("Time {} out of range on {}", time_str, date_str)))?;

    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(parse_error(&format!(
            "{} {} does not exist in the local timezone",
            date_str, time_str
        ))),
    }
}

/// Resolve a loosely formatted time range on a date into concrete instants.
///
/// Returns `None` when the date or either time cannot be resolved; callers
/// skip such items instead of failing.
pub fn parse_time_range_with_date(date_str: &str, time_range: &str) -> Option<TimeSlot> {
    let canonical = format_time_range(time_range);
    let (start, end) = canonical.split_once('-')?;

    let slot = create_date_with_time(date_str, start).and_then(|start_dt| {
        Ok(TimeSlot {
            start: start_dt,
            end: create_date_with_time(date_str, end)?,
        })
    });

    match slot {
        Ok(slot) => Some(slot),
        Err(e) => {
            warn!(
                "Could not resolve time range '{}' on '{}': {}",
                time_range, date_str, e
            );
            None
        }
    }
}

/// The 7 dates (`YYYY-MM-DD`) of the week containing `base_date`.
///
/// `start_day_of_week` counts from Sunday = 0. A Sunday base date is always
/// treated as the last day of the week, 6 days after the start.
pub fn generate_week_dates(base_date: NaiveDate, start_day_of_week: u32) -> Vec<String> {
    let start = start_day_of_week % 7;
    let day = base_date.weekday().num_days_from_sunday();
    let offset = if day == 0 { 6 } else { (day + 7 - start) % 7 };

    let anchor = base_date
        .checked_sub_signed(Duration::days(offset as i64))
        .unwrap_or(base_date);

    anchor
        .iter_days()
        .take(7)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .collect()
}

/// Week dates for the local date of `now`
pub fn current_week_dates(now: &DateTime<Local>, start_day_of_week: u32) -> Vec<String> {
    generate_week_dates(now.date_naive(), start_day_of_week)
}

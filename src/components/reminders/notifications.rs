use crate::components::api::Reminder;
use crate::utils::time::TimeSlot;
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use tracing::info;

/// Open reminders starting within `window` of `now`, earliest first.
///
/// Completed reminders and reminders that cannot be scheduled are left out.
pub fn due_within(
    reminders: &[Reminder],
    now: DateTime<Local>,
    window: Duration,
) -> Vec<(Reminder, TimeSlot)> {
    let until = now + window;

    let mut due: Vec<(Reminder, TimeSlot)> = reminders
        .iter()
        .filter(|reminder| !reminder.completed)
        .filter_map(|reminder| Some((reminder.clone(), reminder.time_slot()?)))
        .filter(|(_, slot)| slot.start >= now && slot.start <= until)
        .collect();

    due.sort_by_key(|(_, slot)| slot.start);
    due
}

/// Format a reminder as a single log line
pub fn format_reminder(reminder: &Reminder, slot: &TimeSlot) -> String {
    let title = if reminder.title.is_empty() {
        "Untitled reminder"
    } else {
        reminder.title.as_str()
    };
    format!(
        "{} {}-{}: {}",
        slot.start.format("%Y-%m-%d"),
        slot.start.format("%H:%M"),
        slot.end.format("%H:%M"),
        title
    )
}

/// Log reminders coming up soon, each one once
#[derive(Debug, Default)]
pub struct UpcomingAnnouncer {
    /// Announced `id@start` keys with their start
    announced: HashMap<String, DateTime<Local>>,
}

impl UpcomingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Announce reminders due within `window` that were not announced
    /// before; returns how many were announced
    pub fn announce(&mut self, reminders: &[Reminder], now: DateTime<Local>, window: Duration) -> usize {
        // Started reminders can never be due again
        self.announced.retain(|_, start| *start >= now);

        let mut count = 0;
        for (reminder, slot) in due_within(reminders, now, window) {
            let key = format!("{}@{}", reminder.id, slot.start.to_rfc3339());
            if self.announced.insert(key, slot.start).is_none() {
                info!("Upcoming: {}", format_reminder(&reminder, &slot));
                count += 1;
            }
        }
        count
    }

    /// How many announcements are remembered
    pub fn remembered(&self) -> usize {
        self.announced.len()
    }
}

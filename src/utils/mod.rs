pub mod analytics;
pub mod schedule;
pub mod time;

mod client;
pub mod models;

pub use client::ApiClient;
pub use models::{GeneratedSchedule, PdfFile, Reminder, ReminderDraft};

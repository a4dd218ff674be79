use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Title used when the calendar omits one
pub const UNTITLED: &str = "No Title";

/// When an event starts. All-day events only carry a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStart {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

/// A single reminder override attached to an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: Option<String>,
    pub minutes: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub use_default: bool,
    #[serde(default)]
    pub overrides: Vec<ReminderOverride>,
}

impl ReminderSettings {
    /// Reminder that fires with the calendar's default settings
    pub fn default_enabled() -> Self {
        Self {
            use_default: true,
            overrides: Vec::new(),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Event record as returned by a calendar query. Nothing is kept between polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Option<String>,
    pub title: String,
    pub start: Option<EventStart>,
    pub reminders: ReminderSettings,
    pub status: Option<String>,
}

impl CalendarEvent {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, reminders: ReminderSettings) -> Self {
        Self {
            id: None,
            title: title.into(),
            start: Some(EventStart::At(start)),
            reminders,
            status: None,
        }
    }

    pub fn all_day(title: impl Into<String>, date: NaiveDate, reminders: ReminderSettings) -> Self {
        Self {
            id: None,
            title: title.into(),
            start: Some(EventStart::AllDay(date)),
            reminders,
            status: None,
        }
    }

    /// Exact start instant, or `None` for all-day and undated events
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self.start {
            Some(EventStart::At(at)) => Some(at),
            Some(EventStart::AllDay(_)) | None => None,
        }
    }

    /// True when the default reminder is on or at least one override exists
    pub fn has_reminder(&self) -> bool {
        self.reminders.use_default || !self.reminders.overrides.is_empty()
    }
}

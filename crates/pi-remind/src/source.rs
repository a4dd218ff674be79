//! Seams between the polling loop and the outside world.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use remind_core::CalendarEvent;

use crate::error::QueryError;

/// One calendar query: every event instance starting inside the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub calendar_id: String,
    pub time_min: DateTime<Utc>,
    pub time_max: DateTime<Utc>,
    /// Expand recurring events into individual instances
    pub single_events: bool,
    /// Ascending by start time
    pub order_by_start: bool,
}

impl EventQuery {
    /// Window from `now` to `now + lookahead`.
    pub fn upcoming(
        calendar_id: impl Into<String>,
        now: DateTime<Utc>,
        lookahead: chrono::Duration,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_min: now,
            time_max: now + lookahead,
            single_events: true,
            order_by_start: true,
        }
    }
}

/// Something that can list calendar events.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<CalendarEvent>, QueryError>;
}

/// Wall clock, injectable so tests can step through minutes.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

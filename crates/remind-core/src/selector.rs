//! Picks the event worth warning about out of a freshly queried list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;

/// Whether an event must have a reminder configured to be considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderPolicy {
    /// Only events with a default or override reminder qualify
    #[default]
    Required,
    /// Any timed future event qualifies
    Ignored,
}

impl ReminderPolicy {
    pub fn accepts(&self, event: &CalendarEvent) -> bool {
        match self {
            ReminderPolicy::Required => event.has_reminder(),
            ReminderPolicy::Ignored => true,
        }
    }
}

/// Return the first event that starts strictly after `now` and passes `policy`.
///
/// The list is expected in ascending start order (the query asks for it), so
/// the first match is the soonest. Events without a start time (all-day) and
/// events already under way are skipped.
pub fn select_next_event<'a>(
    events: &'a [CalendarEvent],
    now: DateTime<Utc>,
    policy: ReminderPolicy,
) -> Option<&'a CalendarEvent> {
    events.iter().find(|event| {
        let Some(start) = event.start_time() else {
            tracing::trace!("Skipping '{}' (no start time)", event.title);
            return false;
        };
        if start <= now {
            tracing::trace!("Skipping '{}' (already started)", event.title);
            return false;
        }
        if !policy.accepts(event) {
            tracing::trace!("Skipping '{}' (no reminder set)", event.title);
            return false;
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ReminderSettings;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn event(title: &str, offset_secs: i64, reminder: bool) -> CalendarEvent {
        let reminders = if reminder {
            ReminderSettings::default_enabled()
        } else {
            ReminderSettings::none()
        };
        CalendarEvent::new(title, now() + Duration::seconds(offset_secs), reminders)
    }

    #[test]
    fn test_empty_list_selects_nothing() {
        assert!(select_next_event(&[], now(), ReminderPolicy::Required).is_none());
    }

    #[test]
    fn test_past_and_current_events_are_skipped() {
        let events = vec![
            event("Earlier", -600, true),
            event("Started just now", 0, true),
            event("Yesterday", -86_400, true),
        ];
        assert!(select_next_event(&events, now(), ReminderPolicy::Required).is_none());
        assert!(select_next_event(&events, now(), ReminderPolicy::Ignored).is_none());
    }

    #[test]
    fn test_earliest_qualifying_event_wins() {
        let events = vec![
            event("No reminder", 60, false),
            event("With reminder", 180, true),
            event("Later with reminder", 420, true),
        ];
        let selected = select_next_event(&events, now(), ReminderPolicy::Required).unwrap();
        assert_eq!(selected.title, "With reminder");
    }

    #[test]
    fn test_ignored_policy_takes_first_future_event() {
        let events = vec![
            event("No reminder", 60, false),
            event("With reminder", 180, true),
        ];
        let selected = select_next_event(&events, now(), ReminderPolicy::Ignored).unwrap();
        assert_eq!(selected.title, "No reminder");
    }

    #[test]
    fn test_all_day_events_are_skipped() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let events = vec![
            CalendarEvent::all_day("Offsite", date, ReminderSettings::default_enabled()),
            event("1:1", 180, true),
        ];
        let selected = select_next_event(&events, now(), ReminderPolicy::Required).unwrap();
        assert_eq!(selected.title, "1:1");
    }

    #[test]
    fn test_undated_events_are_skipped() {
        let mut undated = event("Broken", 60, true);
        undated.start = None;
        let events = vec![undated];
        assert!(select_next_event(&events, now(), ReminderPolicy::Ignored).is_none());
    }

    #[test]
    fn test_selection_is_idempotent() {
        let events = vec![event("Past", -60, true), event("Standup", 420, true)];
        let first = select_next_event(&events, now(), ReminderPolicy::Required);
        let second = select_next_event(&events, now(), ReminderPolicy::Required);
        assert_eq!(first, second);
        assert_eq!(first.map(|e| e.title.as_str()), Some("Standup"));
    }

    #[test]
    fn test_policy_serde() {
        let policy: ReminderPolicy = serde_json::from_str(r#""ignored""#).unwrap();
        assert_eq!(policy, ReminderPolicy::Ignored);
        assert_eq!(
            serde_json::to_string(&ReminderPolicy::Required).unwrap(),
            r#""required""#
        );
    }
}

//! Calendar reminder logic shared by the `pi-remind` service.
//!
//! Everything here is pure: callers pass in the freshly queried events and the
//! current instant, and get back the event to warn about, its urgency band and
//! the visual treatment to play.

pub mod alert;
pub mod event;
pub mod selector;
pub mod urgency;

pub use alert::{Alert, Pattern};
pub use event::{CalendarEvent, EventStart, ReminderOverride, ReminderSettings};
pub use selector::{select_next_event, ReminderPolicy};
pub use urgency::{classify, minutes_until, Thresholds, Urgency};
pub use smart_leds::RGB8;
